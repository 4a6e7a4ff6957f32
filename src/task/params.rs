// src/task/params.rs

//! Typed, defaulted task parameters and canonical task identity.
//!
//! Every task family declares an ordered schema of [`ParamSpec`]s. A
//! [`TaskId`] is resolved from that schema plus a set of [`Overrides`]:
//! missing values fall back to the schema default, values of the wrong
//! kind are rejected at construction time. The resulting identity stores
//! parameters sorted by name, so it does not depend on override order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl ParamValue {
    fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Str(_) => "string",
            ParamValue::Int(_) => "integer",
            ParamValue::Bool(_) => "boolean",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Declared kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
    Bool,
    /// A string restricted to a fixed set of values.
    Choice(&'static [&'static str]),
}

impl ParamKind {
    fn name(&self) -> &'static str {
        match self {
            ParamKind::Str | ParamKind::Choice(_) => "string",
            ParamKind::Int => "integer",
            ParamKind::Bool => "boolean",
        }
    }

    /// Parse a raw string (schema default or command-line value).
    pub fn parse(&self, raw: &str) -> Option<ParamValue> {
        match self {
            ParamKind::Str => Some(ParamValue::Str(raw.to_string())),
            ParamKind::Choice(allowed) => allowed
                .contains(&raw)
                .then(|| ParamValue::Str(raw.to_string())),
            ParamKind::Int => raw.trim().parse().ok().map(ParamValue::Int),
            ParamKind::Bool => raw.trim().parse().ok().map(ParamValue::Bool),
        }
    }
}

/// One entry of a task family's parameter schema.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Default in its textual form; parsed with [`ParamKind::parse`].
    pub default: &'static str,
}

impl ParamSpec {
    pub const fn new(name: &'static str, kind: ParamKind, default: &'static str) -> Self {
        Self { name, kind, default }
    }

    fn check(&self, family: &'static str, value: ParamValue) -> Result<ParamValue, ParamError> {
        let kind_matches = matches!(
            (self.kind, &value),
            (ParamKind::Str, ParamValue::Str(_))
                | (ParamKind::Choice(_), ParamValue::Str(_))
                | (ParamKind::Int, ParamValue::Int(_))
                | (ParamKind::Bool, ParamValue::Bool(_))
        );
        if !kind_matches {
            return Err(ParamError::TypeMismatch {
                family,
                name: self.name,
                expected: self.kind.name(),
                got: value.kind_name(),
            });
        }

        if let (ParamKind::Choice(allowed), ParamValue::Str(s)) = (self.kind, &value) {
            if !allowed.contains(&s.as_str()) {
                return Err(ParamError::InvalidChoice {
                    family,
                    name: self.name,
                    allowed,
                    got: s.clone(),
                });
            }
        }

        Ok(value)
    }

    fn default_value(&self, family: &'static str) -> Result<ParamValue, ParamError> {
        self.kind
            .parse(self.default)
            .ok_or_else(|| ParamError::BadDefault {
                family,
                name: self.name,
                raw: self.default,
            })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("{family} has no parameter '{name}'")]
    Unknown { family: &'static str, name: String },

    #[error("{family}.{name} expects a {expected} value, got a {got}")]
    TypeMismatch {
        family: &'static str,
        name: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("{family}.{name} must be one of {allowed:?}, got '{got}'")]
    InvalidChoice {
        family: &'static str,
        name: &'static str,
        allowed: &'static [&'static str],
        got: String,
    },

    #[error("default of {family}.{name} does not parse: '{raw}'")]
    BadDefault {
        family: &'static str,
        name: &'static str,
        raw: &'static str,
    },

    #[error("{family} identity carries no parameter '{name}'")]
    Missing { family: &'static str, name: String },
}

/// Caller-supplied parameter values; anything absent resolves to its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    values: BTreeMap<String, ParamValue>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Canonical identity of a task: family tag plus parameters sorted by name.
///
/// Two tasks with equal ids are interchangeable; the id is the memoization
/// and deduplication key of the graph and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    family: &'static str,
    params: Vec<(&'static str, ParamValue)>,
}

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("static pattern compiles"));

impl TaskId {
    /// Resolve `overrides` against `schema`.
    pub fn resolve(
        family: &'static str,
        schema: &[ParamSpec],
        overrides: &Overrides,
    ) -> Result<Self, ParamError> {
        if let Some(unknown) = overrides
            .values
            .keys()
            .find(|name| !schema.iter().any(|spec| spec.name == name.as_str()))
        {
            return Err(ParamError::Unknown {
                family,
                name: unknown.clone(),
            });
        }

        let mut params = Vec::with_capacity(schema.len());
        for spec in schema {
            let value = match overrides.values.get(spec.name) {
                Some(v) => spec.check(family, v.clone())?,
                None => spec.default_value(family)?,
            };
            params.push((spec.name, value));
        }
        params.sort_by(|a, b| a.0.cmp(b.0));

        Ok(Self { family, params })
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Parameters in canonical (name-sorted) order.
    pub fn params(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.params.iter().map(|(name, value)| (*name, value))
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    /// String parameter accessor for task constructors.
    pub fn str_param(&self, name: &str) -> Result<&str, ParamError> {
        match self.get(name) {
            Some(ParamValue::Str(s)) => Ok(s.as_str()),
            _ => Err(ParamError::Missing {
                family: self.family,
                name: name.to_string(),
            }),
        }
    }

    /// Compact, filesystem-safe signature:
    /// `<Family>_<v1>_<v2>_<v3>_<hash10>`.
    pub fn signature(&self) -> String {
        let canonical: BTreeMap<&str, &ParamValue> =
            self.params.iter().map(|(n, v)| (*n, v)).collect();
        // Serialising a map of plain strings/ints/bools cannot fail.
        let json = serde_json::to_string(&canonical).unwrap_or_default();
        let digest = blake3::hash(json.as_bytes()).to_hex();

        let mut parts = vec![self.family.to_string()];
        for (_, value) in self.params.iter().take(3) {
            let text: String = value.to_string().chars().take(16).collect();
            parts.push(NON_WORD.replace_all(&text, "_").into_owned());
        }
        parts.push(digest[..10].to_string());
        parts.join("_")
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.family)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &[ParamSpec] = &[
        ParamSpec::new("data", ParamKind::Str, "heart.csv"),
        ParamSpec::new("train_or_test", ParamKind::Choice(&["train", "test"]), "train"),
        ParamSpec::new("seed", ParamKind::Int, "42"),
    ];

    #[test]
    fn defaults_fill_missing_values() {
        let id = TaskId::resolve("Split", SCHEMA, &Overrides::new()).unwrap();
        assert_eq!(id.str_param("data").unwrap(), "heart.csv");
        assert_eq!(id.get("seed"), Some(&ParamValue::Int(42)));
        assert_eq!(id.param_count(), 3);
    }

    #[test]
    fn explicit_default_equals_implicit_default() {
        let implicit = TaskId::resolve("Split", SCHEMA, &Overrides::new()).unwrap();
        let explicit = TaskId::resolve(
            "Split",
            SCHEMA,
            &Overrides::new().with("train_or_test", "train").with("seed", 42i64),
        )
        .unwrap();
        assert_eq!(implicit, explicit);
        assert_eq!(implicit.signature(), explicit.signature());
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let err = TaskId::resolve("Split", SCHEMA, &Overrides::new().with("seed", "forty-two"))
            .unwrap_err();
        assert!(matches!(err, ParamError::TypeMismatch { name: "seed", .. }));
    }

    #[test]
    fn choice_outside_domain_is_rejected() {
        let err = TaskId::resolve(
            "Split",
            SCHEMA,
            &Overrides::new().with("train_or_test", "validation"),
        )
        .unwrap_err();
        assert!(matches!(err, ParamError::InvalidChoice { .. }));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = TaskId::resolve("Split", SCHEMA, &Overrides::new().with("colour", "red"))
            .unwrap_err();
        assert!(matches!(err, ParamError::Unknown { .. }));
    }

    #[test]
    fn display_lists_sorted_params() {
        let id = TaskId::resolve("Split", SCHEMA, &Overrides::new()).unwrap();
        assert_eq!(
            id.to_string(),
            "Split(data=heart.csv, seed=42, train_or_test=train)"
        );
    }

    #[test]
    fn signature_sanitises_values() {
        let id = TaskId::resolve("Split", SCHEMA, &Overrides::new()).unwrap();
        let sig = id.signature();
        assert!(sig.starts_with("Split_heart_csv_42_train_"));
        assert_eq!(sig.len(), "Split_heart_csv_42_train_".len() + 10);
    }
}
