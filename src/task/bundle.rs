// src/task/bundle.rs

//! Zero, one, or a named mapping of values.
//!
//! Used for a task's prerequisites (`Bundle<TaskRef>`), its outputs
//! (`Bundle<TargetRef>`), and the resolved inputs handed to `run`.

use std::collections::BTreeMap;

use crate::errors::{PipelineError, Result};

#[derive(Debug, Clone)]
pub enum Bundle<T> {
    Empty,
    Single(T),
    Named(BTreeMap<String, T>),
}

impl<T> Default for Bundle<T> {
    fn default() -> Self {
        Bundle::Empty
    }
}

impl<T> Bundle<T> {
    pub fn named<I, K>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Bundle::Named(items.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// All contained values; named entries in key order.
    pub fn values(&self) -> Vec<&T> {
        match self {
            Bundle::Empty => Vec::new(),
            Bundle::Single(v) => vec![v],
            Bundle::Named(map) => map.values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Bundle::Empty => 0,
            Bundle::Single(_) => 1,
            Bundle::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        match self {
            Bundle::Named(map) => map.get(key),
            _ => None,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Bundle<U> {
        match self {
            Bundle::Empty => Bundle::Empty,
            Bundle::Single(v) => Bundle::Single(f(v)),
            Bundle::Named(map) => {
                Bundle::Named(map.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            }
        }
    }

    /// The single value, or a configuration error naming `what`.
    pub fn expect_single(&self, what: &str) -> Result<&T> {
        match self {
            Bundle::Single(v) => Ok(v),
            other => Err(PipelineError::ConfigError(format!(
                "{what}: expected exactly one unnamed entry, found {} entries",
                other.len()
            ))),
        }
    }

    /// The entry named `key`, or a configuration error naming `what`.
    pub fn expect_named(&self, key: &str, what: &str) -> Result<&T> {
        self.get(key).ok_or_else(|| {
            PipelineError::ConfigError(format!("{what}: no entry named '{key}'"))
        })
    }
}
