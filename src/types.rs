// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which half of the stratified split a task operates on.
///
/// - `Train`: statistics are fitted here (outliers, chi-square, VIF).
/// - `Test`: never drops rows and reuses the selection recorded by `Train`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Train,
    Test,
}

impl Phase {
    /// Allowed parameter values, in the order they are documented.
    pub const CHOICES: &'static [&'static str] = &["train", "test"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Train => "train",
            Phase::Test => "test",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" => Ok(Phase::Train),
            "test" => Ok(Phase::Test),
            other => Err(format!(
                "invalid phase: {other} (expected \"train\" or \"test\")"
            )),
        }
    }
}

/// Transfer mode of a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// UTF-8 text; writes of invalid UTF-8 are rejected at commit.
    #[default]
    Text,
    /// No transformation: bytes pass through unchanged (model artifacts,
    /// images, raw uploads).
    Nop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_parses_case_insensitively() {
        assert_eq!("TRAIN".parse::<Phase>().unwrap(), Phase::Train);
        assert_eq!(" test ".parse::<Phase>().unwrap(), Phase::Test);
        assert!("validation".parse::<Phase>().is_err());
    }

    #[test]
    fn defaults_are_train_and_text() {
        assert_eq!(Phase::default(), Phase::Train);
        assert_eq!(Format::default(), Format::Text);
    }
}
