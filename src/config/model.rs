// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::model::ModelKind;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [storage]
/// data_dir = "data"
/// remote_root = "s3://csci-e29-2020fa-final-project"
/// remote_dir = ".remote"
///
/// [pipeline]
/// dataset = "heart.csv"
/// models = ["LogisticRegression", "GaussianNb"]
/// test_size = 0.2
/// seed = 42
///
/// [engine]
/// workers = 1
/// ```
///
/// All sections are optional and have defaults. This is the unchecked
/// form; see [`ConfigFile`] for the validated one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub engine: EngineSection,
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Shared local directory for downloaded and derived files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// `scheme://bucket[/prefix]` under which remote objects live.
    #[serde(default = "default_remote_root")]
    pub remote_root: String,

    /// Local directory backing the object store client.
    #[serde(default = "default_remote_dir")]
    pub remote_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_remote_root() -> String {
    "s3://csci-e29-2020fa-final-project".to_string()
}

fn default_remote_dir() -> PathBuf {
    PathBuf::from(".remote")
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_root: default_remote_root(),
            remote_dir: default_remote_dir(),
        }
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Source CSV file name, the `data` parameter of every task.
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// Models to train and test, by name.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Fraction of rows that goes to the test half of the split.
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_dataset() -> String {
    "heart.csv".to_string()
}

fn default_models() -> Vec<String> {
    ModelKind::CHOICES.iter().map(|s| s.to_string()).collect()
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            models: default_models(),
            test_size: default_test_size(),
            seed: default_seed(),
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Maximum number of tasks running at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    1
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub storage: StorageSection,
    pub pipeline: PipelineSection,
    pub engine: EngineSection,
    models: Vec<ModelKind>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        storage: StorageSection,
        pipeline: PipelineSection,
        engine: EngineSection,
        models: Vec<ModelKind>,
    ) -> Self {
        Self {
            storage,
            pipeline,
            engine,
            models,
        }
    }

    /// Configured models, parsed, in configuration order.
    pub fn models(&self) -> &[ModelKind] {
        &self.models
    }
}
