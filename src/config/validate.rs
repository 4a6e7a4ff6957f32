// src/config/validate.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::model::ModelKind;

static REMOTE_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9+.-]*://[^/]+").expect("static pattern compiles")
});

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let models = validate_models(&raw)?;
        validate_pipeline(&raw)?;
        validate_engine(&raw)?;
        validate_storage(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.storage,
            raw.pipeline,
            raw.engine,
            models,
        ))
    }
}

fn validate_models(cfg: &RawConfigFile) -> Result<Vec<ModelKind>> {
    if cfg.pipeline.models.is_empty() {
        return Err(PipelineError::ConfigError(
            "[pipeline].models must name at least one model".to_string(),
        ));
    }

    let mut kinds = Vec::with_capacity(cfg.pipeline.models.len());
    for name in &cfg.pipeline.models {
        let kind: ModelKind = name
            .parse()
            .map_err(|e: String| PipelineError::ConfigError(format!("[pipeline].models: {e}")))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    let test_size = cfg.pipeline.test_size;
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::ConfigError(format!(
            "[pipeline].test_size must be in (0, 1) (got {test_size})"
        )));
    }

    if cfg.pipeline.dataset.trim().is_empty() {
        return Err(PipelineError::ConfigError(
            "[pipeline].dataset must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.workers == 0 {
        return Err(PipelineError::ConfigError(
            "[engine].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_storage(cfg: &RawConfigFile) -> Result<()> {
    if !REMOTE_ROOT.is_match(&cfg.storage.remote_root) {
        return Err(PipelineError::ConfigError(format!(
            "[storage].remote_root must look like scheme://bucket (got '{}')",
            cfg.storage.remote_root
        )));
    }
    Ok(())
}
