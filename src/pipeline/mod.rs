// src/pipeline/mod.rs

//! The heart disease pipeline as task families.
//!
//! ```text
//! UploadRawData                      DownloadRawData
//!                                          |
//!                 RawData (external) <-----+
//!                    |
//!            TrainTestSplit(train|test)
//!                    |
//!            PreProcessing(train) <------- PreProcessing(test)
//!                    |                            |
//!              Train(model)                       |
//!                    |                            |
//!                    +-------> TestModel(model) <-+
//! ```
//!
//! Every family resolves its identity through [`TaskId::resolve`] and
//! derives its output paths from the resolved parameters, so equal
//! identities always map to equal targets.

pub mod evaluate;
pub mod load_data;
pub mod preprocess_data;
pub mod train;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::preprocess::FeatureSchema;
use crate::scores::{ScoreEntry, ScoreRegistry};
use crate::target::{
    DirectoryObjectStore, LocalTarget, ObjectStore, RemoteTarget, Target, TargetRef,
};
use crate::task::TaskRef;
use crate::types::{Format, Phase};

pub use evaluate::TestModel;
pub use load_data::{DownloadRawData, RawData, TrainTestSplit, UploadRawData};
pub use preprocess_data::PreProcessing;
pub use train::Train;

use load_data::data_overrides;

/// Task family names accepted by `--task`.
pub const FAMILIES: &[&str] = &[
    RawData::FAMILY,
    UploadRawData::FAMILY,
    DownloadRawData::FAMILY,
    TrainTestSplit::FAMILY,
    PreProcessing::FAMILY,
    Train::FAMILY,
    TestModel::FAMILY,
];

/// Where task outputs live and how the statistical tasks are tuned.
///
/// Shared by every task of one invocation behind an `Arc`.
#[derive(Debug)]
pub struct PipelineContext {
    pub data_dir: PathBuf,
    pub remote_root: String,
    pub store: Arc<dyn ObjectStore>,
    pub test_size: f64,
    pub seed: u64,
    pub schema: FeatureSchema,
    /// Every score recorded by this invocation's tasks. Held while a
    /// score file is rewritten.
    score_log: Mutex<ScoreRegistry>,
}

impl PipelineContext {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        remote_root: impl Into<String>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            remote_root: remote_root.into(),
            store,
            test_size: 0.2,
            seed: 42,
            schema: FeatureSchema::heart(),
            score_log: Mutex::new(ScoreRegistry::new()),
        }
    }

    pub fn with_split(mut self, test_size: f64, seed: u64) -> Self {
        self.test_size = test_size;
        self.seed = seed;
        self
    }

    /// Context backed by a `DirectoryObjectStore` rooted at `[storage].remote_dir`.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let store = Arc::new(DirectoryObjectStore::new(&cfg.storage.remote_dir));
        Self::new(&cfg.storage.data_dir, &cfg.storage.remote_root, store)
            .with_split(cfg.pipeline.test_size, cfg.pipeline.seed)
    }

    /// `<data_dir>/<name>`.
    pub fn local(&self, name: &str, format: Format) -> TargetRef {
        Arc::new(LocalTarget::new(self.data_dir.join(name), format))
    }

    /// `<remote_root>/<key>`.
    pub fn remote(&self, key: &str, format: Format) -> TargetRef {
        Arc::new(RemoteTarget::new(
            Arc::clone(&self.store),
            &self.remote_root,
            key,
            format,
        ))
    }

    /// Add `snapshot` and `entry` to the shared score log and rewrite
    /// `<data_dir>/<phase>scores.csv` with the logged entries ending in
    /// `suffix`. Returns the whole log.
    ///
    /// The file is written under the log's lock, so tasks finishing at the
    /// same time cannot drop each other's rows.
    pub fn record_scores(
        &self,
        phase: Phase,
        suffix: &str,
        snapshot: &ScoreRegistry,
        entry: ScoreEntry,
    ) -> Result<ScoreRegistry> {
        let mut log = self
            .score_log
            .lock()
            .map_err(|_| PipelineError::Storage("score log lock poisoned".to_string()))?;
        log.merge(snapshot.entries());
        log.record(entry);

        let rows = log.with_suffix(suffix);
        let target = self.local(&format!("{phase}scores.csv"), Format::Text);
        rows.persist(target.as_ref())?;
        info!(
            phase = %phase,
            path = %target.path(),
            scores = ?rows.entries(),
            "score registry"
        );
        Ok(log.clone())
    }
}

/// Upload, download and one `TestModel` per configured model.
pub fn default_roots(ctx: &Arc<PipelineContext>, cfg: &ConfigFile) -> Result<Vec<TaskRef>> {
    let data = cfg.pipeline.dataset.as_str();
    let mut roots: Vec<TaskRef> = vec![
        Arc::new(UploadRawData::new(Arc::clone(ctx), &data_overrides(data))?),
        Arc::new(DownloadRawData::new(Arc::clone(ctx), &data_overrides(data))?),
    ];
    for model in cfg.models() {
        let overrides = data_overrides(data).with("model", model.as_str());
        roots.push(Arc::new(TestModel::new(Arc::clone(ctx), &overrides)?));
    }
    Ok(roots)
}

/// [`default_roots`] as two consecutive builds: the upload alone, then
/// everything else. `RawData` is checked when it is dispatched, so the
/// upload must have finished by then whatever the worker count.
pub fn default_stages(ctx: &Arc<PipelineContext>, cfg: &ConfigFile) -> Result<Vec<Vec<TaskRef>>> {
    let mut rest = default_roots(ctx, cfg)?;
    let upload: Vec<TaskRef> = rest.drain(..1).collect();
    Ok(vec![upload, rest])
}

/// Roots for `--task <family>`, using defaults for every parameter except
/// `data` and, where the family has one, `model`.
pub fn family_roots(
    ctx: &Arc<PipelineContext>,
    cfg: &ConfigFile,
    family: &str,
) -> Result<Vec<TaskRef>> {
    let data = cfg.pipeline.dataset.as_str();
    let base = data_overrides(data);
    let ctx = Arc::clone(ctx);

    let roots: Vec<TaskRef> = match family {
        RawData::FAMILY => vec![Arc::new(RawData::new(ctx, &base)?)],
        UploadRawData::FAMILY => vec![Arc::new(UploadRawData::new(ctx, &base)?)],
        DownloadRawData::FAMILY => vec![Arc::new(DownloadRawData::new(ctx, &base)?)],
        TrainTestSplit::FAMILY | PreProcessing::FAMILY => {
            let mut roots: Vec<TaskRef> = Vec::new();
            for phase in [Phase::Train, Phase::Test] {
                let overrides = base.clone().with("train_or_test", phase.as_str());
                let task: TaskRef = if family == TrainTestSplit::FAMILY {
                    Arc::new(TrainTestSplit::new(Arc::clone(&ctx), &overrides)?)
                } else {
                    Arc::new(PreProcessing::new(Arc::clone(&ctx), &overrides)?)
                };
                roots.push(task);
            }
            roots
        }
        Train::FAMILY | TestModel::FAMILY => {
            let mut roots: Vec<TaskRef> = Vec::new();
            for model in cfg.models() {
                let overrides = base.clone().with("model", model.as_str());
                let task: TaskRef = if family == Train::FAMILY {
                    Arc::new(Train::new(Arc::clone(&ctx), &overrides)?)
                } else {
                    Arc::new(TestModel::new(Arc::clone(&ctx), &overrides)?)
                };
                roots.push(task);
            }
            roots
        }
        other => {
            return Err(PipelineError::ConfigError(format!(
                "unknown task family '{other}' (expected one of {FAMILIES:?})"
            )));
        }
    };
    Ok(roots)
}
