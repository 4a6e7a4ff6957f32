// src/pipeline/load_data.rs

//! Raw dataset movement and the train/test split.

use std::sync::Arc;

use tracing::info;

use crate::dataset::{self, stratified_split};
use crate::errors::{PipelineError, Result};
use crate::target::{TargetExt, TargetRef};
use crate::task::{
    Bundle, Overrides, ParamKind, ParamSpec, RunContext, Task, TaskId, TaskRef, TaskReport,
};
use crate::types::{Format, Phase};

use super::PipelineContext;

pub(crate) const DATA: ParamSpec = ParamSpec::new("data", ParamKind::Str, "heart.csv");
pub(crate) const TRAIN_OR_TEST: ParamSpec =
    ParamSpec::new("train_or_test", ParamKind::Choice(Phase::CHOICES), "train");

/// Phase parameter of a resolved identity.
pub(crate) fn phase_param(id: &TaskId, name: &str) -> Result<Phase> {
    let raw = id.str_param(name)?;
    raw.parse()
        .map_err(|e: String| PipelineError::ConfigError(format!("{id}: {e}")))
}

pub(crate) fn data_overrides(data: &str) -> Overrides {
    Overrides::new().with("data", data)
}

/// The source dataset in the object store. Never run by the engine.
#[derive(Debug)]
pub struct RawData {
    id: TaskId,
    ctx: Arc<PipelineContext>,
    data: String,
}

impl RawData {
    pub const FAMILY: &'static str = "RawData";
    const SCHEMA: &'static [ParamSpec] = &[DATA];

    pub fn new(ctx: Arc<PipelineContext>, overrides: &Overrides) -> Result<Self> {
        let id = TaskId::resolve(Self::FAMILY, Self::SCHEMA, overrides)?;
        let data = id.str_param("data")?.to_string();
        Ok(Self { id, ctx, data })
    }
}

impl Task for RawData {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::Single(self.ctx.remote(&format!("data/{}", self.data), Format::Nop))
    }

    fn is_external(&self) -> bool {
        true
    }

    fn run(&self, _ctx: &RunContext) -> Result<TaskReport> {
        Err(PipelineError::NotFound(format!(
            "{} is external and cannot be produced",
            self.id
        )))
    }
}

/// Copies `<data_dir>/<data>` into the object store, byte for byte.
#[derive(Debug)]
pub struct UploadRawData {
    id: TaskId,
    ctx: Arc<PipelineContext>,
    data: String,
}

impl UploadRawData {
    pub const FAMILY: &'static str = "UploadRawData";
    const SCHEMA: &'static [ParamSpec] = &[DATA];

    pub fn new(ctx: Arc<PipelineContext>, overrides: &Overrides) -> Result<Self> {
        let id = TaskId::resolve(Self::FAMILY, Self::SCHEMA, overrides)?;
        let data = id.str_param("data")?.to_string();
        Ok(Self { id, ctx, data })
    }
}

impl Task for UploadRawData {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::Single(self.ctx.remote(&format!("data/{}", self.data), Format::Nop))
    }

    fn run(&self, _ctx: &RunContext) -> Result<TaskReport> {
        let source = self.ctx.local(&self.data, Format::Nop);
        let bytes = source.read_bytes()?;
        let output = self.output();
        let target = output.expect_single("upload output")?;
        target.write_bytes(&bytes)?;
        info!(from = %source.path(), to = %target.path(), bytes = bytes.len(), "uploaded raw data");
        Ok(TaskReport::default())
    }
}

/// Copies the remote dataset to `<data_dir>/<data>`.
#[derive(Debug)]
pub struct DownloadRawData {
    id: TaskId,
    ctx: Arc<PipelineContext>,
    data: String,
}

impl DownloadRawData {
    pub const FAMILY: &'static str = "DownloadRawData";
    const SCHEMA: &'static [ParamSpec] = &[DATA];

    pub fn new(ctx: Arc<PipelineContext>, overrides: &Overrides) -> Result<Self> {
        let id = TaskId::resolve(Self::FAMILY, Self::SCHEMA, overrides)?;
        let data = id.str_param("data")?.to_string();
        Ok(Self { id, ctx, data })
    }
}

impl Task for DownloadRawData {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn requires(&self) -> Result<Bundle<TaskRef>> {
        let raw = RawData::new(Arc::clone(&self.ctx), &data_overrides(&self.data))?;
        Ok(Bundle::Single(Arc::new(raw)))
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::Single(self.ctx.local(&self.data, Format::Nop))
    }

    fn run(&self, ctx: &RunContext) -> Result<TaskReport> {
        let source = ctx.single_input()?.expect_single("raw data")?;
        let bytes = source.read_bytes()?;
        let output = self.output();
        let target = output.expect_single("download output")?;
        target.write_bytes(&bytes)?;
        info!(from = %source.path(), to = %target.path(), bytes = bytes.len(), "downloaded raw data");
        Ok(TaskReport::default())
    }
}

/// One half of a stratified shuffle split of the remote dataset.
#[derive(Debug)]
pub struct TrainTestSplit {
    id: TaskId,
    ctx: Arc<PipelineContext>,
    data: String,
    phase: Phase,
}

impl TrainTestSplit {
    pub const FAMILY: &'static str = "TrainTestSplit";
    const SCHEMA: &'static [ParamSpec] = &[DATA, TRAIN_OR_TEST];

    pub fn new(ctx: Arc<PipelineContext>, overrides: &Overrides) -> Result<Self> {
        let id = TaskId::resolve(Self::FAMILY, Self::SCHEMA, overrides)?;
        let data = id.str_param("data")?.to_string();
        let phase = phase_param(&id, "train_or_test")?;
        Ok(Self {
            id,
            ctx,
            data,
            phase,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl Task for TrainTestSplit {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn requires(&self) -> Result<Bundle<TaskRef>> {
        let raw = RawData::new(Arc::clone(&self.ctx), &data_overrides(&self.data))?;
        Ok(Bundle::Single(Arc::new(raw)))
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::Single(self.ctx.remote(&format!("data/{}.csv", self.phase), Format::Text))
    }

    fn run(&self, ctx: &RunContext) -> Result<TaskReport> {
        let source = ctx.single_input()?.expect_single("raw data")?;
        let df = dataset::read_csv(source.as_ref())?;
        let (train, test) = stratified_split(
            &df,
            &self.ctx.schema.label,
            self.ctx.test_size,
            self.ctx.seed,
        )?;
        let mut half = match self.phase {
            Phase::Train => train,
            Phase::Test => test,
        };

        let output = self.output();
        dataset::write_csv(output.expect_single("split output")?.as_ref(), &mut half)?;
        info!(
            phase = %self.phase,
            rows = half.height(),
            source_rows = df.height(),
            "wrote split"
        );
        Ok(TaskReport::default())
    }
}
