// src/pipeline/train.rs

use std::sync::Arc;

use tracing::info;

use crate::dataset::{self, LabeledData};
use crate::errors::{PipelineError, Result};
use crate::model::{self, ModelKind};
use crate::scores::TRAINING_SUFFIX;
use crate::target::{TargetExt, TargetRef};
use crate::task::{
    Bundle, Overrides, ParamKind, ParamSpec, RunContext, Task, TaskId, TaskRef, TaskReport,
};
use crate::types::{Format, Phase};

use super::load_data::{phase_param, DATA, TRAIN_OR_TEST};
use super::{PipelineContext, PreProcessing};

pub(crate) const MODEL: ParamSpec = ParamSpec::new(
    "model",
    ParamKind::Choice(ModelKind::CHOICES),
    "LogisticRegression",
);

pub(crate) fn model_param(id: &TaskId) -> Result<ModelKind> {
    id.str_param("model")?
        .parse()
        .map_err(|e: String| PipelineError::ConfigError(format!("{id}: {e}")))
}

/// Fits one model on preprocessed data and stores it as JSON.
#[derive(Debug)]
pub struct Train {
    id: TaskId,
    ctx: Arc<PipelineContext>,
    data: String,
    phase: Phase,
    model: ModelKind,
}

impl Train {
    pub const FAMILY: &'static str = "Train";
    const SCHEMA: &'static [ParamSpec] = &[DATA, TRAIN_OR_TEST, MODEL];

    pub fn new(ctx: Arc<PipelineContext>, overrides: &Overrides) -> Result<Self> {
        let id = TaskId::resolve(Self::FAMILY, Self::SCHEMA, overrides)?;
        let data = id.str_param("data")?.to_string();
        let phase = phase_param(&id, "train_or_test")?;
        let model = model_param(&id)?;
        Ok(Self {
            id,
            ctx,
            data,
            phase,
            model,
        })
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }
}

impl Task for Train {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn requires(&self) -> Result<Bundle<TaskRef>> {
        let overrides = Overrides::new()
            .with("data", self.data.as_str())
            .with("train_or_test", self.phase.as_str());
        let preprocessed = PreProcessing::new(Arc::clone(&self.ctx), &overrides)?;
        Ok(Bundle::Single(Arc::new(preprocessed)))
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::Single(
            self.ctx
                .local(&format!("{}_parameters.json", self.model), Format::Nop),
        )
    }

    fn run(&self, ctx: &RunContext) -> Result<TaskReport> {
        let input = ctx
            .single_input()?
            .expect_named("data", "preprocessed data")?;
        let df = dataset::read_csv(input.as_ref())?;
        let labeled = LabeledData::from_frame(&df, &self.ctx.schema.label)?;

        let outcome = model::fit_model(self.model, &labeled.x, &labeled.y)?;
        let output = self.output();
        output
            .expect_single("model output")?
            .write_bytes(&outcome.model.to_json_bytes()?)?;

        let entry = outcome.score_entry();
        self.ctx.record_scores(self.phase, TRAINING_SUFFIX, ctx.scores(), entry.clone())?;

        info!(
            model = %self.model,
            features = ?labeled.feature_names,
            training_score = outcome.training_score,
            "trained model"
        );
        Ok(TaskReport::default().with_score(entry))
    }
}
