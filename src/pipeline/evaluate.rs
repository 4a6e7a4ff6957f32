// src/pipeline/evaluate.rs

use std::sync::Arc;

use tracing::info;

use crate::dataset::{self, LabeledData};
use crate::errors::Result;
use crate::model::{self, FittedModel, ModelKind};
use crate::scores::{plot, TESTING_SUFFIX};
use crate::target::{TargetExt, TargetRef};
use crate::task::{
    Bundle, Overrides, ParamKind, ParamSpec, RunContext, Task, TaskId, TaskRef, TaskReport,
};
use crate::types::{Format, Phase};

use super::load_data::{phase_param, DATA};
use super::train::{model_param, MODEL};
use super::{PipelineContext, PreProcessing, Train};

const SOURCE_TRAIN: ParamSpec =
    ParamSpec::new("source_train", ParamKind::Choice(Phase::CHOICES), "train");
const SOURCE_TEST: ParamSpec =
    ParamSpec::new("source_test", ParamKind::Choice(Phase::CHOICES), "test");

/// Scores a trained model on preprocessed test data and plots the test scores.
#[derive(Debug)]
pub struct TestModel {
    id: TaskId,
    ctx: Arc<PipelineContext>,
    data: String,
    source_train: Phase,
    source_test: Phase,
    model: ModelKind,
}

impl TestModel {
    pub const FAMILY: &'static str = "TestModel";
    const SCHEMA: &'static [ParamSpec] = &[DATA, SOURCE_TRAIN, MODEL, SOURCE_TEST];

    pub fn new(ctx: Arc<PipelineContext>, overrides: &Overrides) -> Result<Self> {
        let id = TaskId::resolve(Self::FAMILY, Self::SCHEMA, overrides)?;
        let data = id.str_param("data")?.to_string();
        let source_train = phase_param(&id, "source_train")?;
        let source_test = phase_param(&id, "source_test")?;
        let model = model_param(&id)?;
        Ok(Self {
            id,
            ctx,
            data,
            source_train,
            source_test,
            model,
        })
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }
}

impl Task for TestModel {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn requires(&self) -> Result<Bundle<TaskRef>> {
        let data = self.data.as_str();
        let train: TaskRef = Arc::new(Train::new(
            Arc::clone(&self.ctx),
            &Overrides::new()
                .with("data", data)
                .with("train_or_test", self.source_train.as_str())
                .with("model", self.model.as_str()),
        )?);
        let test_data: TaskRef = Arc::new(PreProcessing::new(
            Arc::clone(&self.ctx),
            &Overrides::new()
                .with("data", data)
                .with("train_or_test", self.source_test.as_str()),
        )?);
        Ok(Bundle::named([("model_param", train), ("test_data", test_data)]))
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::Single(
            self.ctx
                .local(&format!("{}_plotting.png", self.model), Format::Nop),
        )
    }

    fn run(&self, ctx: &RunContext) -> Result<TaskReport> {
        let model_target = ctx
            .named_input("model_param")?
            .expect_single("trained model")?;
        let fitted = FittedModel::from_json_bytes(&model_target.read_bytes()?)?;

        let data_target = ctx
            .named_input("test_data")?
            .expect_named("data", "preprocessed test data")?;
        let df = dataset::read_csv(data_target.as_ref())?;
        let labeled = LabeledData::from_frame(&df, &self.ctx.schema.label)?;

        let entry = model::model_performance(self.model.as_str(), &fitted, &labeled.x, &labeled.y)?;
        let registry = self.ctx.record_scores(
            self.source_test,
            TESTING_SUFFIX,
            ctx.scores(),
            entry.clone(),
        )?;

        let testing = registry.entries_with_suffix(TESTING_SUFFIX);
        let png = plot::render_bar_chart(plot::TITLE, &testing)?;
        let output = self.output();
        output.expect_single("plot output")?.write_bytes(&png)?;

        info!(
            model = %self.model,
            testing_score = entry.value,
            plotted = testing.len(),
            "tested model"
        );
        Ok(TaskReport::default().with_score(entry))
    }
}
