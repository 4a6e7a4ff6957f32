// src/pipeline/preprocess_data.rs

use std::sync::Arc;

use tracing::info;

use crate::dataset;
use crate::errors::Result;
use crate::preprocess::{self, FeatureSelection};
use crate::target::{TargetExt, TargetRef};
use crate::task::{Bundle, Overrides, ParamSpec, RunContext, Task, TaskId, TaskRef, TaskReport};
use crate::types::{Format, Phase};

use super::load_data::{phase_param, DATA, TRAIN_OR_TEST};
use super::{PipelineContext, TrainTestSplit};

/// Cleans one half of the split and records or applies the feature selection.
///
/// TRAIN depends on its split only. TEST additionally depends on
/// `PreProcessing(train)` and reads the selection that run recorded.
#[derive(Debug)]
pub struct PreProcessing {
    id: TaskId,
    ctx: Arc<PipelineContext>,
    data: String,
    phase: Phase,
}

impl PreProcessing {
    pub const FAMILY: &'static str = "PreProcessing";
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

    fn overrides_for(&self, phase: Phase) -> Overrides {
        Overrides::new()
            .with("data", self.data.as_str())
            .with("train_or_test", phase.as_str())
    }
}

impl Task for PreProcessing {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn requires(&self) -> Result<Bundle<TaskRef>> {
        let split: TaskRef = Arc::new(TrainTestSplit::new(
            Arc::clone(&self.ctx),
            &self.overrides_for(self.phase),
        )?);
        match self.phase {
            Phase::Train => Ok(Bundle::Single(split)),
            Phase::Test => {
                let selection: TaskRef = Arc::new(PreProcessing::new(
                    Arc::clone(&self.ctx),
                    &self.overrides_for(Phase::Train),
                )?);
                Ok(Bundle::named([("split", split), ("selection", selection)]))
            }
        }
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::named([
            (
                "data",
                self.ctx
                    .local(&format!("preprocessed_{}.csv", self.phase), Format::Text),
            ),
            (
                "selection",
                self.ctx
                    .local(&format!("feature_selection_{}.json", self.phase), Format::Text),
            ),
        ])
    }

    fn run(&self, ctx: &RunContext) -> Result<TaskReport> {
        let (split, recorded) = match self.phase {
            Phase::Train => (ctx.single_input()?.expect_single("split")?, None),
            Phase::Test => {
                let split = ctx.named_input("split")?.expect_single("split")?;
                let selection = ctx
                    .named_input("selection")?
                    .expect_named("selection", "train preprocessing")?;
                let bytes = selection.read_bytes()?;
                (split, Some(FeatureSelection::from_json_bytes(&bytes)?))
            }
        };

        let df = dataset::read_csv(split.as_ref())?;
        let preprocessor = preprocess::for_phase(self.phase, self.ctx.schema.clone(), recorded)?;
        let mut result = preprocessor.preprocess(df)?;

        let outputs = self.output();
        dataset::write_csv(
            outputs.expect_named("data", "preprocessing output")?.as_ref(),
            &mut result.frame,
        )?;
        outputs
            .expect_named("selection", "preprocessing output")?
            .write_bytes(&result.selection.to_json_bytes()?)?;

        info!(
            phase = %self.phase,
            rows = result.frame.height(),
            rows_removed = result.rows_removed,
            "wrote preprocessed data"
        );
        Ok(TaskReport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{MemoryObjectStore, Target};

    fn task(phase: &str) -> PreProcessing {
        let ctx = Arc::new(PipelineContext::new(
            "data",
            "s3://bucket",
            Arc::new(MemoryObjectStore::new()),
        ));
        PreProcessing::new(ctx, &Overrides::new().with("train_or_test", phase)).unwrap()
    }

    #[test]
    fn train_requires_only_its_split() {
        let deps = task("train").requires().unwrap();
        let split = deps.expect_single("deps").unwrap();
        assert_eq!(split.id().family(), TrainTestSplit::FAMILY);
    }

    #[test]
    fn test_requires_split_and_train_selection() {
        let deps = task("test").requires().unwrap();
        let selection = deps.expect_named("selection", "deps").unwrap();
        assert_eq!(selection.id(), task("train").id());
        let split = deps.expect_named("split", "deps").unwrap();
        assert_eq!(split.id().str_param("train_or_test").unwrap(), "test");
    }

    #[test]
    fn outputs_are_named_by_phase() {
        let outputs = task("test").output();
        assert!(outputs
            .expect_named("data", "out")
            .unwrap()
            .path()
            .ends_with("preprocessed_test.csv"));
        assert!(outputs
            .expect_named("selection", "out")
            .unwrap()
            .path()
            .ends_with("feature_selection_test.json"));
    }
}
