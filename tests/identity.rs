// tests/identity.rs

mod common;

use proptest::prelude::*;

use heartflow::pipeline::{PreProcessing, TestModel, Train, TrainTestSplit};
use heartflow::target::Target;
use heartflow::task::{Overrides, ParamKind, ParamSpec, Task, TaskId};

use common::memory_context;

const SCHEMA: &[ParamSpec] = &[
    ParamSpec::new("alpha", ParamKind::Str, "a"),
    ParamSpec::new("beta", ParamKind::Int, "1"),
    ParamSpec::new("gamma", ParamKind::Bool, "false"),
    ParamSpec::new("delta", ParamKind::Choice(&["x", "y"]), "x"),
];

fn output_paths(task: &dyn Task) -> Vec<String> {
    task.output().values().iter().map(|t| t.path()).collect()
}

#[test]
fn same_parameters_give_same_identity_and_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _) = memory_context(dir.path());

    let a = Train::new(ctx.clone(), &Overrides::new()).unwrap();
    let b = Train::new(
        ctx.clone(),
        &Overrides::new()
            .with("model", "LogisticRegression")
            .with("data", "heart.csv"),
    )
    .unwrap();

    assert_eq!(a.id(), b.id());
    assert_eq!(a.id().signature(), b.id().signature());
    assert_eq!(output_paths(&a), output_paths(&b));
}

#[test]
fn different_parameters_give_different_identity() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _) = memory_context(dir.path());

    let train = TrainTestSplit::new(ctx.clone(), &Overrides::new()).unwrap();
    let test = TrainTestSplit::new(ctx, &Overrides::new().with("train_or_test", "test")).unwrap();
    assert_ne!(train.id(), test.id());
    assert_ne!(train.id().signature(), test.id().signature());
    assert_ne!(output_paths(&train), output_paths(&test));
}

#[test]
fn override_of_the_wrong_type_fails_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _) = memory_context(dir.path());

    let err = PreProcessing::new(ctx.clone(), &Overrides::new().with("train_or_test", true))
        .unwrap_err();
    assert!(err.is_configuration());

    let err = TestModel::new(ctx, &Overrides::new().with("model", 3i64)).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn output_path_follows_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _) = memory_context(dir.path());

    let test = PreProcessing::new(ctx, &Overrides::new().with("train_or_test", "test")).unwrap();
    let paths = output_paths(&test);
    assert!(paths.iter().any(|p| p.ends_with("preprocessed_test.csv")));
    assert!(paths.iter().any(|p| p.ends_with("feature_selection_test.json")));
}

fn overrides_strategy() -> impl Strategy<Value = Vec<(&'static str, bool)>> {
    // Each parameter is either given explicitly at its default or left out.
    proptest::collection::vec(any::<bool>(), 4).prop_map(|flags| {
        ["alpha", "beta", "gamma", "delta"]
            .into_iter()
            .zip(flags)
            .collect()
    })
}

proptest! {
    #[test]
    fn identity_is_independent_of_override_order(
        given in overrides_strategy(),
        reverse in any::<bool>(),
    ) {
        let mut entries: Vec<(&str, bool)> = given.into_iter().filter(|(_, g)| *g).collect();
        if reverse {
            entries.reverse();
        }

        let mut overrides = Overrides::new();
        for (name, _) in entries {
            match name {
                "alpha" => overrides.set(name, "a"),
                "beta" => overrides.set(name, 1i64),
                "gamma" => overrides.set(name, false),
                _ => overrides.set(name, "x"),
            }
        }

        let explicit = TaskId::resolve("Family", SCHEMA, &overrides).unwrap();
        let implicit = TaskId::resolve("Family", SCHEMA, &Overrides::new()).unwrap();
        prop_assert_eq!(&explicit, &implicit);
        prop_assert_eq!(explicit.signature(), implicit.signature());
    }

    #[test]
    fn signature_is_stable_and_safe(alpha in "[a-zA-Z0-9 ./:-]{0,40}", beta in any::<i64>()) {
        let overrides = Overrides::new().with("alpha", alpha.as_str()).with("beta", beta);
        let first = TaskId::resolve("Family", SCHEMA, &overrides).unwrap();
        let second = TaskId::resolve("Family", SCHEMA, &overrides).unwrap();
        prop_assert_eq!(first.signature(), second.signature());
        prop_assert!(first
            .signature()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
