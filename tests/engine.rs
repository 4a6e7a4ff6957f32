// tests/engine.rs

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use heartflow::engine::{self, EngineOptions};
use heartflow::errors::PipelineError;
use heartflow::task::Task;
use heartflow_test_utils::{StubWorld, RecordingExecutor};

use common::{init_tracing, with_timeout};

fn diamond(world: &StubWorld) -> heartflow::task::TaskRef {
    world.define("base").done();
    world.define("left").after(&["base"]).done();
    world.define("right").after(&["base"]).done();
    world.define("top").after(&["left", "right"]).done()
}

fn sequential() -> EngineOptions {
    EngineOptions { workers: 1 }
}

#[tokio::test]
async fn runs_every_task_once_in_dependency_order() {
    init_tracing();
    let world = StubWorld::new();
    let top = diamond(&world);

    let summary = with_timeout(engine::build(vec![top, world.task("left")], sequential()))
        .await
        .unwrap();

    assert_eq!(world.runs(), vec!["base", "left", "right", "top"]);
    assert_eq!(summary.executed.len(), 4);
    assert!(summary.skipped.is_empty());
    assert!(!world.events().iter().any(|e| e.starts_with("violation:")));
    for name in ["base", "left", "right", "top"] {
        assert!(world.is_complete(name), "{name} should be complete");
    }
}

#[tokio::test]
async fn second_run_executes_nothing() {
    init_tracing();
    let world = StubWorld::new();
    let top = diamond(&world);

    with_timeout(engine::build(vec![top.clone()], sequential()))
        .await
        .unwrap();
    let runs_after_first = world.runs().len();

    let summary = with_timeout(engine::build(vec![top], sequential()))
        .await
        .unwrap();
    assert!(summary.executed.is_empty());
    assert_eq!(summary.skipped.len(), 1, "only the complete root is resolved");
    assert_eq!(world.runs().len(), runs_after_first);
}

#[tokio::test]
async fn complete_tasks_are_skipped_not_run() {
    init_tracing();
    let world = StubWorld::new();
    let top = diamond(&world);
    world.mark_complete("left");

    let summary = with_timeout(engine::build(vec![top], sequential()))
        .await
        .unwrap();

    assert!(!world.runs().contains(&"left".to_string()));
    assert!(world.runs().contains(&"base".to_string()));
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.executed.len(), 3);
}

#[tokio::test]
async fn failure_aborts_the_remaining_schedule() {
    init_tracing();
    let world = StubWorld::new();
    world.define("ok").done();
    world.define("boom").after(&["ok"]).failing().done();
    world.define("after_boom").after(&["boom"]).done();
    let unrelated = world.define("unrelated").done();
    let root = world.task("after_boom");

    let err = with_timeout(engine::build(vec![root, unrelated], sequential()))
        .await
        .unwrap_err();

    match &err {
        PipelineError::TaskFailed { task, source } => {
            assert_eq!(task, "Stub(name=boom)");
            assert!(matches!(**source, PipelineError::Storage(_)));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert!(world.is_complete("ok"), "earlier outputs stay intact");
    assert!(!world.runs().contains(&"after_boom".to_string()));
    assert!(
        !world.runs().contains(&"unrelated".to_string()),
        "nothing is dispatched after a failure"
    );
}

#[tokio::test]
async fn missing_external_output_is_not_found() {
    init_tracing();
    let world = StubWorld::new();
    world.define("upstream").external().done();
    let consumer = world.define("consumer").after(&["upstream"]).done();

    let err = with_timeout(engine::build(vec![consumer], sequential()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(world.runs().is_empty());
}

#[tokio::test]
async fn present_external_output_is_trusted() {
    init_tracing();
    let world = StubWorld::new();
    world.define("upstream").external().done();
    let consumer = world.define("consumer").after(&["upstream"]).done();
    world.mark_complete("upstream");

    with_timeout(engine::build(vec![consumer], sequential()))
        .await
        .unwrap();
    assert_eq!(world.runs(), vec!["consumer"]);
}

#[tokio::test]
async fn run_without_output_fails_structurally() {
    init_tracing();
    let world = StubWorld::new();
    let lazy = world.define("lazy").without_output().done();

    let err = with_timeout(engine::build(vec![lazy], sequential()))
        .await
        .unwrap_err();
    match err {
        PipelineError::TaskFailed { source, .. } => {
            assert!(matches!(*source, PipelineError::Incomplete(_)));
        }
        other => panic!("expected TaskFailed(Incomplete), got {other:?}"),
    }
}

#[tokio::test]
async fn scores_are_merged_and_visible_downstream() {
    init_tracing();
    let world = StubWorld::new();
    world.define("fit").score("stub_training_score", 0.75).done();
    let eval = world
        .define("eval")
        .after(&["fit"])
        .score("stub_testing_score", 0.5)
        .done();

    let summary = with_timeout(engine::build(vec![eval], sequential()))
        .await
        .unwrap();
    assert_eq!(summary.scores.get("stub_training_score"), Some(0.75));
    assert_eq!(summary.scores.get("stub_testing_score"), Some(0.5));
    assert_eq!(summary.scores.len(), 2);
}

#[tokio::test]
async fn parallel_workers_respect_dependencies_and_capacity() {
    init_tracing();
    let world = StubWorld::new();
    let delay = Duration::from_millis(20);
    world.define("root").delay(delay).done();
    let mut leaves = Vec::new();
    for i in 0..6 {
        let name = format!("branch{i}");
        world.define(&name).after(&["root"]).delay(delay).done();
        leaves.push(name);
    }
    let leaf_refs: Vec<&str> = leaves.iter().map(String::as_str).collect();
    let sink = world.define("sink").after(&leaf_refs).done();

    let summary = with_timeout(engine::build(vec![sink], EngineOptions { workers: 3 }))
        .await
        .unwrap();

    assert_eq!(summary.executed.len(), 8);
    assert!(world.peak_concurrency() <= 3);
    assert!(!world.events().iter().any(|e| e.starts_with("violation:")));

    let runs = world.runs();
    assert_eq!(runs.first().map(String::as_str), Some("root"));
    assert_eq!(runs.last().map(String::as_str), Some("sink"));
}

#[tokio::test]
async fn recording_executor_sees_topological_dispatch() {
    init_tracing();
    let world = StubWorld::new();
    let top = diamond(&world);
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&dispatched);

    let summary = with_timeout(engine::build_with_executor(
        vec![top],
        sequential(),
        move |tx| RecordingExecutor::new(tx, log),
    ))
    .await
    .unwrap();

    assert_eq!(summary.executed.len(), 4);
    assert_eq!(
        *dispatched.lock().unwrap(),
        vec![
            "Stub(name=base)",
            "Stub(name=left)",
            "Stub(name=right)",
            "Stub(name=top)"
        ]
    );
    assert!(world.task("top").complete());
}
