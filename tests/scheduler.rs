// tests/scheduler.rs

use heartflow::dag::{Completion, RunState, Scheduler, TaskGraph};
use heartflow::task::{Task, TaskId};
use heartflow_test_utils::StubWorld;

fn diamond() -> (StubWorld, TaskGraph) {
    let world = StubWorld::new();
    world.define("base").done();
    world.define("left").after(&["base"]).done();
    world.define("right").after(&["base"]).done();
    let top = world.define("top").after(&["left", "right"]).done();
    let graph = TaskGraph::resolve(&[top]).unwrap();
    (world, graph)
}

fn id(world: &StubWorld, name: &str) -> TaskId {
    world.task(name).id().clone()
}

fn names(ids: impl IntoIterator<Item = TaskId>) -> Vec<String> {
    ids.into_iter()
        .map(|id| id.str_param("name").unwrap().to_string())
        .collect()
}

#[test]
fn sequential_capacity_dispatches_in_rank_order() {
    let (world, graph) = diamond();
    assert_eq!(graph.rank(&id(&world, "base")), Some(0));
    assert!(graph.task(&id(&world, "top")).is_some());

    let mut scheduler = Scheduler::new(graph, 1);
    let first = scheduler.start().newly_scheduled;
    assert_eq!(names(first.into_iter().map(|t| t.id)), vec!["base"]);
    assert_eq!(
        scheduler.run_state_of(&id(&world, "base")),
        Some(RunState::Running)
    );

    let next = scheduler.handle_completion(&id(&world, "base"), Completion::Ran);
    assert_eq!(names(next.into_iter().map(|t| t.id)), vec!["left"]);

    let next = scheduler.handle_completion(&id(&world, "left"), Completion::Skipped);
    assert_eq!(names(next.into_iter().map(|t| t.id)), vec!["right"]);

    let next = scheduler.handle_completion(&id(&world, "right"), Completion::Ran);
    assert_eq!(names(next.into_iter().map(|t| t.id)), vec!["top"]);

    let step = scheduler.step_completion(&id(&world, "top"), Completion::Ran);
    assert!(step.newly_scheduled.is_empty());
    assert!(step.run_just_finished);
    assert!(scheduler.is_finished());
    assert_eq!(
        scheduler.run_state_of(&id(&world, "left")),
        Some(RunState::DoneSkipped)
    );
}

#[test]
fn wider_capacity_releases_independent_branches_together() {
    let (world, graph) = diamond();
    let mut scheduler = Scheduler::new(graph, 4);
    scheduler.start();

    let next = scheduler.handle_completion(&id(&world, "base"), Completion::Ran);
    assert_eq!(names(next.into_iter().map(|t| t.id)), vec!["left", "right"]);
}

#[test]
fn failure_blocks_dependents_and_stops_dispatch() {
    let (world, graph) = diamond();
    let mut scheduler = Scheduler::new(graph, 2);
    scheduler.start();
    scheduler.handle_completion(&id(&world, "base"), Completion::Ran);

    let step = scheduler.step_completion(&id(&world, "left"), Completion::Failed);
    assert!(scheduler.is_aborted());
    assert_eq!(names(step.newly_failed), vec!["left", "top"]);
    assert!(step.newly_scheduled.is_empty());
    // `right` is still running, so the run is not over yet.
    assert!(!step.run_just_finished);

    let top = scheduler.run_state_of(&id(&world, "top")).unwrap();
    assert_eq!(top, RunState::DoneFailed);
    assert!(top.is_terminal());
    assert!(!top.satisfies_dependents());

    let step = scheduler.step_completion(&id(&world, "right"), Completion::Ran);
    assert!(step.newly_scheduled.is_empty());
    assert!(step.run_just_finished);
}

#[test]
fn completion_for_task_not_running_is_ignored() {
    let (world, graph) = diamond();
    let mut scheduler = Scheduler::new(graph, 1);
    scheduler.start();

    let next = scheduler.handle_completion(&id(&world, "top"), Completion::Ran);
    assert!(next.is_empty());
    assert_eq!(
        scheduler.run_state_of(&id(&world, "top")),
        Some(RunState::Pending)
    );
    assert!(!scheduler.is_aborted());
}
