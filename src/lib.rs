// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod scores;
pub mod target;
pub mod task;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::dag::TaskGraph;
use crate::engine::{EngineOptions, RunSummary};
use crate::pipeline::PipelineContext;
use crate::task::TaskRef;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the pipeline context (local data dir + object store)
/// - root selection (`--task` or the default root set)
/// - one engine build per stage
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let ctx = Arc::new(PipelineContext::from_config(&cfg));

    let stages = match args.task.as_deref() {
        Some(family) => vec![pipeline::family_roots(&ctx, &cfg, family)?],
        None => pipeline::default_stages(&ctx, &cfg)?,
    };

    if args.dry_run {
        for roots in &stages {
            print_dry_run(roots)?;
        }
        return Ok(());
    }

    let options = EngineOptions {
        workers: args
            .workers
            .map(usize::from)
            .unwrap_or(cfg.engine.workers),
    };

    let mut total = RunSummary::default();
    for roots in stages {
        let summary = engine::build(roots, options).await?;
        total.executed.extend(summary.executed);
        total.skipped.extend(summary.skipped);
        total.scores.merge(summary.scores.entries());
    }

    info!(
        executed = total.executed.len(),
        skipped = total.skipped.len(),
        "pipeline complete"
    );
    print_summary(&total);
    Ok(())
}

/// Print the resolved graph in execution order, marking complete tasks.
fn print_dry_run(roots: &[TaskRef]) -> Result<()> {
    let graph = TaskGraph::resolve(roots)?;

    println!("heartflow dry-run ({} tasks)", graph.len());
    for task in graph.execution_order() {
        let id = task.id();
        let mark = if task.complete() { "x" } else { " " };
        println!("  [{mark}] {id}");
        println!("        signature: {}", id.signature());
        for target in task.output().values() {
            println!("        output: {}", target.path());
        }
        let deps = graph.dependencies_of(id);
        if !deps.is_empty() {
            let names: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
            println!("        after: {}", names.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "heartflow: {} task(s) run, {} already complete",
        summary.executed.len(),
        summary.skipped.len()
    );
    for entry in summary.scores.entries() {
        println!("  {:<36} {:.4}", entry.name, entry.value);
    }
}
