// tests/pipeline_end_to_end.rs

mod common;

use std::path::Path;

use clap::Parser;

use heartflow::cli::CliArgs;
use heartflow::config::{load_from_str, ConfigFile};
use heartflow::engine::{self, EngineOptions, RunSummary};
use heartflow::pipeline::{self, PipelineContext};
use heartflow::preprocess::FeatureSelection;
use heartflow::task::Task;

use common::{
    directory_context, init_tracing, memory_context, seed_local_dataset, synthetic_heart_csv,
    with_timeout,
};

fn default_config() -> ConfigFile {
    ConfigFile::try_from(load_from_str("").unwrap()).unwrap()
}

async fn run_default(
    ctx: &std::sync::Arc<PipelineContext>,
    cfg: &ConfigFile,
    workers: usize,
) -> heartflow::errors::Result<RunSummary> {
    let mut total = RunSummary::default();
    for roots in pipeline::default_stages(ctx, cfg)? {
        let summary = engine::build(roots, EngineOptions { workers }).await?;
        total.executed.extend(summary.executed);
        total.skipped.extend(summary.skipped);
        total.scores.merge(summary.scores.entries());
    }
    Ok(total)
}

fn assert_outputs(data_dir: &Path) {
    for name in [
        "heart.csv",
        "preprocessed_train.csv",
        "preprocessed_test.csv",
        "feature_selection_train.json",
        "feature_selection_test.json",
        "LogisticRegression_parameters.json",
        "GaussianNb_parameters.json",
        "LogisticRegression_plotting.png",
        "GaussianNb_plotting.png",
        "trainscores.csv",
        "testscores.csv",
    ] {
        assert!(data_dir.join(name).is_file(), "missing {name}");
    }
    let png = std::fs::read(data_dir.join("GaussianNb_plotting.png")).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn full_pipeline_runs_then_is_idempotent() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    seed_local_dataset(&data_dir, &synthetic_heart_csv(300, 11));
    let (ctx, store) = memory_context(&data_dir);
    let cfg = default_config();

    let first = with_timeout(run_default(&ctx, &cfg, 1)).await.unwrap();
    assert_outputs(&data_dir);

    let keys = store.keys().unwrap();
    for key in ["data/heart.csv", "data/train.csv", "data/test.csv"] {
        assert!(keys.contains(&key.to_string()), "missing object {key}: {keys:?}");
    }

    for name in [
        "LogisticRegression_training_score",
        "GaussianNb_training_score",
        "LogisticRegression_testing_score",
        "GaussianNb_testing_score",
    ] {
        let value = first.scores.get(name).unwrap_or_else(|| panic!("no score {name}"));
        assert!((0.0..=1.0).contains(&value), "{name} = {value}");
    }
    assert!(first.scores.get("LogisticRegression_training_score").unwrap() > 0.7);

    let families: Vec<&str> = first.skipped.iter().map(|id| id.family()).collect();
    assert!(
        families.contains(&pipeline::DownloadRawData::FAMILY),
        "the local dataset already satisfies the download: {families:?}"
    );

    let second = with_timeout(run_default(&ctx, &cfg, 1)).await.unwrap();
    assert!(second.executed.is_empty(), "{:?}", second.executed);
    assert!(second.scores.is_empty());
}

#[tokio::test]
async fn test_preprocessing_reuses_train_selection() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    seed_local_dataset(&data_dir, &synthetic_heart_csv(300, 5));
    let (ctx, _) = memory_context(&data_dir);

    with_timeout(run_default(&ctx, &default_config(), 3))
        .await
        .unwrap();
    assert_outputs(&data_dir);

    let read = |name: &str| {
        FeatureSelection::from_json_bytes(&std::fs::read(data_dir.join(name)).unwrap()).unwrap()
    };
    assert_eq!(
        read("feature_selection_train.json"),
        read("feature_selection_test.json")
    );

    let header = |name: &str| {
        std::fs::read_to_string(data_dir.join(name))
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .to_string()
    };
    assert_eq!(header("preprocessed_train.csv"), header("preprocessed_test.csv"));

    let train_scores = std::fs::read_to_string(data_dir.join("trainscores.csv")).unwrap();
    assert!(train_scores.starts_with("metric,score"));
    assert!(train_scores.contains("LogisticRegression_training_score,"));
    assert!(train_scores.contains("GaussianNb_training_score,"));
    assert!(!train_scores.contains("_testing_score"));

    let test_scores = std::fs::read_to_string(data_dir.join("testscores.csv")).unwrap();
    assert!(test_scores.starts_with("metric,score"));
    assert!(test_scores.contains("LogisticRegression_testing_score,"));
    assert!(test_scores.contains("GaussianNb_testing_score,"));
    assert!(!test_scores.contains("_training_score"));
}

#[tokio::test]
async fn missing_local_dataset_fails_the_upload() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (ctx, store) = memory_context(&dir.path().join("data"));

    let err = with_timeout(run_default(&ctx, &default_config(), 1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("UploadRawData"));
    assert!(store.keys().unwrap().is_empty());
}

#[tokio::test]
async fn single_family_build_stops_at_its_outputs() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    seed_local_dataset(&data_dir, &synthetic_heart_csv(120, 3));
    let ctx = directory_context(&data_dir, &dir.path().join("remote"));
    let cfg = default_config();

    let upload = pipeline::family_roots(&ctx, &cfg, "UploadRawData").unwrap();
    with_timeout(engine::build(upload, EngineOptions::default()))
        .await
        .unwrap();

    let splits = pipeline::family_roots(&ctx, &cfg, "TrainTestSplit").unwrap();
    let summary = with_timeout(engine::build(splits.clone(), EngineOptions::default()))
        .await
        .unwrap();
    assert_eq!(summary.executed.len(), 2);
    assert!(splits.iter().all(|t| t.complete()));
    assert!(dir.path().join("remote").join("data").join("train.csv").is_file());
    assert!(!data_dir.join("preprocessed_train.csv").exists());
}

#[tokio::test]
async fn cli_entry_point_runs_from_a_config_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let remote_dir = dir.path().join("remote");
    seed_local_dataset(&data_dir, &synthetic_heart_csv(200, 21));

    let config_path = dir.path().join("Heartflow.toml");
    std::fs::write(
        &config_path,
        format!(
            "[storage]\ndata_dir = \"{}\"\nremote_dir = \"{}\"\n\n[pipeline]\nmodels = [\"GaussianNb\"]\n",
            data_dir.display(),
            remote_dir.display()
        ),
    )
    .unwrap();
    let config_arg = config_path.display().to_string();

    let dry = CliArgs::try_parse_from(["heartflow", "--config", &config_arg, "--dry-run"]).unwrap();
    with_timeout(heartflow::run(dry)).await.unwrap();
    assert!(!remote_dir.exists(), "dry-run must not touch storage");

    let args = CliArgs::try_parse_from(["heartflow", "--config", &config_arg, "--workers", "2"])
        .unwrap();
    with_timeout(heartflow::run(args)).await.unwrap();

    assert!(data_dir.join("GaussianNb_plotting.png").is_file());
    assert!(!data_dir.join("LogisticRegression_plotting.png").exists());
    assert!(remote_dir.join("data").join("heart.csv").is_file());
}
