// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `heartflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "heartflow",
    version,
    about = "Upload, split, preprocess, train and evaluate the heart disease dataset as a task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Heartflow.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Heartflow.toml")]
    pub config: String,

    /// Build only the tasks of this family (and what they require).
    ///
    /// One of RawData, UploadRawData, DownloadRawData, TrainTestSplit,
    /// PreProcessing, Train, TestModel.
    #[arg(long, value_name = "FAMILY")]
    pub task: Option<String>,

    /// Maximum number of tasks running at once; overrides `[engine].workers`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HEARTFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the task graph, but don't run any task.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["heartflow"]).unwrap();
        assert_eq!(args.config, "Heartflow.toml");
        assert!(args.task.is_none());
        assert!(args.workers.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(CliArgs::try_parse_from(["heartflow", "--workers", "0"]).is_err());
    }

    #[test]
    fn parses_all_flags() {
        let args = CliArgs::try_parse_from([
            "heartflow",
            "--config",
            "conf/h.toml",
            "--task",
            "Train",
            "--workers",
            "4",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.config, "conf/h.toml");
        assert_eq!(args.task.as_deref(), Some("Train"));
        assert_eq!(args.workers, Some(4));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }
}
