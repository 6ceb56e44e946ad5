//! Ch10 end-to-end validator CLI
//!
//! Regenerates a test set with the parse/translate pipeline, compares it
//! against a truth set and reports PASS/FAIL/NULL per recording and per run.
//!
//! Exit status: 0 when the run passes, 2 on FAIL, 3 on NULL and 1 when the
//! run aborts.

use anyhow::{Context, Result};
use ch10_e2e::{ConsoleSink, ResultValue, RunOptions, ValidationOrchestrator, ValidatorConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "ch10-e2e")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "End-to-end validation of Ch10 parse/translate outputs", long_about = None)]
struct Cli {
    /// Directory holding ch10list.csv, the recordings, ICDs and known-good outputs
    truth_dir: PathBuf,

    /// Directory receiving regenerated outputs
    test_dir: PathBuf,

    /// Directory for the validation log
    log_dir: PathBuf,

    /// Descriptor inserted into the log file name
    #[arg(short = 'l', long = "log-string")]
    log_string: Option<String>,

    /// Also generate and validate raw video
    #[arg(short = 'v', long)]
    video: bool,

    /// Compare existing test outputs without running the pipeline
    #[arg(long)]
    skip_regen: bool,

    /// TOML configuration file
    #[arg(long, env = "CH10_E2E_CONFIG")]
    config: Option<PathBuf>,

    /// Installation root holding bin/ and the pipeline script
    #[arg(long, env = "CH10_E2E_TOOL_ROOT")]
    tool_root: Option<PathBuf>,

    /// Pipeline command prefix, split on whitespace
    #[arg(long, env = "CH10_E2E_PIPELINE")]
    pipeline: Option<String>,

    /// Directory-aware comparator executable
    #[arg(long)]
    directory_comparator: Option<PathBuf>,

    /// Byte-level comparator executable
    #[arg(long)]
    bytes_comparator: Option<PathBuf>,

    /// Manifest file name inside the truth directory
    #[arg(long)]
    manifest_name: Option<String>,

    /// Token preceding the timing payload in pipeline output
    #[arg(long)]
    sentinel: Option<String>,

    /// Seconds to wait for each pipeline run (0 waits indefinitely)
    #[arg(long)]
    pipeline_timeout: Option<u64>,

    /// Seconds to wait for each comparator run (0 waits indefinitely)
    #[arg(long)]
    comparator_timeout: Option<u64>,

    /// Write a JSON summary beside the log file
    #[arg(long)]
    json_summary: bool,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn load_config(&self) -> Result<ValidatorConfig> {
        let mut config = match &self.config {
            Some(path) => ValidatorConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ValidatorConfig::default(),
        };

        if let Some(root) = &self.tool_root {
            config.tool_root = root.clone();
        }
        if let Some(pipeline) = &self.pipeline {
            config.pipeline = pipeline.split_whitespace().map(str::to_string).collect();
        }
        if let Some(exe) = &self.directory_comparator {
            config.directory_comparator = Some(exe.clone());
        }
        if let Some(exe) = &self.bytes_comparator {
            config.bytes_comparator = Some(exe.clone());
        }
        if let Some(name) = &self.manifest_name {
            config.manifest_name = name.clone();
        }
        if let Some(sentinel) = &self.sentinel {
            config.sentinel = sentinel.clone();
        }
        if let Some(secs) = self.pipeline_timeout {
            config.pipeline_timeout_secs = secs;
        }
        if let Some(secs) = self.comparator_timeout {
            config.comparator_timeout_secs = secs;
        }
        Ok(config)
    }

    fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new(&self.truth_dir, &self.test_dir, &self.log_dir);
        options.log_desc = self.log_string.clone();
        options.video = self.video;
        options.regenerate = !self.skip_regen;
        options.json_summary = self.json_summary;
        options
    }
}

fn exit_code(result: ResultValue) -> ExitCode {
    match result {
        ResultValue::Pass => ExitCode::SUCCESS,
        ResultValue::Fail => ExitCode::from(2),
        ResultValue::Null => ExitCode::from(3),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ch10_e2e::init_tracing(cli.json_logs, level);

    let config = cli.load_config()?;
    debug!(?config, "Resolved configuration");

    let validator = ValidationOrchestrator::from_config(config);
    let report = validator
        .run(&cli.run_options(), &mut ConsoleSink)
        .await
        .context("Validation run aborted")?;

    println!();
    println!("Log: {}", report.log_path.display());
    if let Some(path) = &report.summary_path {
        println!("Summary: {}", path.display());
    }

    Ok(exit_code(report.overall()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "ch10-e2e",
            "/truth",
            "/test",
            "/logs",
            "-l",
            "nightly run",
            "-v",
            "--skip-regen",
            "--tool-root",
            "/opt/tip",
            "--pipeline",
            "python3 /opt/tip/run.py",
            "--comparator-timeout",
            "30",
        ]);

        let config = cli.load_config().unwrap();
        assert_eq!(config.tool_root, PathBuf::from("/opt/tip"));
        assert_eq!(config.pipeline, vec!["python3", "/opt/tip/run.py"]);
        assert_eq!(config.comparator_timeout_secs, 30);
        assert_eq!(config.manifest_name, "ch10list.csv");

        let options = cli.run_options();
        assert!(options.video);
        assert!(!options.regenerate);
        assert_eq!(options.log_desc.as_deref(), Some("nightly run"));
    }
}
