//! End-to-end validation run.
//!
//! Sequence: load manifest, optionally regenerate the test set, open the
//! log, compare every requested artifact kind of every recording in
//! manifest order, aggregate, and report to the console and the log.

use crate::artifact::{ArtifactKind, ArtifactLocation};
use crate::compare::{ComparatorSet, ComparisonAdapter, ExternalComparator};
use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::manifest::{Manifest, RecordingEntry};
use crate::regen::{DurationRecord, RegenerationCoordinator};
use crate::report::{self, RecordingSummary, SummaryArtifact, SUMMARY_SCHEMA_VERSION};
use crate::result::{RecordingResult, ResultValue, RunResult};
use crate::sink::{FanOut, FileSink, LogSink};
use chrono::{Local, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Inputs of one validation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Holds the manifest, recordings, ICDs and known-good outputs.
    pub truth_dir: PathBuf,

    /// Receives regenerated outputs.
    pub test_dir: PathBuf,

    pub log_dir: PathBuf,

    /// Inserted into the log file name.
    pub log_desc: Option<String>,

    /// Also generate and validate raw video.
    pub video: bool,

    /// Run the pipeline before comparing.
    pub regenerate: bool,

    /// Write a JSON summary beside the log.
    pub json_summary: bool,
}

impl RunOptions {
    pub fn new(
        truth_dir: impl Into<PathBuf>,
        test_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            truth_dir: truth_dir.into(),
            test_dir: test_dir.into(),
            log_dir: log_dir.into(),
            log_desc: None,
            video: false,
            regenerate: true,
            json_summary: false,
        }
    }

    /// Artifact kinds compared for each recording.
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        let mut kinds = vec![ArtifactKind::Raw1553, ArtifactKind::Translated1553];
        if self.video {
            kinds.push(ArtifactKind::RawVideo);
        }
        kinds
    }
}

/// Result of one recording.
#[derive(Debug, Clone)]
pub struct RecordingOutcome {
    pub entry: RecordingEntry,
    pub result: RecordingResult,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub run_id: Uuid,
    pub log_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub recordings: Vec<RecordingOutcome>,
    pub run: RunResult,
    pub durations: BTreeMap<String, DurationRecord>,
}

impl ValidationReport {
    pub fn overall(&self) -> ResultValue {
        self.run.overall
    }
}

/// Drives a validation run.
pub struct ValidationOrchestrator {
    config: ValidatorConfig,
    comparators: ComparatorSet,
}

impl ValidationOrchestrator {
    pub fn new(config: ValidatorConfig, comparators: ComparatorSet) -> Self {
        Self {
            config,
            comparators,
        }
    }

    /// Use the external comparators named by `config`.
    pub fn from_config(config: ValidatorConfig) -> Self {
        let timeout = config.comparator_timeout_secs;
        let comparators = ComparatorSet::new(
            Arc::new(ExternalComparator::new(config.directory_comparator_path(), timeout)),
            Arc::new(ExternalComparator::new(config.bytes_comparator_path(), timeout)),
        );
        Self::new(config, comparators)
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run the whole validation.
    ///
    /// Errors are fatal: a missing manifest, or a regeneration whose
    /// timing payload is absent or malformed. Both happen before the log is
    /// opened, so no partial report is written.
    pub async fn run(
        &self,
        options: &RunOptions,
        console: &mut dyn LogSink,
    ) -> Result<ValidationReport> {
        let run_id = Uuid::new_v4();
        let kinds = options.kinds();
        let manifest = Manifest::load(&options.truth_dir.join(&self.config.manifest_name))?;

        info!(
            run_id = %run_id,
            recordings = manifest.entries.len(),
            manifest_digest = %manifest.digest,
            "Starting validation run"
        );

        let durations = if options.regenerate {
            console.write_line("");
            console.write_line("-- Regenerating test set --");
            RegenerationCoordinator::new(
                &self.config,
                &options.truth_dir,
                &options.test_dir,
                options.video,
            )
            .regenerate_all(&manifest.entries)
            .await?
        } else {
            info!("Skipping test set regeneration");
            BTreeMap::new()
        };

        std::fs::create_dir_all(&options.log_dir)?;
        let log_path = options
            .log_dir
            .join(report::log_file_name(options.log_desc.as_deref(), Local::now()));
        let mut log = FileSink::create(&log_path)?;
        info!(path = %log_path.display(), "Opened validation log");

        log.write_line(&format!("truth base dir: {}", options.truth_dir.display()));
        log.write_line(&format!("test base dir: {}", options.test_dir.display()));

        let mut recordings = Vec::with_capacity(manifest.entries.len());
        for entry in &manifest.entries {
            let result = self.validate_recording(entry, options, &kinds, console, &mut log).await;
            recordings.push(RecordingOutcome {
                entry: entry.clone(),
                result,
            });
        }

        let run = RunResult::from_recordings(recordings.iter().map(|r| &r.result));

        {
            let mut both = FanOut::new(console, &mut log);
            both.write_line("");
            both.write_line("---");
            for outcome in &recordings {
                report::render_recording(&mut both, &outcome.entry, &outcome.result, &kinds);
            }
            report::render_rollups(&mut both, &run, options.video);
            report::render_timing(&mut both, &manifest.entries, &durations);
        }

        let summary_path = if options.json_summary {
            let path = log_path.with_extension("json");
            let artifact = SummaryArtifact {
                schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
                run_id,
                generated_at: Utc::now(),
                truth_dir: options.truth_dir.clone(),
                test_dir: options.test_dir.clone(),
                manifest_digest: manifest.digest.clone(),
                kinds: kinds.clone(),
                recordings: recordings
                    .iter()
                    .map(|r| RecordingSummary {
                        recording: r.entry.recording.clone(),
                        icd: r.entry.icd.clone(),
                        result: r.result,
                        durations: durations.get(&r.entry.recording).copied().unwrap_or_default(),
                    })
                    .collect(),
                run,
            };
            report::write_summary_json(&path, &artifact)?;
            Some(path)
        } else {
            None
        };

        match run.overall {
            ResultValue::Pass => info!(run_id = %run_id, "Validation passed"),
            other => warn!(run_id = %run_id, result = %other, "Validation did not pass"),
        }

        Ok(ValidationReport {
            run_id,
            log_path,
            summary_path,
            recordings,
            run,
            durations,
        })
    }

    async fn validate_recording(
        &self,
        entry: &RecordingEntry,
        options: &RunOptions,
        kinds: &[ArtifactKind],
        console: &mut dyn LogSink,
        log: &mut dyn LogSink,
    ) -> RecordingResult {
        let banner = format!("----- Validating Ch10: {} -----", entry.recording);
        console.write_line(&banner);
        log.write_line("");
        log.write_line(&banner);

        let mut values = [ResultValue::Null; 3];
        for (slot, kind) in ArtifactKind::ALL.into_iter().enumerate() {
            if !kinds.contains(&kind) {
                continue;
            }
            let name = entry.artifact_name(kind);
            let location = ArtifactLocation::new(
                Some(options.truth_dir.join(name)),
                Some(options.test_dir.join(name)),
            );
            let mut adapter = ComparisonAdapter::new(kind, location, self.comparators.clone());

            log.write_line("");
            log.write_line(&format!("-- {} Comparison --", kind.title()));
            values[slot] = adapter.validate(log).await;
            info!(
                recording = %entry.recording,
                kind = %kind,
                result = %values[slot],
                "Comparison finished"
            );
        }

        let [raw, translated, video] = values;
        RecordingResult::from_kinds(raw, translated, video, kinds)
    }
}
