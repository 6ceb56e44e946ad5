//! Test-set regeneration through the external pipeline.

use crate::config::ValidatorConfig;
use crate::error::{PayloadError, Result, ValidateError};
use crate::manifest::RecordingEntry;
use crate::runner::{extract_payload, CommandSpec, SubprocessRunner};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Payload stage key for raw parsing.
pub const PARSE_STAGE: &str = "raw1553";

/// Payload stage key for 1553 translation.
pub const TRANSLATE_STAGE: &str = "transl1553";

/// Elapsed seconds per pipeline stage; `None` when not measured.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DurationRecord {
    pub parse_secs: Option<f64>,
    pub translate_secs: Option<f64>,
}

impl DurationRecord {
    pub fn from_stages(stages: &Map<String, Value>) -> Self {
        Self {
            parse_secs: stages.get(PARSE_STAGE).and_then(Value::as_f64),
            translate_secs: stages.get(TRANSLATE_STAGE).and_then(Value::as_f64),
        }
    }
}

/// What happened to one recording.
#[derive(Debug, Clone, PartialEq)]
pub enum RegenOutcome {
    Regenerated {
        exit_code: i32,
        durations: DurationRecord,
    },
    /// An input was missing; existing test content is used as-is.
    Skipped { missing: PathBuf },
}

/// Runs the pipeline for each recording whose inputs exist.
pub struct RegenerationCoordinator<'a> {
    config: &'a ValidatorConfig,
    truth_dir: &'a Path,
    test_dir: &'a Path,
    video: bool,
}

impl<'a> RegenerationCoordinator<'a> {
    pub fn new(
        config: &'a ValidatorConfig,
        truth_dir: &'a Path,
        test_dir: &'a Path,
        video: bool,
    ) -> Self {
        Self {
            config,
            truth_dir,
            test_dir,
            video,
        }
    }

    /// Pipeline invocation for one recording.
    pub fn command_for(&self, entry: &RecordingEntry) -> CommandSpec {
        let mut argv = self.config.pipeline_command();
        argv.push(self.truth_dir.join(&entry.recording).display().to_string());
        argv.push(self.truth_dir.join(&entry.icd).display().to_string());
        argv.push("-o".to_string());
        argv.push(self.test_dir.display().to_string());
        if self.video {
            argv.push("--video".to_string());
            argv.push("--no-ts".to_string());
        }
        CommandSpec::new(argv).with_timeout(self.config.pipeline_timeout_secs)
    }

    /// Regenerate one recording.
    ///
    /// Missing inputs skip the recording. A missing or malformed timing
    /// payload is an error and must abort the run.
    pub async fn regenerate(&self, entry: &RecordingEntry) -> Result<RegenOutcome> {
        let recording_path = self.truth_dir.join(&entry.recording);
        let icd_path = self.truth_dir.join(&entry.icd);

        for (what, path) in [("ch10", &recording_path), ("icd", &icd_path)] {
            if !path.is_file() {
                warn!(
                    recording = %entry.recording,
                    missing = %path.display(),
                    "Truth {} file does not exist, not generating test data",
                    what
                );
                return Ok(RegenOutcome::Skipped {
                    missing: path.clone(),
                });
            }
        }

        let spec = self.command_for(entry);
        info!(recording = %entry.recording, command = %spec.display(), "Running pipeline");
        let output = SubprocessRunner::run(&spec).await.map_err(|e| match e {
            ValidateError::Io(source) => ValidateError::PipelineSpawn {
                recording: entry.recording.clone(),
                source,
            },
            other => other,
        })?;
        debug!(recording = %entry.recording, stdout = %output.stdout, "Pipeline output");

        if !output.success() {
            warn!(
                recording = %entry.recording,
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "Pipeline exited with non-zero status"
            );
        }

        let payload = extract_payload(&output.stdout, &self.config.sentinel)
            .map_err(|source| ValidateError::Payload {
                recording: entry.recording.clone(),
                source,
            })?
            .ok_or_else(|| ValidateError::SentinelAbsent {
                recording: entry.recording.clone(),
                sentinel: self.config.sentinel.clone(),
            })?;

        let durations = durations_from_payload(&entry.recording, &payload)?;
        info!(
            recording = %entry.recording,
            duration_ms = output.duration_ms,
            "Pipeline finished"
        );

        Ok(RegenOutcome::Regenerated {
            exit_code: output.exit_code,
            durations,
        })
    }

    /// Regenerate every recording in order, collecting durations by
    /// recording name. Stops at the first fatal error.
    pub async fn regenerate_all(
        &self,
        entries: &[RecordingEntry],
    ) -> Result<BTreeMap<String, DurationRecord>> {
        let mut durations = BTreeMap::new();
        for entry in entries {
            if let RegenOutcome::Regenerated { durations: d, .. } = self.regenerate(entry).await? {
                durations.insert(entry.recording.clone(), d);
            }
        }
        Ok(durations)
    }
}

/// The payload must hold exactly one recording: `{path: {stage: seconds}}`.
fn durations_from_payload(recording: &str, payload: &Map<String, Value>) -> Result<DurationRecord> {
    if payload.len() != 1 {
        return Err(ValidateError::PayloadKeyCount {
            recording: recording.to_string(),
            count: payload.len(),
        });
    }
    match payload.values().next() {
        Some(Value::Object(stages)) => Ok(DurationRecord::from_stages(stages)),
        Some(other) => Err(ValidateError::Payload {
            recording: recording.to_string(),
            source: PayloadError::Shape(other.to_string()),
        }),
        None => Ok(DurationRecord::default()),
    }
}
