//! Report rendering and persisted run artifacts.

use crate::artifact::ArtifactKind;
use crate::error::Result;
use crate::manifest::RecordingEntry;
use crate::regen::DurationRecord;
use crate::result::{RecordingResult, RunResult};
use crate::sink::LogSink;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SUMMARY_SCHEMA_VERSION: &str = "1.0";

/// Marker printed for a stage that was not measured.
pub const UNMEASURED: &str = "n/a";

const RULE: &str = "-------------------------------------------------------------------------";
const UNDERLINE: &str = "_________________________________________________________________________";

/// `e2e_validation_[<desc>_]YYYYMMDD_HHMMSS.txt`; spaces in `desc` become dashes.
pub fn log_file_name(desc: Option<&str>, at: DateTime<Local>) -> String {
    let desc = desc
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!("{}_", d.replace(' ', "-")))
        .unwrap_or_default();
    format!("e2e_validation_{}{}.txt", desc, at.format("%Y%m%d_%H%M%S"))
}

/// Seconds rounded to two decimals, or the unmeasured marker.
pub fn format_seconds(secs: Option<f64>) -> String {
    match secs {
        Some(s) => format!("{s:.2}"),
        None => UNMEASURED.to_string(),
    }
}

/// Labeled block for one recording.
pub fn render_recording(
    sink: &mut dyn LogSink,
    entry: &RecordingEntry,
    result: &RecordingResult,
    kinds: &[ArtifactKind],
) {
    sink.write_line("");
    sink.write_line(RULE);
    sink.write_line(&format!("Validation results for Ch10: {}", entry.recording));
    sink.write_line(UNDERLINE);
    for kind in kinds {
        sink.write_line(&format!("{}: {}", kind.title(), result.get(*kind)));
    }
    sink.write_line("");
    sink.write_line(&format!("Total Ch10 result: {}", result.overall));
    sink.write_line(UNDERLINE);
}

/// Run-wide rollups.
pub fn render_rollups(sink: &mut dyn LogSink, run: &RunResult, video: bool) {
    sink.write_line("");
    sink.write_line(&format!("Total raw 1553 data: {}", run.all_raw));
    sink.write_line(&format!("Total translated 1553 data: {}", run.all_translated));
    if video {
        sink.write_line(&format!("Total raw video data: {}", run.all_video));
    }
    sink.write_line(&format!("All validation set result: {}", run.overall));
}

/// Per-recording pipeline stage timings, in manifest order.
pub fn render_timing(
    sink: &mut dyn LogSink,
    entries: &[RecordingEntry],
    durations: &BTreeMap<String, DurationRecord>,
) {
    sink.write_line("");
    sink.write_line("---");
    sink.write_line("");
    sink.write_line("TIP run time stats:");
    for entry in entries {
        let record = durations.get(&entry.recording).copied().unwrap_or_default();
        sink.write_line("");
        sink.write_line(&format!("{}:", entry.recording));
        sink.write_line(&format!("Parse: {} seconds", format_seconds(record.parse_secs)));
        sink.write_line(&format!(
            "Translation 1553: {} seconds",
            format_seconds(record.translate_secs)
        ));
    }
}

/// One recording in the JSON summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingSummary {
    pub recording: String,
    pub icd: String,
    pub result: RecordingResult,
    pub durations: DurationRecord,
}

/// Machine-readable run summary written beside the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryArtifact {
    pub schema_version: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub truth_dir: PathBuf,
    pub test_dir: PathBuf,
    pub manifest_digest: String,
    pub kinds: Vec<ArtifactKind>,
    pub recordings: Vec<RecordingSummary>,
    pub run: RunResult,
}

/// Write the summary as pretty JSON.
pub fn write_summary_json(path: &Path, artifact: &SummaryArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ResultValue;
    use crate::sink::MemorySink;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name() {
        let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(log_file_name(None, at), "e2e_validation_20260304_050607.txt");
        assert_eq!(
            log_file_name(Some("nightly run"), at),
            "e2e_validation_nightly-run_20260304_050607.txt"
        );
        assert_eq!(log_file_name(Some(""), at), "e2e_validation_20260304_050607.txt");
    }

    #[test]
    fn test_format_seconds_never_zero_for_absent() {
        assert_eq!(format_seconds(Some(12.346)), "12.35");
        assert_eq!(format_seconds(Some(0.0)), "0.00");
        assert_eq!(format_seconds(None), "n/a");
    }

    #[test]
    fn test_render_recording_block() {
        let entry = RecordingEntry::new("REC001.ch10", "REC001.icd");
        let kinds = [ArtifactKind::Raw1553, ArtifactKind::Translated1553];
        let result = RecordingResult::from_kinds(
            ResultValue::Pass,
            ResultValue::Fail,
            ResultValue::Null,
            &kinds,
        );

        let mut sink = MemorySink::new();
        render_recording(&mut sink, &entry, &result, &kinds);
        assert!(sink.contains("Validation results for Ch10: REC001.ch10"));
        assert!(sink.contains("Raw 1553: PASS"));
        assert!(sink.contains("Translated 1553: FAIL"));
        assert!(!sink.contains("Raw Video"));
        assert!(sink.contains("Total Ch10 result: FAIL"));
    }

    #[test]
    fn test_render_timing_unmeasured() {
        let entries = vec![
            RecordingEntry::new("REC001.ch10", "a.icd"),
            RecordingEntry::new("REC002.ch10", "b.icd"),
        ];
        let mut durations = BTreeMap::new();
        durations.insert(
            "REC001.ch10".to_string(),
            DurationRecord {
                parse_secs: Some(1.234),
                translate_secs: None,
            },
        );

        let mut sink = MemorySink::new();
        render_timing(&mut sink, &entries, &durations);
        let text = sink.lines.join("\n");
        assert!(text.contains("REC001.ch10:\nParse: 1.23 seconds\nTranslation 1553: n/a seconds"));
        assert!(text.contains("REC002.ch10:\nParse: n/a seconds"));
    }

    #[test]
    fn test_summary_json_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let result = RecordingResult::from_kinds(
            ResultValue::Pass,
            ResultValue::Pass,
            ResultValue::Null,
            &[ArtifactKind::Raw1553, ArtifactKind::Translated1553],
        );
        let artifact = SummaryArtifact {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            truth_dir: PathBuf::from("/truth"),
            test_dir: PathBuf::from("/test"),
            manifest_digest: "abc".to_string(),
            kinds: vec![ArtifactKind::Raw1553, ArtifactKind::Translated1553],
            recordings: vec![RecordingSummary {
                recording: "REC001.ch10".to_string(),
                icd: "REC001.icd".to_string(),
                result,
                durations: DurationRecord::default(),
            }],
            run: RunResult::from_recordings(&[result]),
        };
        write_summary_json(&path, &artifact).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["run"]["overall"], "PASS");
        assert_eq!(raw["recordings"][0]["result"]["video"], "NULL");
        assert_eq!(raw["kinds"][1], "transl1553");
        assert!(raw["recordings"][0]["durations"]["parse_secs"].is_null());
    }
}
