//! Tri-state validation results and their aggregation.
//!
//! Every level of the report (artifact kind within a recording, recording
//! within a run, kind-wide rollups across recordings) is combined with the
//! same total order: `Fail` > `Null` > `Pass`.

use crate::artifact::ArtifactKind;
use crate::error::{Result, ValidateError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a single comparison or of an aggregate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultValue {
    Pass,
    Fail,
    /// Not evaluated, or not applicable.
    #[default]
    Null,
}

impl ResultValue {
    /// Report label for this value.
    pub fn label(&self) -> &'static str {
        match self {
            ResultValue::Pass => "PASS",
            ResultValue::Fail => "FAIL",
            ResultValue::Null => "NULL",
        }
    }

    /// Combine two values under `Fail` > `Null` > `Pass`.
    pub fn and(self, other: ResultValue) -> ResultValue {
        match (self, other) {
            (ResultValue::Fail, _) | (_, ResultValue::Fail) => ResultValue::Fail,
            (ResultValue::Null, _) | (_, ResultValue::Null) => ResultValue::Null,
            _ => ResultValue::Pass,
        }
    }

    /// Map a boolean verdict onto `Pass`/`Fail`.
    pub fn from_passed(passed: bool) -> ResultValue {
        if passed {
            ResultValue::Pass
        } else {
            ResultValue::Fail
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResultValue {
    type Err = ValidateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PASS" => Ok(ResultValue::Pass),
            "FAIL" => Ok(ResultValue::Fail),
            "NULL" => Ok(ResultValue::Null),
            other => Err(ValidateError::UnknownResultLabel(other.to_string())),
        }
    }
}

/// Combine a sequence of results.
///
/// Any `Fail` yields `Fail`; otherwise any `Null` yields `Null`; otherwise
/// `Pass`. An empty sequence has nothing evaluated and yields `Null`.
pub fn combine<I>(values: I) -> ResultValue
where
    I: IntoIterator<Item = ResultValue>,
{
    values
        .into_iter()
        .reduce(ResultValue::and)
        .unwrap_or(ResultValue::Null)
}

/// Aggregate results for one recording.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordingResult {
    pub raw: ResultValue,
    pub translated: ResultValue,
    pub video: ResultValue,
    pub overall: ResultValue,
}

impl RecordingResult {
    /// Build from per-kind values. `overall` only considers the kinds listed
    /// in `evaluated`; the other slots keep whatever was passed (normally `Null`).
    pub fn from_kinds(
        raw: ResultValue,
        translated: ResultValue,
        video: ResultValue,
        evaluated: &[ArtifactKind],
    ) -> Self {
        let mut result = Self {
            raw,
            translated,
            video,
            overall: ResultValue::Null,
        };
        result.overall = combine(evaluated.iter().map(|kind| result.get(*kind)));
        result
    }

    /// Value for one artifact kind.
    pub fn get(&self, kind: ArtifactKind) -> ResultValue {
        match kind {
            ArtifactKind::Raw1553 => self.raw,
            ArtifactKind::Translated1553 => self.translated,
            ArtifactKind::RawVideo => self.video,
        }
    }
}

/// Aggregate results for a whole run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunResult {
    pub all_raw: ResultValue,
    pub all_translated: ResultValue,
    pub all_video: ResultValue,
    pub overall: ResultValue,
}

impl RunResult {
    /// Roll up recording results, each kind independently and the overalls.
    pub fn from_recordings<'a, I>(recordings: I) -> Self
    where
        I: IntoIterator<Item = &'a RecordingResult>,
        I::IntoIter: Clone,
    {
        let iter = recordings.into_iter();
        Self {
            all_raw: combine(iter.clone().map(|r| r.raw)),
            all_translated: combine(iter.clone().map(|r| r.translated)),
            all_video: combine(iter.clone().map(|r| r.video)),
            overall: combine(iter.map(|r| r.overall)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResultValue::{Fail, Null, Pass};

    #[test]
    fn test_fail_dominates() {
        assert_eq!(combine([Pass, Fail, Null]), Fail);
        assert_eq!(combine([Null, Null, Fail]), Fail);
        assert_eq!(combine([Fail]), Fail);
        assert_eq!(combine([Pass, Pass, Pass, Fail]), Fail);
    }

    #[test]
    fn test_null_dominates_pass() {
        assert_eq!(combine([Pass, Null]), Null);
        assert_eq!(combine([Null, Pass, Pass]), Null);
        assert_eq!(combine([Null]), Null);
    }

    #[test]
    fn test_all_pass() {
        assert_eq!(combine([Pass]), Pass);
        assert_eq!(combine(vec![Pass; 7]), Pass);
    }

    #[test]
    fn test_empty_is_null() {
        assert_eq!(combine(Vec::<ResultValue>::new()), Null);
    }

    #[test]
    fn test_combine_is_order_independent() {
        let values = [Pass, Null, Fail];
        for a in values {
            for b in values {
                for c in values {
                    assert_eq!(combine([a, b, c]), combine([c, b, a]));
                    assert_eq!(combine([a, b, c]), combine([b, a, c]));
                }
            }
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Pass.label(), "PASS");
        assert_eq!(Fail.label(), "FAIL");
        assert_eq!(Null.label(), "NULL");
        assert_eq!(Pass.to_string(), "PASS");
    }

    #[test]
    fn test_label_parse_rejects_unknown() {
        assert_eq!("FAIL".parse::<ResultValue>().unwrap(), Fail);
        let err = "BAD RESULT".parse::<ResultValue>().unwrap_err();
        assert!(matches!(err, ValidateError::UnknownResultLabel(_)));
    }

    #[test]
    fn test_recording_overall_ignores_unrequested_video() {
        let kinds = [ArtifactKind::Raw1553, ArtifactKind::Translated1553];
        let result = RecordingResult::from_kinds(Pass, Pass, Null, &kinds);
        assert_eq!(result.overall, Pass);
    }

    #[test]
    fn test_recording_fail_with_null_is_fail() {
        // Raw FAIL alongside a NULL translation must not be hidden as NULL.
        let kinds = ArtifactKind::ALL;
        let result = RecordingResult::from_kinds(Fail, Null, Pass, &kinds);
        assert_eq!(result.overall, Fail);
    }

    #[test]
    fn test_recording_missing_video_is_null() {
        let result = RecordingResult::from_kinds(Pass, Pass, Null, &ArtifactKind::ALL);
        assert_eq!(result.overall, Null);
    }

    #[test]
    fn test_run_rollup() {
        let kinds = [ArtifactKind::Raw1553, ArtifactKind::Translated1553];
        let passed = RecordingResult::from_kinds(Pass, Pass, Null, &kinds);
        let missing = RecordingResult::from_kinds(Pass, Null, Null, &kinds);

        let run = RunResult::from_recordings(&[passed, missing]);
        assert_eq!(run.overall, Null);
        assert_eq!(run.all_raw, Pass);
        assert_eq!(run.all_translated, Null);

        let failed = RecordingResult::from_kinds(Fail, Pass, Null, &kinds);
        let run = RunResult::from_recordings(&[passed, missing, failed]);
        assert_eq!(run.overall, Fail);
        assert_eq!(run.all_raw, Fail);
    }
}
