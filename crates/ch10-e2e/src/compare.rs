//! Comparison adapters: one per artifact kind and recording.
//!
//! An adapter owns a truth/test [`ArtifactLocation`], validates it with the
//! classifier and, when valid, hands the pair to a [`Comparator`]. An
//! invalid location yields `Null` without invoking any comparator.

use crate::artifact::{list_members, ArtifactKind, ArtifactLocation, PairFailure, PathShape};
use crate::result::{combine, ResultValue};
use crate::runner::{CommandSpec, SubprocessRunner};
use crate::sink::LogSink;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Verdict of a single comparator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparatorVerdict {
    Identical,
    Different { detail: String },
    /// The comparator crashed, timed out or exited unexpectedly.
    Error { detail: String },
}

impl ComparatorVerdict {
    pub fn result(&self) -> ResultValue {
        ResultValue::from_passed(matches!(self, ComparatorVerdict::Identical))
    }
}

impl fmt::Display for ComparatorVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparatorVerdict::Identical => f.write_str("identical"),
            ComparatorVerdict::Different { detail } => write!(f, "different ({detail})"),
            ComparatorVerdict::Error { detail } => write!(f, "comparator error ({detail})"),
        }
    }
}

/// Compares one truth path with one test path.
#[async_trait]
pub trait Comparator: Send + Sync {
    async fn compare(&self, truth: &Path, test: &Path) -> ComparatorVerdict;

    fn name(&self) -> &str;
}

/// Comparator backed by an external executable invoked as `<exe> <truth> <test>`.
///
/// Exit 0 means identical, exit 1 means differences were found; anything
/// else is a comparator error.
#[derive(Debug, Clone)]
pub struct ExternalComparator {
    name: String,
    executable: PathBuf,
    timeout_secs: u64,
}

impl ExternalComparator {
    pub fn new(executable: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        let executable = executable.into();
        let name = executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| executable.display().to_string());
        Self {
            name,
            executable,
            timeout_secs,
        }
    }
}

#[async_trait]
impl Comparator for ExternalComparator {
    async fn compare(&self, truth: &Path, test: &Path) -> ComparatorVerdict {
        let spec = CommandSpec::new(vec![
            self.executable.display().to_string(),
            truth.display().to_string(),
            test.display().to_string(),
        ])
        .with_timeout(self.timeout_secs);

        match SubprocessRunner::run(&spec).await {
            Ok(output) => match output.exit_code {
                0 => ComparatorVerdict::Identical,
                1 => ComparatorVerdict::Different {
                    detail: last_line(&output.stdout)
                        .unwrap_or("comparator reported differences")
                        .to_string(),
                },
                code => ComparatorVerdict::Error {
                    detail: format!(
                        "{} exited with code {}: {}",
                        self.name,
                        code,
                        last_line(&output.stderr).unwrap_or("")
                    ),
                },
            },
            Err(e) => ComparatorVerdict::Error {
                detail: e.to_string(),
            },
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn existence(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unchecked",
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

/// The comparators available to adapters.
#[derive(Clone)]
pub struct ComparatorSet {
    /// Structure-aware comparator, used for directory-shaped artifacts.
    pub directory: Arc<dyn Comparator>,

    /// Byte-level comparator, used for plain files.
    pub bytes: Arc<dyn Comparator>,
}

impl ComparatorSet {
    pub fn new(directory: Arc<dyn Comparator>, bytes: Arc<dyn Comparator>) -> Self {
        Self { directory, bytes }
    }

    fn for_path(&self, path: &Path) -> &dyn Comparator {
        if path.is_dir() {
            self.directory.as_ref()
        } else {
            self.bytes.as_ref()
        }
    }
}

#[derive(Debug, Clone)]
enum Readiness {
    Unprepared,
    Ready,
    Rejected(PairFailure),
}

/// Validates one artifact kind of one recording.
pub struct ComparisonAdapter {
    kind: ArtifactKind,
    location: ArtifactLocation,
    comparators: ComparatorSet,
    readiness: Readiness,
    result: ResultValue,
}

impl ComparisonAdapter {
    pub fn new(kind: ArtifactKind, location: ArtifactLocation, comparators: ComparatorSet) -> Self {
        Self {
            kind,
            location,
            comparators,
            readiness: Readiness::Unprepared,
            result: ResultValue::Null,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }

    /// Validate the location. Returns `true` when a comparison can run.
    ///
    /// A rejected location fixes the result at `Null`.
    pub fn prepare(&mut self) -> bool {
        match self.location.check(self.kind) {
            Ok(()) => {
                self.readiness = Readiness::Ready;
                true
            }
            Err(failure) => {
                debug!(kind = %self.kind, reason = %failure, "Artifact location rejected");
                self.readiness = Readiness::Rejected(failure);
                self.result = ResultValue::Null;
                false
            }
        }
    }

    /// Why the location was rejected, if it was.
    pub fn rejection(&self) -> Option<&PairFailure> {
        match &self.readiness {
            Readiness::Rejected(failure) => Some(failure),
            _ => None,
        }
    }

    /// Last computed result; `Null` before [`validate`](Self::validate).
    pub fn result(&self) -> ResultValue {
        self.result
    }

    /// Run the comparison and write a summary to `sink`.
    ///
    /// Prepares the adapter first if needed. Each call re-runs the comparator.
    pub async fn validate(&mut self, sink: &mut dyn LogSink) -> ResultValue {
        if matches!(self.readiness, Readiness::Unprepared) {
            self.prepare();
        }

        sink.write_line(&format!(
            "truth exists: {}, test exists: {}",
            existence(self.location.truth_exists()),
            existence(self.location.test_exists())
        ));

        if let Readiness::Rejected(failure) = &self.readiness {
            sink.write_line(&format!("{}: not compared, {}", self.kind.title(), failure));
            self.result = ResultValue::Null;
            return self.result;
        }

        let (Some(truth), Some(test)) = (
            self.location.truth_path.clone(),
            self.location.test_path.clone(),
        ) else {
            // `prepare` rejects pairs with a missing side.
            self.result = ResultValue::Null;
            return self.result;
        };

        sink.write_line(&format!("truth: {}", truth.display()));
        sink.write_line(&format!("test: {}", test.display()));

        self.result = match self.kind.rule().shape {
            PathShape::Directory => self.compare_members(&truth, &test, sink).await,
            PathShape::File | PathShape::FileOrDirectory => {
                let comparator = self.comparators.for_path(&truth);
                let verdict = comparator.compare(&truth, &test).await;
                sink.write_line(&format!("{}: {}", comparator.name(), verdict));
                verdict.result()
            }
        };

        sink.write_line(&format!("{}: {}", self.kind.title(), self.result));
        self.result
    }

    /// Compare the member sets of two artifact directories, then each
    /// member present on both sides.
    async fn compare_members(
        &self,
        truth: &Path,
        test: &Path,
        sink: &mut dyn LogSink,
    ) -> ResultValue {
        let (truth_names, test_names) =
            match (list_members(truth, self.kind), list_members(test, self.kind)) {
                (Ok(a), Ok(b)) => (a, b),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(kind = %self.kind, error = %e, "Failed to list artifact directory");
                    sink.write_line(&format!("failed to list artifact directory: {e}"));
                    return ResultValue::Fail;
                }
            };

        let mut results = Vec::new();

        for name in truth_names.difference(&test_names) {
            sink.write_line(&format!("{name}: missing from test set"));
            results.push(ResultValue::Fail);
        }
        for name in test_names.difference(&truth_names) {
            sink.write_line(&format!("{name}: not present in truth set"));
            results.push(ResultValue::Fail);
        }

        for name in truth_names.intersection(&test_names) {
            let truth_member = truth.join(name);
            let test_member = test.join(name);
            if truth_member.is_dir() != test_member.is_dir() {
                sink.write_line(&format!("{name}: file/directory mismatch"));
                results.push(ResultValue::Fail);
                continue;
            }
            let verdict = self
                .comparators
                .for_path(&truth_member)
                .compare(&truth_member, &test_member)
                .await;
            sink.write_line(&format!("{name}: {verdict}"));
            results.push(verdict.result());
        }

        sink.write_line(&format!(
            "{} truth members, {} test members",
            truth_names.len(),
            test_names.len()
        ));
        // Two empty directories agree.
        combine(results.into_iter().chain([ResultValue::Pass]))
    }
}
