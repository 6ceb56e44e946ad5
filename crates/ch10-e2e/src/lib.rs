//! Ch10 end-to-end validation
//!
//! Checks a freshly generated test set of pipeline outputs against a
//! known-good truth set:
//! - Regenerates the test set by running the parse/translate pipeline
//! - Classifies and compares raw 1553, translated 1553 and raw video outputs
//! - Aggregates PASS/FAIL/NULL results per kind, per recording and per run

pub mod artifact;
pub mod compare;
pub mod config;
pub mod error;
pub mod fakes;
pub mod manifest;
pub mod orchestrator;
pub mod regen;
pub mod report;
pub mod result;
pub mod runner;
pub mod sink;
pub mod telemetry;

// Re-export key types
pub use artifact::{classify, validate_pair, ArtifactKind, ArtifactLocation, PairFailure, Side};
pub use compare::{
    Comparator, ComparatorSet, ComparatorVerdict, ComparisonAdapter, ExternalComparator,
};
pub use config::ValidatorConfig;
pub use error::{PayloadError, Result, ValidateError};
pub use manifest::{Manifest, RecordingEntry};
pub use orchestrator::{RunOptions, ValidationOrchestrator, ValidationReport};
pub use regen::{DurationRecord, RegenerationCoordinator};
pub use result::{combine, RecordingResult, ResultValue, RunResult};
pub use runner::{extract_payload, CommandOutput, CommandSpec, SubprocessRunner};
pub use sink::{ConsoleSink, FileSink, LogSink, MemorySink};
pub use telemetry::init_tracing;
