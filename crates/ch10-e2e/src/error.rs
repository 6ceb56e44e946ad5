//! Error types for validation runs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Malformed manifest row {line}: {reason}")]
    ManifestParse { line: usize, reason: String },

    #[error("Invalid artifact kind: {0}")]
    InvalidKind(String),

    #[error("Unknown result label: {0}")]
    UnknownResultLabel(String),

    #[error("Command has no executable: {0}")]
    EmptyCommand(String),

    #[error("Command {command} timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("Pipeline output for {recording} has no '{sentinel}' payload")]
    SentinelAbsent { recording: String, sentinel: String },

    #[error("Failed to run pipeline for {recording}: {source}")]
    PipelineSpawn {
        recording: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unusable pipeline payload for {recording}: {source}")]
    Payload {
        recording: String,
        #[source]
        source: PayloadError,
    },

    #[error("Payload for {recording} has {count} keys, expected exactly one")]
    PayloadKeyCount { recording: String, count: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a timing payload could not be read.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("not a mapping: {0}")]
    Shape(String),
}

/// Result type for validation operations
pub type Result<T> = std::result::Result<T, ValidateError>;
