//! Validator configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields a usable configuration rooted at the current directory.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default manifest file name inside the truth directory.
pub const DEFAULT_MANIFEST_NAME: &str = "ch10list.csv";

/// Token that precedes the timing payload in pipeline stdout.
pub const DEFAULT_SENTINEL: &str = "json:";

const DIRECTORY_COMPARATOR: &str = "pqcompare";
const BYTES_COMPARATOR: &str = "bincompare";
const PIPELINE_SCRIPT: &str = "parse_and_translate.py";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Installation root holding `bin/` and the pipeline script.
    pub tool_root: PathBuf,

    /// Pipeline command prefix; recording arguments are appended.
    /// Empty means `python <tool_root>/parse_and_translate.py`.
    pub pipeline: Vec<String>,

    /// Overrides `<tool_root>/bin/pqcompare`.
    pub directory_comparator: Option<PathBuf>,

    /// Overrides `<tool_root>/bin/bincompare`.
    pub bytes_comparator: Option<PathBuf>,

    pub manifest_name: String,

    pub sentinel: String,

    /// 0 waits indefinitely.
    pub pipeline_timeout_secs: u64,

    /// 0 waits indefinitely.
    pub comparator_timeout_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tool_root: PathBuf::from("."),
            pipeline: Vec::new(),
            directory_comparator: None,
            bytes_comparator: None,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            pipeline_timeout_secs: 0,
            comparator_timeout_secs: 0,
        }
    }
}

impl ValidatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Pipeline command prefix.
    pub fn pipeline_command(&self) -> Vec<String> {
        if !self.pipeline.is_empty() {
            return self.pipeline.clone();
        }
        vec![
            "python".to_string(),
            self.tool_root.join(PIPELINE_SCRIPT).display().to_string(),
        ]
    }

    pub fn directory_comparator_path(&self) -> PathBuf {
        self.directory_comparator
            .clone()
            .unwrap_or_else(|| self.bin_path(DIRECTORY_COMPARATOR))
    }

    pub fn bytes_comparator_path(&self) -> PathBuf {
        self.bytes_comparator
            .clone()
            .unwrap_or_else(|| self.bin_path(BYTES_COMPARATOR))
    }

    fn bin_path(&self, tool: &str) -> PathBuf {
        let name = if cfg!(windows) {
            format!("{tool}.exe")
        } else {
            tool.to_string()
        };
        self.tool_root.join("bin").join(name)
    }
}
