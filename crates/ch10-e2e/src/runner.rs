//! External command execution and stdout payload extraction.

use crate::error::{PayloadError, Result, ValidateError};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

/// A command to run.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program followed by its arguments.
    pub argv: Vec<String>,

    /// Working directory; inherits the current one when `None`.
    pub cwd: Option<PathBuf>,

    /// Timeout in seconds, 0 waits indefinitely.
    pub timeout_secs: u64,
}

impl CommandSpec {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            cwd: None,
            timeout_secs: 0,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Space-joined command line, for logging.
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, -1 when the process was killed by a signal.
    pub exit_code: i32,

    pub stdout: String,
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands.
pub struct SubprocessRunner;

impl SubprocessRunner {
    /// Run a command to completion and capture its output.
    ///
    /// A non-zero exit is reported in [`CommandOutput::exit_code`], not as an
    /// error. Spawn failures and timeouts are errors.
    pub async fn run(spec: &CommandSpec) -> Result<CommandOutput> {
        let start = Instant::now();

        let (exe, args) = spec
            .argv
            .split_first()
            .ok_or_else(|| ValidateError::EmptyCommand(spec.display()))?;

        let mut command = Command::new(exe);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        debug!(command = %spec.display(), "Spawning command");
        let child = command.spawn()?;

        let output = if spec.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(spec.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ValidateError::Timeout {
                command: spec.display(),
                timeout_secs: spec.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Extract the mapping that follows `sentinel` in `stdout`.
///
/// Returns `Ok(None)` when the sentinel never appears. The payload starts
/// after the first occurrence of the sentinel and one separator character
/// and runs to the end of the stream.
pub fn extract_payload(
    stdout: &str,
    sentinel: &str,
) -> std::result::Result<Option<Map<String, Value>>, PayloadError> {
    let Some(idx) = stdout.find(sentinel) else {
        return Ok(None);
    };

    let mut body = &stdout[idx + sentinel.len()..];
    if let Some(rest) = body.strip_prefix("\r\n") {
        body = rest;
    } else if let Some(first) = body.chars().next() {
        if first.is_whitespace() {
            body = &body[first.len_utf8()..];
        }
    }

    match serde_json::from_str::<Value>(body.trim()).map_err(PayloadError::Parse)? {
        Value::Object(map) => Ok(Some(map)),
        other => Err(PayloadError::Shape(other.to_string())),
    }
}
