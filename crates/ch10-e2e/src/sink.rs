//! Line-oriented report destinations.
//!
//! Comparison adapters and the report renderer only ever see a
//! [`LogSink`]; whether a line lands on the console, in the log file or
//! both is decided by whoever builds the sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Write-only destination for report lines.
pub trait LogSink {
    fn write_line(&mut self, line: &str);
}

/// Writes lines to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write_line(&mut self, line: &str) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = writeln!(lock, "{line}") {
            warn!(error = %e, "Failed to write report line to stdout");
        }
    }
}

/// Writes lines to a log file. Flushed and closed on drop.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create (truncate) the log file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.writer, "{line}") {
            warn!(path = %self.path.display(), error = %e, "Failed to write log line");
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(path = %self.path.display(), error = %e, "Failed to flush log file");
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Writes each line to two sinks.
pub struct FanOut<'a> {
    first: &'a mut dyn LogSink,
    second: &'a mut dyn LogSink,
}

impl<'a> FanOut<'a> {
    pub fn new(first: &'a mut dyn LogSink, second: &'a mut dyn LogSink) -> Self {
        Self { first, second }
    }
}

impl LogSink for FanOut<'_> {
    fn write_line(&mut self, line: &str) {
        self.first.write_line(line);
        self.second.write_line(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_writes_both() {
        let mut a = MemorySink::new();
        let mut b = MemorySink::new();
        {
            let mut both = FanOut::new(&mut a, &mut b);
            both.write_line("Total Ch10 result: PASS");
        }
        assert_eq!(a.lines, vec!["Total Ch10 result: PASS"]);
        assert_eq!(a.lines, b.lines);
    }

    #[test]
    fn test_file_sink_flushes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e.txt");
        {
            let mut sink = FileSink::create(&path).unwrap();
            sink.write_line("first");
            sink.write_line("second");
            assert_eq!(sink.path(), path.as_path());
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }
}
