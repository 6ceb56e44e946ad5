//! In-process comparator for tests and dry runs.
//!
//! `BytesComparator` satisfies the [`Comparator`] contract without any
//! external tool: files are compared byte for byte, directories
//! recursively by entry name and content.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::compare::{Comparator, ComparatorVerdict};

/// Compares paths in-process and counts its invocations.
#[derive(Debug, Default)]
pub struct BytesComparator {
    calls: AtomicUsize,
}

impl BytesComparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `compare` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Comparator for BytesComparator {
    async fn compare(&self, truth: &Path, test: &Path) -> ComparatorVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match first_difference(truth, test) {
            Ok(None) => ComparatorVerdict::Identical,
            Ok(Some(detail)) => ComparatorVerdict::Different { detail },
            Err(e) => ComparatorVerdict::Error {
                detail: e.to_string(),
            },
        }
    }

    fn name(&self) -> &str {
        "bytes"
    }
}

fn first_difference(truth: &Path, test: &Path) -> io::Result<Option<String>> {
    if truth.is_dir() != test.is_dir() {
        return Ok(Some(format!("{} differs in type", test.display())));
    }

    if !truth.is_dir() {
        if std::fs::read(truth)? != std::fs::read(test)? {
            return Ok(Some(format!("{} differs", test.display())));
        }
        return Ok(None);
    }

    let names = |dir: &Path| -> io::Result<Vec<_>> {
        let mut names = std::fs::read_dir(dir)?
            .map(|e| e.map(|e| e.file_name()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    };

    let truth_names = names(truth)?;
    if truth_names != names(test)? {
        return Ok(Some(format!("{} has different entries", test.display())));
    }
    for name in truth_names {
        if let Some(detail) = first_difference(&truth.join(&name), &test.join(&name))? {
            return Ok(Some(detail));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_directories_compared_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(a.join("nested")).unwrap();
        fs::create_dir_all(b.join("nested")).unwrap();
        fs::write(a.join("nested/part-0.parquet"), b"1").unwrap();
        fs::write(b.join("nested/part-0.parquet"), b"1").unwrap();

        let cmp = BytesComparator::new();
        assert_eq!(cmp.compare(&a, &b).await, ComparatorVerdict::Identical);

        fs::write(b.join("nested/part-0.parquet"), b"2").unwrap();
        assert!(matches!(
            cmp.compare(&a, &b).await,
            ComparatorVerdict::Different { .. }
        ));

        fs::write(b.join("extra"), b"").unwrap();
        assert!(matches!(
            cmp.compare(&a, &b).await,
            ComparatorVerdict::Different { .. }
        ));
        assert_eq!(cmp.calls(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, b"x").unwrap();
        let verdict = BytesComparator::new()
            .compare(&a, &dir.path().join("gone"))
            .await;
        assert!(matches!(verdict, ComparatorVerdict::Error { .. }));
    }
}
