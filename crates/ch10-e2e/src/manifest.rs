//! Recording/ICD manifest and the artifact names derived from it.

use crate::artifact::ArtifactKind;
use crate::error::{Result, ValidateError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Recording file extensions stripped to form the base name.
const RECORDING_EXTENSIONS: [&str; 2] = ["ch10", "c10"];

/// One manifest row with its derived artifact names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordingEntry {
    /// Recording file name as listed in the manifest.
    pub recording: String,

    /// ICD file name used to translate this recording.
    pub icd: String,

    /// Recording name without its extension.
    pub base_name: String,

    pub raw_1553: String,
    pub translated_1553: String,
    pub raw_video: String,
}

impl RecordingEntry {
    pub fn new(recording: impl Into<String>, icd: impl Into<String>) -> Self {
        let recording = recording.into();
        let base_name = base_name(&recording);
        Self {
            raw_1553: format!("{base_name}_1553.parquet"),
            translated_1553: format!("{base_name}_1553_translated"),
            raw_video: format!("{base_name}_video.parquet"),
            recording,
            icd: icd.into(),
            base_name,
        }
    }

    /// Name of the artifact of `kind` produced for this recording.
    pub fn artifact_name(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Raw1553 => &self.raw_1553,
            ArtifactKind::Translated1553 => &self.translated_1553,
            ArtifactKind::RawVideo => &self.raw_video,
        }
    }
}

/// Strip a trailing `.ch10` / `.c10` extension (any case).
pub fn base_name(recording: &str) -> String {
    let recording = recording.trim();
    match recording.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && RECORDING_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            stem.to_string()
        }
        _ => recording.to_string(),
    }
}

/// Loaded manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub entries: Vec<RecordingEntry>,

    /// SHA-256 of the manifest contents.
    pub digest: String,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ValidateError::ManifestNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse `<recording>,<icd>` rows. Blank lines are ignored; extra
    /// fields after the ICD are ignored.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(',').map(str::trim);
            let recording = fields.next().unwrap_or_default();
            let icd = fields.next().unwrap_or_default();
            if recording.is_empty() || icd.is_empty() {
                return Err(ValidateError::ManifestParse {
                    line: idx + 1,
                    reason: format!("expected '<recording>,<icd>', got '{}'", line.trim()),
                });
            }
            entries.push(RecordingEntry::new(recording, icd));
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            digest: compute_digest(text.as_bytes()),
        })
    }
}

fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_strips_recording_extension() {
        assert_eq!(base_name("REC001.ch10"), "REC001");
        assert_eq!(base_name("REC001.Ch10"), "REC001");
        assert_eq!(base_name("flight.2024.c10"), "flight.2024");
        assert_eq!(base_name("notes.txt"), "notes.txt");
        assert_eq!(base_name(".ch10"), ".ch10");
    }

    #[test]
    fn test_derived_names() {
        let entry = RecordingEntry::new("REC001.ch10", "REC001.icd");
        assert_eq!(entry.base_name, "REC001");
        assert_eq!(entry.artifact_name(ArtifactKind::Raw1553), "REC001_1553.parquet");
        assert_eq!(
            entry.artifact_name(ArtifactKind::Translated1553),
            "REC001_1553_translated"
        );
        assert_eq!(entry.artifact_name(ArtifactKind::RawVideo), "REC001_video.parquet");
    }

    #[test]
    fn test_derived_names_deterministic() {
        let a = RecordingEntry::new("REC001.ch10", "a.icd");
        let b = RecordingEntry::new(a.recording.clone(), "a.icd");
        assert_eq!(a, b);
        assert_eq!(base_name(&a.base_name), a.base_name);
    }

    #[test]
    fn test_parse_rows() {
        let text = "REC001.ch10, REC001.icd\n\nREC002.ch10,shared.icd\n";
        let manifest = Manifest::parse(text, Path::new("ch10list.csv")).unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries[0].icd, "REC001.icd");
        assert_eq!(manifest.entries[1].recording, "REC002.ch10");
        assert_eq!(manifest.digest.len(), 64);
    }

    #[test]
    fn test_parse_rejects_short_row() {
        let err = Manifest::parse("REC001.ch10,a.icd\nREC002.ch10\n", Path::new("m.csv"))
            .unwrap_err();
        assert!(matches!(err, ValidateError::ManifestParse { line: 2, .. }));
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("ch10list.csv")).unwrap_err();
        assert!(matches!(err, ValidateError::ManifestNotFound(_)));
    }
}
