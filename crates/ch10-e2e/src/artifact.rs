//! Artifact kinds and structural classification of artifact paths.
//!
//! Each [`ArtifactKind`] has one entry in a rule table: the pattern its
//! location must match, the filesystem shape it must have, and (for
//! directory kinds) which members of the directory take part in a
//! comparison. Adding a kind is a table edit.

use crate::error::{Result, ValidateError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// Category of pipeline output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Raw decoded 1553 bus data.
    #[serde(rename = "raw1553")]
    Raw1553,

    /// Per-message translated 1553 data.
    #[serde(rename = "transl1553")]
    Translated1553,

    /// Raw video data.
    #[serde(rename = "rawvideo")]
    RawVideo,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Raw1553,
        ArtifactKind::Translated1553,
        ArtifactKind::RawVideo,
    ];

    /// Short label used in manifests and configuration.
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Raw1553 => "raw1553",
            ArtifactKind::Translated1553 => "transl1553",
            ArtifactKind::RawVideo => "rawvideo",
        }
    }

    /// Human-readable name used in the report.
    pub fn title(&self) -> &'static str {
        match self {
            ArtifactKind::Raw1553 => "Raw 1553",
            ArtifactKind::Translated1553 => "Translated 1553",
            ArtifactKind::RawVideo => "Raw Video",
        }
    }

    /// Rule table entry for this kind.
    pub fn rule(&self) -> &'static KindRule {
        &RULES[self.index()]
    }

    fn index(&self) -> usize {
        match self {
            ArtifactKind::Raw1553 => 0,
            ArtifactKind::Translated1553 => 1,
            ArtifactKind::RawVideo => 2,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ArtifactKind {
    type Err = ValidateError;

    fn from_str(s: &str) -> Result<Self> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| ValidateError::InvalidKind(s.to_string()))
    }
}

/// Filesystem object an artifact location must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape {
    /// Not used by the current table; available to file-only kinds.
    File,
    Directory,
    /// Either, as long as truth and test agree.
    FileOrDirectory,
}

impl fmt::Display for PathShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathShape::File => f.write_str("a file"),
            PathShape::Directory => f.write_str("a directory"),
            PathShape::FileOrDirectory => f.write_str("a file or directory"),
        }
    }
}

/// Classification rule for one artifact kind.
#[derive(Debug)]
pub struct KindRule {
    pub kind: ArtifactKind,

    /// Regex the full location path must match.
    pub location_pattern: &'static str,

    pub shape: PathShape,

    /// Regex a directory member's name must match to be compared.
    /// `None` compares every member.
    pub member_pattern: Option<&'static str>,
}

static RULES: [KindRule; 3] = [
    KindRule {
        kind: ArtifactKind::Raw1553,
        location_pattern: r".+_1553\.parquet$",
        shape: PathShape::FileOrDirectory,
        member_pattern: None,
    },
    KindRule {
        kind: ArtifactKind::Translated1553,
        location_pattern: r".+_1553_translated$",
        shape: PathShape::Directory,
        member_pattern: Some(r".+_1553_translated_.+\.parquet$"),
    },
    KindRule {
        kind: ArtifactKind::RawVideo,
        location_pattern: r".+_video\.parquet$",
        shape: PathShape::Directory,
        member_pattern: None,
    },
];

struct CompiledRule {
    location: Regex,
    member: Option<Regex>,
}

fn compiled(kind: ArtifactKind) -> &'static CompiledRule {
    static COMPILED: OnceLock<Vec<CompiledRule>> = OnceLock::new();
    let table = COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|rule| CompiledRule {
                location: Regex::new(rule.location_pattern).expect("static location pattern"),
                member: rule
                    .member_pattern
                    .map(|p| Regex::new(p).expect("static member pattern")),
            })
            .collect()
    });
    &table[kind.index()]
}

/// What a path looks like with respect to one artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub exists: bool,
    pub is_directory: bool,
    pub matches_kind_pattern: bool,
}

impl Classification {
    fn satisfies(&self, shape: PathShape) -> bool {
        match shape {
            PathShape::File => self.exists && !self.is_directory,
            PathShape::Directory => self.is_directory,
            PathShape::FileOrDirectory => self.exists,
        }
    }
}

/// Classify `path` against the rule for `kind`.
///
/// The pattern is matched against the whole path string, so callers should
/// pass fully qualified paths.
pub fn classify(path: &Path, kind: ArtifactKind) -> Classification {
    let text = path.to_string_lossy();
    Classification {
        exists: path.exists(),
        is_directory: path.is_dir(),
        matches_kind_pattern: compiled(kind).location.is_match(&text),
    }
}

/// Which half of a truth/test pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Truth,
    Test,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Truth => f.write_str("truth"),
            Side::Test => f.write_str("test"),
        }
    }
}

/// Why a pair was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairFailureReason {
    /// No path was supplied.
    MissingPath,
    DoesNotExist,
    WrongShape { expected: PathShape },
    WrongPattern,
    /// Truth and test are different filesystem objects.
    ShapeMismatch,
}

/// A rejected pair, naming the failing side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFailure {
    pub kind: ArtifactKind,
    pub side: Side,
    pub path: Option<PathBuf>,
    pub reason: PairFailureReason,
}

impl fmt::Display for PairFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());
        match &self.reason {
            PairFailureReason::MissingPath => write!(f, "{} path is not set", self.side),
            PairFailureReason::DoesNotExist => {
                write!(f, "{} path {} does not exist", self.side, path)
            }
            PairFailureReason::WrongShape { expected } => {
                write!(f, "{} path {} is not {}", self.side, path, expected)
            }
            PairFailureReason::WrongPattern => write!(
                f,
                "{} path {} is not a {} location",
                self.side,
                path,
                self.kind.title()
            ),
            PairFailureReason::ShapeMismatch => write!(
                f,
                "{} path {} is not the same kind of filesystem object as the truth path",
                self.side, path
            ),
        }
    }
}

fn check_side(
    path: Option<&Path>,
    side: Side,
    kind: ArtifactKind,
) -> std::result::Result<Classification, PairFailure> {
    let fail = |reason| PairFailure {
        kind,
        side,
        path: path.map(Path::to_path_buf),
        reason,
    };

    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Err(fail(PairFailureReason::MissingPath)),
    };

    let class = classify(path, kind);
    let shape = kind.rule().shape;
    if !class.matches_kind_pattern {
        return Err(fail(PairFailureReason::WrongPattern));
    }
    if !class.exists {
        return Err(fail(PairFailureReason::DoesNotExist));
    }
    if !class.satisfies(shape) {
        return Err(fail(PairFailureReason::WrongShape { expected: shape }));
    }
    Ok(class)
}

/// Check that a truth/test pair is a valid location of `kind`.
///
/// The truth side is checked first; the first failure is returned.
pub fn validate_pair(
    truth: Option<&Path>,
    test: Option<&Path>,
    kind: ArtifactKind,
) -> std::result::Result<(), PairFailure> {
    let truth_class = check_side(truth, Side::Truth, kind)?;
    let test_class = check_side(test, Side::Test, kind)?;

    if truth_class.is_directory != test_class.is_directory {
        return Err(PairFailure {
            kind,
            side: Side::Test,
            path: test.map(Path::to_path_buf),
            reason: PairFailureReason::ShapeMismatch,
        });
    }
    Ok(())
}

/// A truth/test location pair with cached existence flags.
#[derive(Debug, Clone, Default)]
pub struct ArtifactLocation {
    pub truth_path: Option<PathBuf>,
    pub test_path: Option<PathBuf>,
    truth_exists: Option<bool>,
    test_exists: Option<bool>,
}

impl ArtifactLocation {
    pub fn new(truth_path: Option<PathBuf>, test_path: Option<PathBuf>) -> Self {
        Self {
            truth_path,
            test_path,
            truth_exists: None,
            test_exists: None,
        }
    }

    /// Validate the pair, recording existence of each side.
    ///
    /// Existence flags are set on the first check and kept afterwards.
    pub fn check(&mut self, kind: ArtifactKind) -> std::result::Result<(), PairFailure> {
        let exists = |p: &Option<PathBuf>| p.as_deref().map(Path::exists).unwrap_or(false);
        if self.truth_exists.is_none() {
            self.truth_exists = Some(exists(&self.truth_path));
        }
        if self.test_exists.is_none() {
            self.test_exists = Some(exists(&self.test_path));
        }
        validate_pair(self.truth_path.as_deref(), self.test_path.as_deref(), kind)
    }

    /// `None` until [`check`](Self::check) has run.
    pub fn truth_exists(&self) -> Option<bool> {
        self.truth_exists
    }

    pub fn test_exists(&self) -> Option<bool> {
        self.test_exists
    }
}

/// Names of the comparable members of an artifact directory, sorted.
pub fn list_members(dir: &Path, kind: ArtifactKind) -> Result<BTreeSet<String>> {
    let member = compiled(kind).member.as_ref();
    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if member.map(|re| re.is_match(&name)).unwrap_or(true) {
            names.insert(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_kind_labels_round_trip() {
        for kind in ArtifactKind::ALL {
            assert_eq!(kind.label().parse::<ArtifactKind>().unwrap(), kind);
            assert_eq!(kind.rule().kind, kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let err = "raw429".parse::<ArtifactKind>().unwrap_err();
        assert!(matches!(err, ValidateError::InvalidKind(ref s) if s == "raw429"));
    }

    #[test]
    fn test_classify_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("REC001_1553.parquet");
        fs::create_dir(&raw).unwrap();

        let class = classify(&raw, ArtifactKind::Raw1553);
        assert!(class.exists);
        assert!(class.is_directory);
        assert!(class.matches_kind_pattern);

        let class = classify(&raw, ArtifactKind::RawVideo);
        assert!(!class.matches_kind_pattern);

        let transl = dir.path().join("REC001_1553_translated");
        let class = classify(&transl, ArtifactKind::Translated1553);
        assert!(!class.exists);
        assert!(class.matches_kind_pattern);
    }

    #[test]
    fn test_pattern_uses_full_path() {
        // The suffix must end the path, not appear in a parent component.
        let path = Path::new("/data/REC001_video.parquet/part-0.parquet");
        assert!(!classify(path, ArtifactKind::RawVideo).matches_kind_pattern);
    }

    #[test]
    fn test_validate_pair_reports_side_and_reason() {
        let truth = tempfile::tempdir().unwrap();
        let test = tempfile::tempdir().unwrap();
        let truth_dir = truth.path().join("REC001_1553_translated");
        let test_dir = test.path().join("REC001_1553_translated");
        fs::create_dir(&truth_dir).unwrap();

        let err = validate_pair(Some(&truth_dir), Some(&test_dir), ArtifactKind::Translated1553)
            .unwrap_err();
        assert_eq!(err.side, Side::Test);
        assert_eq!(err.reason, PairFailureReason::DoesNotExist);

        let err = validate_pair(None, Some(&test_dir), ArtifactKind::Translated1553).unwrap_err();
        assert_eq!(err.side, Side::Truth);
        assert_eq!(err.reason, PairFailureReason::MissingPath);

        fs::create_dir(&test_dir).unwrap();
        assert!(validate_pair(Some(&truth_dir), Some(&test_dir), ArtifactKind::Translated1553)
            .is_ok());

        let err = validate_pair(Some(&truth_dir), Some(&test_dir), ArtifactKind::RawVideo)
            .unwrap_err();
        assert_eq!(err.reason, PairFailureReason::WrongPattern);
    }

    #[test]
    fn test_file_shape_excludes_directories() {
        let file = Classification {
            exists: true,
            is_directory: false,
            matches_kind_pattern: true,
        };
        let dir = Classification {
            is_directory: true,
            ..file
        };
        assert!(file.satisfies(PathShape::File));
        assert!(!dir.satisfies(PathShape::File));
        assert!(dir.satisfies(PathShape::FileOrDirectory));
    }

    #[test]
    fn test_validate_pair_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let truth = dir.path().join("truth_video.parquet");
        let test = dir.path().join("test_video.parquet");
        fs::write(&truth, b"not a dir").unwrap();
        fs::create_dir(&test).unwrap();

        let err = validate_pair(Some(&truth), Some(&test), ArtifactKind::RawVideo).unwrap_err();
        assert_eq!(err.side, Side::Truth);
        assert_eq!(
            err.reason,
            PairFailureReason::WrongShape {
                expected: PathShape::Directory
            }
        );
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_raw_pair_shapes_must_agree() {
        let dir = tempfile::tempdir().unwrap();
        let truth = dir.path().join("a_1553.parquet");
        let test = dir.path().join("b_1553.parquet");
        fs::write(&truth, b"bytes").unwrap();
        fs::create_dir(&test).unwrap();

        let err = validate_pair(Some(&truth), Some(&test), ArtifactKind::Raw1553).unwrap_err();
        assert_eq!(err.reason, PairFailureReason::ShapeMismatch);

        fs::remove_dir(&test).unwrap();
        fs::write(&test, b"bytes").unwrap();
        assert!(validate_pair(Some(&truth), Some(&test), ArtifactKind::Raw1553).is_ok());
    }

    #[test]
    fn test_location_flags_are_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let truth = dir.path().join("t_video.parquet");
        let test = dir.path().join("x_video.parquet");
        fs::create_dir(&truth).unwrap();

        let mut location = ArtifactLocation::new(Some(truth), Some(test.clone()));
        assert_eq!(location.truth_exists(), None);
        assert!(location.check(ArtifactKind::RawVideo).is_err());
        assert_eq!(location.truth_exists(), Some(true));
        assert_eq!(location.test_exists(), Some(false));

        fs::create_dir(&test).unwrap();
        assert!(location.check(ArtifactKind::RawVideo).is_ok());
        assert_eq!(location.test_exists(), Some(false));
    }

    #[test]
    fn test_list_members_filters_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("R_1553_translated_MSG1.parquet")).unwrap();
        fs::create_dir(dir.path().join("R_1553_translated_MSG2.parquet")).unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let names = list_members(dir.path(), ArtifactKind::Translated1553).unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("R_1553_translated_MSG1.parquet"));

        let names = list_members(dir.path(), ArtifactKind::RawVideo).unwrap();
        assert_eq!(names.len(), 3);
    }
}
