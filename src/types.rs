//! Core types for mobile-pkg-renamer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Package container kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Android package (`.apk`)
    Android,
    /// Apple application archive (`.ipa`)
    Apple,
    /// Neither; never analyzed
    Unknown,
}

impl PackageKind {
    /// Classify by file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("apk") {
            PackageKind::Android
        } else if ext.eq_ignore_ascii_case("ipa") {
            PackageKind::Apple
        } else {
            PackageKind::Unknown
        }
    }

    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(PackageKind::Unknown)
    }

    /// Canonical extension, without the dot
    pub fn extension(self) -> Option<&'static str> {
        match self {
            PackageKind::Android => Some("apk"),
            PackageKind::Apple => Some("ipa"),
            PackageKind::Unknown => None,
        }
    }
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PackageKind::Android => "android",
            PackageKind::Apple => "apple",
            PackageKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A package file found by the scan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    /// Path at analysis time
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
    /// Detected kind (extension, corrected by sniffing archive contents)
    pub kind: PackageKind,
}

impl PackageFile {
    /// Create a package file record
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, kind: PackageKind) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            kind,
        }
    }

    /// File name as a string (lossy)
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File stem as a string (lossy)
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ordinal trust score for an extraction result (0 = no data)
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Confidence(pub u8);

impl Confidence {
    /// No usable data
    pub const NONE: Confidence = Confidence(0);

    /// Get the inner value
    pub fn get(self) -> u8 {
        self.0
    }

    /// True when the score is zero
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Reporting tier
    pub fn tier(self) -> ConfidenceTier {
        match self.0 {
            0 => ConfidenceTier::Low,
            1 | 2 => ConfidenceTier::Medium,
            _ => ConfidenceTier::High,
        }
    }
}

impl From<u8> for Confidence {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confidence bucket used in batch summaries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// 3 and above
    High,
    /// 1 or 2
    Medium,
    /// 0
    Low,
}

/// Metadata extraction method, in the order they are tried per kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// `aapt dump badging`
    Badging,
    /// `aapt dump resources`
    ResourceDump,
    /// `aapt dump xmltree ... AndroidManifest.xml`
    ManifestXmltree,
    /// Decoded main Info.plist
    InfoPlist,
    /// `plutil -p` on the main Info.plist
    PlistDump,
    /// A secondary Info.plist inside the payload
    AlternateInfoPlist,
}

impl ExtractionMethod {
    /// Stable name for logs and reports
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMethod::Badging => "badging",
            ExtractionMethod::ResourceDump => "resource_dump",
            ExtractionMethod::ManifestXmltree => "manifest_xmltree",
            ExtractionMethod::InfoPlist => "info_plist",
            ExtractionMethod::PlistDump => "plist_dump",
            ExtractionMethod::AlternateInfoPlist => "alternate_info_plist",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One method's answer for one file
///
/// Absent values are empty strings. `error` carries a note when the method
/// failed or timed out; such candidates have zero confidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    /// Method that produced this candidate
    pub method: ExtractionMethod,
    /// Human-readable display name
    pub label: String,
    /// Package identifier (Android package name or bundle identifier)
    pub package_id: String,
    /// Version string
    pub version: String,
    /// Trust score
    pub confidence: Confidence,
    /// Failure note, if the method failed
    pub error: Option<String>,
}

impl ExtractionCandidate {
    /// A candidate with no data and no error
    pub fn empty(method: ExtractionMethod) -> Self {
        Self {
            method,
            label: String::new(),
            package_id: String::new(),
            version: String::new(),
            confidence: Confidence::NONE,
            error: None,
        }
    }

    /// A zero-confidence candidate recording why the method failed
    pub fn failed(method: ExtractionMethod, error: impl std::fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::empty(method)
        }
    }

    /// True when a non-empty label was found
    pub fn has_label(&self) -> bool {
        !self.label.is_empty()
    }
}

/// Whether a file can proceed to renaming
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Final confidence above zero
    Valid,
    /// No method produced usable data
    Invalid,
}

/// Accumulated analysis for a single file
///
/// `candidates` keeps trial order. The final fields are re-derived by the
/// arbiter on every [`push`](Self::push).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analyzed file
    pub file: PackageFile,
    candidates: Vec<ExtractionCandidate>,
    /// Final display name (may be empty)
    pub label: String,
    /// Final version (may be empty)
    pub version: String,
    /// Final package identifier (may be empty)
    pub package_id: String,
    /// Final confidence
    pub confidence: Confidence,
    /// Method that supplied the final fields
    pub method: Option<ExtractionMethod>,
    /// Icon resource hint reported by the badging tool
    pub icon_hint: Option<String>,
}

impl AnalysisResult {
    /// Start an empty analysis for `file`
    pub fn new(file: PackageFile) -> Self {
        Self {
            file,
            candidates: Vec::new(),
            label: String::new(),
            version: String::new(),
            package_id: String::new(),
            confidence: Confidence::NONE,
            method: None,
            icon_hint: None,
        }
    }

    /// An analysis that could not run at all
    pub fn aborted(
        file: PackageFile,
        method: ExtractionMethod,
        error: impl std::fmt::Display,
    ) -> Self {
        let mut result = Self::new(file);
        result.push(ExtractionCandidate::failed(method, error));
        result
    }

    /// Append a candidate and re-derive the final fields
    pub fn push(&mut self, candidate: ExtractionCandidate) {
        self.candidates.push(candidate);
        let verdict = crate::arbiter::arbitrate(&self.candidates);
        self.label = verdict.label;
        self.version = verdict.version;
        self.package_id = verdict.package_id;
        self.confidence = verdict.confidence;
        self.method = verdict.method;
    }

    /// Candidates in trial order
    pub fn candidates(&self) -> &[ExtractionCandidate] {
        &self.candidates
    }

    /// Valid exactly when the final confidence is above zero
    pub fn status(&self) -> AnalysisStatus {
        if self.confidence.is_none() {
            AnalysisStatus::Invalid
        } else {
            AnalysisStatus::Valid
        }
    }

    /// Error notes of all failed methods, joined
    pub fn error_summary(&self) -> String {
        let notes: Vec<String> = self
            .candidates
            .iter()
            .filter_map(|c| c.error.as_ref().map(|e| format!("{}: {}", c.method, e)))
            .collect();
        if notes.is_empty() {
            "no metadata found".to_string()
        } else {
            notes.join("; ")
        }
    }
}

/// An icon candidate inside a package archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconAsset {
    /// Archive entry path
    pub entry_path: String,
    /// Width parsed from a `WxH` filename token
    pub width_hint: Option<u32>,
    /// Height parsed from a `WxH` filename token
    pub height_hint: Option<u32>,
    /// Screen density rank (Android), 0 when unknown
    pub density_rank: u8,
    /// Uncompressed size
    pub byte_size: u64,
}

impl IconAsset {
    /// Both dimensions known
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width_hint.zip(self.height_hint)
    }

    /// Square when dimensions are known and equal; dimensionless assets count as square
    pub fn is_square(&self) -> bool {
        self.dimensions().is_none_or(|(w, h)| w == h)
    }

    /// Pixel count, when dimensions are known
    pub fn resolution(&self) -> Option<u64> {
        self.dimensions().map(|(w, h)| u64::from(w) * u64::from(h))
    }
}

/// What phase 2 did with a file's name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RenameOutcome {
    /// The file was moved
    Renamed {
        /// Previous file name
        from: String,
        /// New file name
        to: String,
    },
    /// The computed name equals the current one
    Unchanged,
    /// The file was not eligible for renaming
    Skipped,
    /// The rename failed after all retries
    Failed {
        /// Last error seen
        reason: String,
    },
}

/// Per-file report row
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileOutcome {
    /// File name at scan time
    pub original: String,
    /// File name after phase 2
    pub final_name: String,
    /// Resolved display name
    pub label: String,
    /// Resolved package identifier
    pub package_id: String,
    /// Resolved version
    pub version: String,
    /// Final confidence
    pub confidence: Confidence,
    /// Method that supplied the final fields
    pub method: Option<ExtractionMethod>,
    /// Package kind
    pub kind: PackageKind,
    /// Size in bytes
    pub size_bytes: u64,
    /// Analysis status
    pub status: AnalysisStatus,
    /// Phase 2 rename result
    pub rename: RenameOutcome,
    /// Extracted icon, if any
    pub icon: Option<PathBuf>,
    /// Error notes collected during analysis
    pub notes: Option<String>,
}

/// A file that did not make it through the pipeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// File name at scan time
    pub file: String,
    /// Why
    pub reason: String,
}

/// Aggregate counters for a batch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    /// Files scanned
    pub total: usize,
    /// Files with a valid analysis
    pub valid: usize,
    /// Files with an invalid analysis
    pub invalid: usize,
    /// Files moved to a new name
    pub renamed: usize,
    /// Files already carrying their target name
    pub unchanged: usize,
    /// Files whose rename failed
    pub failed: usize,
    /// Icons written
    pub icons: usize,
    /// Final confidence 3 and above
    pub high_confidence: usize,
    /// Final confidence 1 or 2
    pub medium_confidence: usize,
    /// Final confidence 0
    pub low_confidence: usize,
}

/// Result of one batch run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchReport {
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// When the batch finished
    pub finished_at: DateTime<Utc>,
    /// Per-file rows in enumeration order
    pub files: Vec<FileOutcome>,
    /// Aggregate counters
    pub counts: BatchCounts,
    /// Invalid analyses and failed renames
    pub failures: Vec<FailureEntry>,
}

impl BatchReport {
    /// Build the report and its counters from per-file rows
    pub fn from_outcomes(started_at: DateTime<Utc>, files: Vec<FileOutcome>) -> Self {
        let mut counts = BatchCounts {
            total: files.len(),
            ..BatchCounts::default()
        };
        let mut failures = Vec::new();

        for file in &files {
            match file.status {
                AnalysisStatus::Valid => counts.valid += 1,
                AnalysisStatus::Invalid => {
                    counts.invalid += 1;
                    failures.push(FailureEntry {
                        file: file.original.clone(),
                        reason: file
                            .notes
                            .clone()
                            .unwrap_or_else(|| "no metadata found".to_string()),
                    });
                }
            }
            match &file.rename {
                RenameOutcome::Renamed { .. } => counts.renamed += 1,
                RenameOutcome::Unchanged => counts.unchanged += 1,
                RenameOutcome::Failed { reason } => {
                    counts.failed += 1;
                    failures.push(FailureEntry {
                        file: file.original.clone(),
                        reason: reason.clone(),
                    });
                }
                RenameOutcome::Skipped => {}
            }
            if file.icon.is_some() {
                counts.icons += 1;
            }
            match file.confidence.tier() {
                ConfidenceTier::High => counts.high_confidence += 1,
                ConfidenceTier::Medium => counts.medium_confidence += 1,
                ConfidenceTier::Low => counts.low_confidence += 1,
            }
        }

        Self {
            started_at,
            finished_at: Utc::now(),
            files,
            counts,
            failures,
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(method: ExtractionMethod, label: &str, conf: u8) -> ExtractionCandidate {
        ExtractionCandidate {
            label: label.to_string(),
            confidence: Confidence(conf),
            ..ExtractionCandidate::empty(method)
        }
    }

    fn apk() -> PackageFile {
        PackageFile::new("/tmp/a.apk", 10, PackageKind::Android)
    }

    #[test]
    fn kind_from_extension_is_case_insensitive() {
        assert_eq!(PackageKind::from_extension("APK"), PackageKind::Android);
        assert_eq!(PackageKind::from_extension("Ipa"), PackageKind::Apple);
        assert_eq!(PackageKind::from_extension("zip"), PackageKind::Unknown);
        assert_eq!(
            PackageKind::from_path(Path::new("dir/Game.IPA")),
            PackageKind::Apple
        );
        assert_eq!(PackageKind::from_path(Path::new("noext")), PackageKind::Unknown);
    }

    #[test]
    fn confidence_tiers() {
        assert_eq!(Confidence(0).tier(), ConfidenceTier::Low);
        assert_eq!(Confidence(1).tier(), ConfidenceTier::Medium);
        assert_eq!(Confidence(2).tier(), ConfidenceTier::Medium);
        assert_eq!(Confidence(3).tier(), ConfidenceTier::High);
        assert_eq!(Confidence(4).tier(), ConfidenceTier::High);
    }

    #[test]
    fn push_tracks_strictly_higher_confidence() {
        let mut result = AnalysisResult::new(apk());
        assert_eq!(result.status(), AnalysisStatus::Invalid);

        result.push(candidate(ExtractionMethod::Badging, "First", 2));
        result.push(candidate(ExtractionMethod::ResourceDump, "Tie", 2));
        assert_eq!(result.label, "First");
        assert_eq!(result.method, Some(ExtractionMethod::Badging));

        result.push(candidate(ExtractionMethod::ManifestXmltree, "Better", 3));
        assert_eq!(result.label, "Better");
        assert_eq!(result.confidence, Confidence(3));
        assert_eq!(result.status(), AnalysisStatus::Valid);
        assert_eq!(result.candidates().len(), 3);
    }

    #[test]
    fn aborted_analysis_is_invalid_with_note() {
        let result = AnalysisResult::aborted(apk(), ExtractionMethod::Badging, "task panicked");
        assert_eq!(result.status(), AnalysisStatus::Invalid);
        assert_eq!(result.error_summary(), "badging: task panicked");
    }

    #[test]
    fn icon_asset_squareness() {
        let mut asset = IconAsset {
            entry_path: "Payload/A.app/AppIcon60x60@2x.png".into(),
            width_hint: Some(60),
            height_hint: Some(60),
            density_rank: 0,
            byte_size: 100,
        };
        assert!(asset.is_square());
        assert_eq!(asset.resolution(), Some(3600));

        asset.height_hint = Some(40);
        assert!(!asset.is_square());

        asset.width_hint = None;
        assert!(asset.is_square());
        assert_eq!(asset.resolution(), None);
    }

    fn outcome(name: &str, conf: u8, rename: RenameOutcome) -> FileOutcome {
        let status = if conf == 0 {
            AnalysisStatus::Invalid
        } else {
            AnalysisStatus::Valid
        };
        FileOutcome {
            original: name.to_string(),
            final_name: name.to_string(),
            label: String::new(),
            package_id: String::new(),
            version: String::new(),
            confidence: Confidence(conf),
            method: None,
            kind: PackageKind::Apple,
            size_bytes: 0,
            status,
            rename,
            icon: None,
            notes: (conf == 0).then(|| "info_plist: no Info.plist found".to_string()),
        }
    }

    #[test]
    fn report_counts_and_failures() {
        let report = BatchReport::from_outcomes(
            Utc::now(),
            vec![
                outcome(
                    "a.ipa",
                    4,
                    RenameOutcome::Renamed {
                        from: "a.ipa".into(),
                        to: "A v1.0.ipa".into(),
                    },
                ),
                outcome("b.ipa", 2, RenameOutcome::Unchanged),
                outcome(
                    "c.ipa",
                    1,
                    RenameOutcome::Failed {
                        reason: "locked".into(),
                    },
                ),
                outcome("d.ipa", 0, RenameOutcome::Skipped),
            ],
        );

        let c = &report.counts;
        assert_eq!(c.total, 4);
        assert_eq!((c.valid, c.invalid), (3, 1));
        assert_eq!((c.renamed, c.unchanged, c.failed), (1, 1, 1));
        assert_eq!(
            (c.high_confidence, c.medium_confidence, c.low_confidence),
            (1, 2, 1)
        );
        let failed: Vec<&str> = report.failures.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(failed, vec!["c.ipa", "d.ipa"]);
    }

    #[test]
    fn report_serializes_rename_outcome_with_tag() {
        let report = BatchReport::from_outcomes(
            Utc::now(),
            vec![outcome("b.ipa", 2, RenameOutcome::Unchanged)],
        );
        let json = report.to_json().unwrap();
        assert!(json.contains("\"action\": \"unchanged\""), "got: {json}");
    }
}
