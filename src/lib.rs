//! # mobile-pkg-renamer
//!
//! Resolve the identity of Android (`.apk`) and Apple (`.ipa`) packages,
//! rename them to `"<Name> v<version>.<ext>"` without collisions and
//! extract one representative icon per package.
//!
//! ## Design Philosophy
//!
//! - **Multi-strategy** - Several extraction methods per package, the
//!   highest-confidence answer wins
//! - **Fail soft** - A broken package never stops the batch
//! - **Library-first** - No CLI, purely a Rust crate for embedding
//! - **Pluggable tools** - External binaries sit behind traits with a
//!   no-op fallback
//!
//! ## Quick Start
//!
//! ```no_run
//! use mobile_pkg_renamer::{Config, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::for_dir("/data/packages");
//!     config.analysis.max_workers = Some(4);
//!
//!     let report = run(config).await?;
//!     println!(
//!         "{} renamed, {} unchanged, {} failed",
//!         report.counts.renamed, report.counts.unchanged, report.counts.failed
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Confidence arbitration over extraction candidates
pub mod arbiter;
/// Package archive access
pub mod archive;
/// Property list decoding
pub mod bundle;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Per-package metadata extraction
pub mod extractor;
/// Icon selection and extraction
pub mod icon;
/// Filename resolution and collision-free renaming
pub mod renamer;
/// Retry logic with backoff
pub mod retry;
/// Two-phase batch scheduling
pub mod scheduler;
/// External tool integration
pub mod tools;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ArchiveError, Error, RenameError, Result};
pub use extractor::Extractor;
pub use renamer::{FileMover, FsMover, NameRegistry};
pub use scheduler::{Pipeline, run, run_with};
pub use tools::{
    AaptTool, BadgingInfo, BadgingTool, NoOpBadgingTool, PlistDumpTool, PlutilTool,
    ToolCapabilities,
};
pub use types::{
    AnalysisResult, AnalysisStatus, BatchCounts, BatchReport, Confidence, ConfidenceTier,
    ExtractionCandidate, ExtractionMethod, FailureEntry, FileOutcome, PackageFile, PackageKind,
    RenameOutcome,
};
