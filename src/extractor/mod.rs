//! Metadata extraction
//!
//! Produces the ordered [`ExtractionCandidate`](crate::types::ExtractionCandidate)
//! list for one package. Methods run in a fixed priority order per kind;
//! a method that fails or times out becomes a zero-confidence candidate with
//! an error note and never stops the methods after it.
//!
//! Android: `badging`, `resource_dump`, `manifest_xmltree`.
//! Apple: `info_plist`, `plist_dump` (when a dump tool is available),
//! `alternate_info_plist` (when the main manifest has no name).

mod android;
mod apple;

pub use apple::{info_plist_entries, select_main_manifest};

use crate::archive::with_archive_limited;
use crate::config::{Config, TimeoutConfig};
use crate::error::{Error, Result};
use crate::tools::{
    BadgingTool, PlistDumpTool, badging_tool_from_config, plist_dump_tool_from_config,
};
use crate::types::{AnalysisResult, ExtractionMethod, PackageFile, PackageKind};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Runs the extraction methods for a package
#[derive(Clone)]
pub struct Extractor {
    badging: Arc<dyn BadgingTool>,
    plist_dump: Option<Arc<dyn PlistDumpTool>>,
    timeouts: TimeoutConfig,
    alternate_limit: usize,
    max_entry_bytes: u64,
}

impl Extractor {
    /// Create an extractor with explicit tools
    pub fn new(
        badging: Arc<dyn BadgingTool>,
        plist_dump: Option<Arc<dyn PlistDumpTool>>,
        config: &Config,
    ) -> Self {
        Self {
            badging,
            plist_dump,
            timeouts: config.timeouts.clone(),
            alternate_limit: config.analysis.alternate_manifest_limit,
            max_entry_bytes: config.analysis.max_entry_bytes,
        }
    }

    /// Create an extractor with tools resolved from `config.tools`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            badging_tool_from_config(&config.tools),
            plist_dump_tool_from_config(&config.tools),
            config,
        )
    }

    /// Analyze one package
    ///
    /// The kind is re-checked against the archive layout first, so a
    /// misnamed package is analyzed as what it really is. Never fails: all
    /// errors end up as candidate notes.
    pub async fn analyze(&self, mut file: PackageFile) -> AnalysisResult {
        match self.read_archive(&file, |a| Ok(a.sniff_kind())).await {
            Ok(PackageKind::Unknown) => {}
            Ok(sniffed) if sniffed != file.kind => {
                warn!(
                    path = ?file.path,
                    extension_kind = %file.kind,
                    actual_kind = %sniffed,
                    "package content does not match its extension"
                );
                file.kind = sniffed;
            }
            Ok(_) => {}
            Err(e) => debug!(path = ?file.path, error = %e, "could not sniff package kind"),
        }

        let result = AnalysisResult::new(file);
        let result = match result.file.kind {
            PackageKind::Android => android::analyze(self, result).await,
            PackageKind::Apple => apple::analyze(self, result).await,
            PackageKind::Unknown => {
                let file = result.file;
                AnalysisResult::aborted(
                    file,
                    ExtractionMethod::Badging,
                    Error::NotSupported("unrecognized package kind".to_string()),
                )
            }
        };

        debug!(
            path = ?result.file.path,
            label = %result.label,
            version = %result.version,
            confidence = %result.confidence,
            method = ?result.method,
            "analysis finished"
        );
        result
    }

    /// Read the archive on the blocking pool under the archive timeout
    pub(crate) async fn read_archive<T, F>(&self, file: &PackageFile, f: F) -> Result<T>
    where
        F: FnOnce(&mut crate::archive::PackageArchive) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        with_archive_limited(&file.path, self.timeouts.archive, self.max_entry_bytes, f).await
    }
}

/// Await `fut` for at most `limit`
pub(crate) async fn timed<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: operation.to_string(),
            limit,
        }),
    }
}
