//! Batch scheduling
//!
//! A batch runs in two phases:
//!
//! 1. **Analysis** (parallel, read-only): every package is analyzed in its
//!    own task, at most `worker_count` at a time. Nothing is renamed.
//! 2. **Mutation** (sequential): in scan order, each valid package is
//!    renamed through the [`NameRegistry`]; after all renames, icons are
//!    extracted for renamed and unchanged packages.
//!
//! Per-file failures never stop the batch; they show up in the
//! [`BatchReport`].

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::Extractor;
use crate::icon::{extract_icon, prune_invalid_icons};
use crate::renamer::{
    FileMover, FsMover, NameRegistry, rename_via, resolve_base_name, target_stem,
};
use crate::types::{
    AnalysisResult, AnalysisStatus, BatchReport, ExtractionMethod, FileOutcome, PackageFile,
    PackageKind, RenameOutcome,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const ICON_EXTENSION: &str = "png";

/// Mutable state owned by phase 2
#[derive(Debug, Default)]
pub struct BatchState {
    /// Package names claimed so far
    pub registry: NameRegistry,
    /// Icon names written during this batch
    ///
    /// Starts empty, so icons from earlier batches may be overwritten.
    pub icons: NameRegistry,
}

impl BatchState {
    /// State seeded from the current contents of `dir`
    pub fn for_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            registry: NameRegistry::from_dir(dir)?,
            icons: NameRegistry::new(),
        })
    }
}

/// List packages in `dir`, sorted by file name
///
/// Keeps regular files whose extension is `apk` or `ipa` in any case.
pub fn scan_dir(dir: &Path) -> Result<Vec<PackageFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::Config {
        message: format!("cannot read input directory {}: {}", dir.display(), e),
        key: Some("input_dir".to_string()),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let path = entry.path();
        let kind = PackageKind::from_path(&path);
        if kind == PackageKind::Unknown {
            continue;
        }
        files.push(PackageFile::new(path, metadata.len(), kind));
    }

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}

/// The rename pipeline over one directory
pub struct Pipeline {
    config: Config,
    extractor: Extractor,
    mover: Arc<dyn FileMover>,
}

impl Pipeline {
    /// Build a pipeline with tools resolved from `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let extractor = Extractor::from_config(&config);
        Ok(Self {
            config,
            extractor,
            mover: Arc::new(FsMover),
        })
    }

    /// Build a pipeline with an explicit extractor
    pub fn with_extractor(config: Config, extractor: Extractor) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor,
            mover: Arc::new(FsMover),
        })
    }

    /// Replace the filesystem mover used in phase 2
    pub fn with_mover(mut self, mover: Arc<dyn FileMover>) -> Self {
        self.mover = mover;
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Packages in the input directory
    pub fn scan(&self) -> Result<Vec<PackageFile>> {
        scan_dir(&self.config.input_dir)
    }

    /// Phase 1: analyze every file with bounded concurrency
    ///
    /// Results come back in input order. A panicking analysis yields an
    /// invalid result for that file only.
    pub async fn analyze_all(&self, files: Vec<PackageFile>) -> Vec<AnalysisResult> {
        let workers = self.config.worker_count();
        info!(files = files.len(), workers, "analysis phase started");

        let results: Vec<AnalysisResult> = stream::iter(files)
            .map(|file| {
                let extractor = self.extractor.clone();
                let fallback = file.clone();
                async move {
                    match tokio::spawn(async move { extractor.analyze(file).await }).await {
                        Ok(result) => result,
                        Err(e) => {
                            warn!(path = ?fallback.path, error = %e, "analysis task failed");
                            let method = match fallback.kind {
                                PackageKind::Apple => ExtractionMethod::InfoPlist,
                                _ => ExtractionMethod::Badging,
                            };
                            AnalysisResult::aborted(
                                fallback,
                                method,
                                format!("analysis task failed: {}", e),
                            )
                        }
                    }
                }
            })
            .buffered(workers)
            .collect()
            .await;

        let valid = results
            .iter()
            .filter(|r| r.status() == AnalysisStatus::Valid)
            .count();
        info!(valid, invalid = results.len() - valid, "analysis phase finished");
        results
    }

    /// Phase 2: rename sequentially, then extract icons sequentially
    pub async fn apply(
        &self,
        results: Vec<AnalysisResult>,
        state: &mut BatchState,
    ) -> Vec<FileOutcome> {
        let mut rows: Vec<(AnalysisResult, FileOutcome, PathBuf)> =
            Vec::with_capacity(results.len());

        for result in results {
            let (rename, final_path) = self.rename_one(&result, state).await;
            let outcome = outcome_row(&result, rename, &final_path);
            rows.push((result, outcome, final_path));
        }

        if self.config.icons.extract {
            for (result, outcome, final_path) in rows.iter_mut() {
                if !matches!(
                    outcome.rename,
                    RenameOutcome::Renamed { .. } | RenameOutcome::Unchanged
                ) {
                    continue;
                }
                outcome.icon = self.icon_for(result, final_path, &mut state.icons).await;
            }
        }

        rows.into_iter().map(|(_, outcome, _)| outcome).collect()
    }

    async fn rename_one(
        &self,
        result: &AnalysisResult,
        state: &mut BatchState,
    ) -> (RenameOutcome, PathBuf) {
        let file = &result.file;
        let current_path = file.path.clone();

        if result.status() == AnalysisStatus::Invalid {
            return (RenameOutcome::Skipped, current_path);
        }
        let Some(ext) = file.kind.extension() else {
            return (RenameOutcome::Skipped, current_path);
        };

        let current = file.file_name();
        let base = resolve_base_name(&result.label, &result.package_id, &file.stem());
        let stem = target_stem(&base, &result.version, &self.config.rename.default_version);
        let new_name = state.registry.claim(&current, &stem, ext);

        if new_name == current {
            return (RenameOutcome::Unchanged, current_path);
        }

        let parent = current_path.parent().unwrap_or_else(|| Path::new("."));
        let new_path = parent.join(&new_name);

        let retry = &self.config.rename.retry;
        match rename_via(self.mover.as_ref(), &current_path, &new_path, retry).await {
            Ok(()) => {
                state.registry.release(&current);
                (
                    RenameOutcome::Renamed {
                        from: current,
                        to: new_name,
                    },
                    new_path,
                )
            }
            Err(e) => {
                warn!(path = ?current_path, target = %new_name, error = %e, "rename failed");
                state.registry.release(&new_name);
                (
                    RenameOutcome::Failed {
                        reason: e.to_string(),
                    },
                    current_path,
                )
            }
        }
    }

    async fn icon_for(
        &self,
        result: &AnalysisResult,
        final_path: &Path,
        icons: &mut NameRegistry,
    ) -> Option<PathBuf> {
        let package_stem = final_path.file_stem()?.to_string_lossy().into_owned();
        let icon_name = icons.claim("", &package_stem, ICON_EXTENSION);
        let icon_stem = icon_name
            .strip_suffix(ICON_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(&package_stem)
            .to_string();

        let written = extract_icon(
            final_path,
            result.file.kind,
            result.icon_hint.as_deref(),
            &self.config.icons.icon_dir,
            &icon_stem,
            self.config.timeouts.archive,
            self.config.analysis.max_entry_bytes,
        )
        .await;

        match written {
            Ok(Some(icon)) => Some(icon),
            Ok(None) => {
                icons.release(&icon_name);
                None
            }
            Err(e) => {
                warn!(path = ?final_path, error = %e, "icon extraction failed");
                icons.release(&icon_name);
                None
            }
        }
    }

    fn prune_icons(&self) {
        if !self.config.icons.prune_invalid {
            return;
        }
        if let Err(e) = prune_invalid_icons(&self.config.icons.icon_dir) {
            warn!(icon_dir = ?self.config.icons.icon_dir, error = %e, "icon pruning failed");
        }
    }

    /// Run a whole batch: prune, scan, analyze, rename, extract icons, prune
    ///
    /// # Errors
    ///
    /// Only when the input directory cannot be listed. Per-file problems are
    /// reported in the returned [`BatchReport`].
    pub async fn run(&self) -> Result<BatchReport> {
        let started_at = Utc::now();
        self.prune_icons();

        let files = self.scan()?;
        info!(input_dir = ?self.config.input_dir, files = files.len(), "batch started");

        let results = self.analyze_all(files).await;

        let mut state = BatchState::for_dir(&self.config.input_dir)?;
        let outcomes = self.apply(results, &mut state).await;

        self.prune_icons();

        let report = BatchReport::from_outcomes(started_at, outcomes);
        info!(
            total = report.counts.total,
            renamed = report.counts.renamed,
            unchanged = report.counts.unchanged,
            failed = report.counts.failed,
            invalid = report.counts.invalid,
            icons = report.counts.icons,
            "batch finished"
        );
        Ok(report)
    }
}

/// Run one batch over `config.input_dir` with tools resolved from `config`
///
/// # Example
///
/// ```no_run
/// use mobile_pkg_renamer::{Config, scheduler};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let report = scheduler::run(Config::for_dir("/data/packages")).await?;
///     println!("{}", report.to_json()?);
///     Ok(())
/// }
/// ```
pub async fn run(config: Config) -> Result<BatchReport> {
    Pipeline::new(config)?.run().await
}

/// Run one batch with an explicit extractor
pub async fn run_with(extractor: Extractor, config: Config) -> Result<BatchReport> {
    Pipeline::with_extractor(config, extractor)?.run().await
}

fn outcome_row(result: &AnalysisResult, rename: RenameOutcome, final_path: &Path) -> FileOutcome {
    let has_errors = result.candidates().iter().any(|c| c.error.is_some());
    let status = result.status();
    FileOutcome {
        original: result.file.file_name(),
        final_name: final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        label: result.label.clone(),
        package_id: result.package_id.clone(),
        version: result.version.clone(),
        confidence: result.confidence,
        method: result.method,
        kind: result.file.kind,
        size_bytes: result.file.size_bytes,
        status,
        rename,
        icon: None,
        notes: (status == AnalysisStatus::Invalid || has_errors).then(|| result.error_summary()),
    }
}
