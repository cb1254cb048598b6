//! Icon extraction
//!
//! One representative icon per package is copied out of the archive into
//! the icon directory as `<stem>.png`, where `<stem>` is the package's
//! post-rename file stem. Packages without a matching asset are skipped
//! silently.

mod selection;

pub use selection::{android_candidates, apple_candidates, density_rank, select_best};

use crate::archive::with_archive_limited;
use crate::error::Result;
use crate::types::PackageKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Shortest icon file name kept by [`prune_invalid_icons`]
const MIN_ICON_NAME_LEN: usize = 5;

/// Copy the best icon of `package` to `<icon_dir>/<stem>.png`
///
/// # Arguments
///
/// * `package` - Path of the package after renaming
/// * `kind` - Package kind
/// * `icon_hint` - Icon resource reported by the badging tool (Android)
/// * `icon_dir` - Output directory, created if missing
/// * `stem` - Output file stem
/// * `timeout` - Ceiling for the archive read
/// * `max_entry_bytes` - Largest icon entry copied
///
/// # Returns
///
/// `Ok(Some(path))` when an icon was written, `Ok(None)` when the package
/// has no candidate asset.
pub async fn extract_icon(
    package: &Path,
    kind: PackageKind,
    icon_hint: Option<&str>,
    icon_dir: &Path,
    stem: &str,
    timeout: Duration,
    max_entry_bytes: u64,
) -> Result<Option<PathBuf>> {
    let hint = icon_hint.map(str::to_string);
    let dest = icon_dir.join(format!("{}.png", stem));
    let icon_dir = icon_dir.to_path_buf();

    let written = with_archive_limited(package, timeout, max_entry_bytes, move |archive| {
        let assets = match kind {
            PackageKind::Android => android_candidates(archive.entries(), hint.as_deref()),
            PackageKind::Apple => apple_candidates(archive.entries()),
            PackageKind::Unknown => Vec::new(),
        };
        let Some(best) = select_best(&assets) else {
            return Ok(None);
        };
        let entry = best.entry_path.clone();

        let bytes = archive.read_entry(&entry)?;
        std::fs::create_dir_all(&icon_dir)?;
        std::fs::write(&dest, &bytes)?;
        Ok(Some((entry, dest)))
    })
    .await?;

    match written {
        Some((entry, dest)) => {
            debug!(?package, entry = %entry, dest = ?dest, "icon extracted");
            Ok(Some(dest))
        }
        None => {
            debug!(?package, "no icon candidate");
            Ok(None)
        }
    }
}

fn is_invalid_icon_name(name: &str) -> bool {
    name == ".png" || name.starts_with('.') || name.chars().count() < MIN_ICON_NAME_LEN
}

/// Remove icon files with degenerate names from `icon_dir`
///
/// Targets leftovers such as `.png`, hidden files and names shorter than
/// five characters. A missing directory is not an error.
///
/// # Returns
///
/// Number of files removed.
pub fn prune_invalid_icons(icon_dir: &Path) -> Result<usize> {
    let entries = match std::fs::read_dir(icon_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_invalid_icon_name(&name) {
            std::fs::remove_file(entry.path())?;
            debug!(file = %name, "removed invalid icon");
            removed += 1;
        }
    }

    if removed > 0 {
        info!(removed, ?icon_dir, "pruned invalid icon files");
    }
    Ok(removed)
}
