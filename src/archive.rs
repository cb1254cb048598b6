//! Read-only access to package archives
//!
//! Both `.apk` and `.ipa` files are zip containers. [`PackageArchive`] is a
//! blocking reader; [`with_archive`] runs a closure over one on the blocking
//! thread pool under a timeout.

use crate::error::{ArchiveError, Error, Result};
use crate::types::PackageKind;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::debug;

/// Default ceiling for a single entry read into memory
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Metadata for one archive entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full entry path inside the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl ArchiveEntry {
    /// Last path component
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// An opened package archive
pub struct PackageArchive {
    path: PathBuf,
    archive: zip::ZipArchive<File>,
    entries: Vec<ArchiveEntry>,
    max_entry_bytes: u64,
}

impl PackageArchive {
    /// Open `path` as a zip archive and index its entries
    pub fn open(path: &Path) -> Result<Self> {
        let unreadable = |reason: String| {
            Error::Archive(ArchiveError::Unreadable {
                archive: path.to_path_buf(),
                reason,
            })
        };

        let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| unreadable(format!("entry {}: {}", index, e)))?;
            entries.push(ArchiveEntry {
                name: entry.name().to_string(),
                size: entry.size(),
                is_dir: entry.is_dir(),
            });
        }

        debug!(?path, entries = entries.len(), "opened package archive");

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            entries,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        })
    }

    /// Set the largest entry [`read_entry`](Self::read_entry) accepts
    pub fn with_entry_limit(mut self, max_entry_bytes: u64) -> Self {
        self.max_entry_bytes = max_entry_bytes;
        self
    }

    /// Path of the underlying package file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in archive order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Whether an entry with exactly this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Read a named entry fully into memory
    ///
    /// The size declared in the archive is not trusted: at most the entry
    /// limit plus one byte is read, and a longer entry is an
    /// [`ArchiveError::EntryRead`].
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let archive_path = self.path.clone();
        let limit = self.max_entry_bytes;
        let mut file = self.archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => Error::Archive(ArchiveError::MissingEntry {
                archive: archive_path.clone(),
                entry: name.to_string(),
            }),
            other => Error::Archive(ArchiveError::EntryRead {
                archive: archive_path.clone(),
                entry: name.to_string(),
                reason: other.to_string(),
            }),
        })?;

        let entry_read = |reason: String| {
            Error::Archive(ArchiveError::EntryRead {
                archive: archive_path.clone(),
                entry: name.to_string(),
                reason,
            })
        };

        let mut buf = Vec::new();
        file.by_ref()
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| entry_read(e.to_string()))?;
        if buf.len() as u64 > limit {
            return Err(entry_read(format!("entry exceeds {} bytes", limit)));
        }
        Ok(buf)
    }

    /// Copy a named entry into a scoped temporary file
    ///
    /// The file is removed when the returned handle is dropped.
    pub fn extract_to_temp(&mut self, name: &str) -> Result<tempfile::NamedTempFile> {
        let bytes = self.read_entry(name)?;
        let suffix = Path::new(name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut temp = tempfile::Builder::new()
            .prefix("pkg-entry-")
            .suffix(&suffix)
            .tempfile()?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        Ok(temp)
    }

    /// Determine the real package kind from the archive layout
    ///
    /// A root `AndroidManifest.xml` means Android; entries under
    /// `Payload/<name>.app/` mean Apple.
    pub fn sniff_kind(&self) -> PackageKind {
        if self.contains("AndroidManifest.xml") {
            return PackageKind::Android;
        }
        let is_apple = self.entries.iter().any(|e| {
            e.name
                .strip_prefix("Payload/")
                .and_then(|rest| rest.split('/').next())
                .is_some_and(|dir| dir.len() > ".app".len() && dir.ends_with(".app"))
        });
        if is_apple {
            PackageKind::Apple
        } else {
            PackageKind::Unknown
        }
    }
}

/// Open `path` and run `f` over it on the blocking pool, bounded by `timeout`
///
/// Entry reads use [`DEFAULT_MAX_ENTRY_BYTES`].
pub async fn with_archive<T, F>(path: &Path, timeout: Duration, f: F) -> Result<T>
where
    F: FnOnce(&mut PackageArchive) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    with_archive_limited(path, timeout, DEFAULT_MAX_ENTRY_BYTES, f).await
}

/// [`with_archive`] with an explicit per-entry read ceiling
pub async fn with_archive_limited<T, F>(
    path: &Path,
    timeout: Duration,
    max_entry_bytes: u64,
    f: F,
) -> Result<T>
where
    F: FnOnce(&mut PackageArchive) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let owned = path.to_path_buf();
    let task = spawn_blocking(move || {
        let mut archive = PackageArchive::open(&owned)?.with_entry_limit(max_entry_bytes);
        f(&mut archive)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(Error::Other(format!("archive task panicked: {}", e))),
        Err(_) => Err(Error::Timeout {
            operation: format!("reading {}", path.display()),
            limit: timeout,
        }),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (entry, data) in entries {
            zip.start_file(*entry, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn open_lists_entries_with_sizes() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(
            dir.path(),
            "a.apk",
            &[("AndroidManifest.xml", b"<xml/>"), ("res/mipmap-hdpi/ic_launcher.png", b"png!")],
        );

        let archive = PackageArchive::open(&path).unwrap();
        assert_eq!(archive.entries().len(), 2);
        assert_eq!(archive.entries()[1].file_name(), "ic_launcher.png");
        assert_eq!(archive.entries()[1].size, 4);
        assert!(archive.contains("AndroidManifest.xml"));
        assert!(!archive.contains("classes.dex"));
    }

    #[test]
    fn read_entry_and_missing_entry() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(dir.path(), "a.ipa", &[("Payload/A.app/Info.plist", b"data")]);
        let mut archive = PackageArchive::open(&path).unwrap();

        assert_eq!(archive.read_entry("Payload/A.app/Info.plist").unwrap(), b"data");

        let err = archive.read_entry("Payload/A.app/missing").unwrap_err();
        assert_eq!(err.error_code(), "missing_entry");
    }

    #[test]
    fn garbage_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.apk");
        std::fs::write(&path, b"definitely not a zip").unwrap();

        let err = PackageArchive::open(&path).err().unwrap();
        assert_eq!(err.error_code(), "archive_unreadable");
    }

    #[test]
    fn extract_to_temp_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(dir.path(), "a.ipa", &[("Payload/A.app/Info.plist", b"plist")]);
        let mut archive = PackageArchive::open(&path).unwrap();

        let temp = archive.extract_to_temp("Payload/A.app/Info.plist").unwrap();
        let temp_path = temp.path().to_path_buf();
        assert_eq!(std::fs::read(&temp_path).unwrap(), b"plist");
        assert!(temp_path.to_string_lossy().ends_with(".plist"));

        drop(temp);
        assert!(!temp_path.exists());
    }

    #[test]
    fn entry_over_limit_is_an_entry_read_error() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(dir.path(), "a.ipa", &[("Payload/A.app/Info.plist", &[b'x'; 64])]);
        let mut archive = PackageArchive::open(&path).unwrap().with_entry_limit(63);

        let err = archive.read_entry("Payload/A.app/Info.plist").unwrap_err();
        assert_eq!(err.error_code(), "entry_read_failed");
        assert!(err.to_string().contains("exceeds 63 bytes"), "got: {err}");

        let mut archive = PackageArchive::open(&path).unwrap().with_entry_limit(64);
        assert_eq!(archive.read_entry("Payload/A.app/Info.plist").unwrap().len(), 64);
    }

    #[test]
    fn sniff_kind_from_layout() {
        let dir = TempDir::new().unwrap();
        let android = write_zip(dir.path(), "x.ipa", &[("AndroidManifest.xml", b"m")]);
        let apple = write_zip(dir.path(), "y.apk", &[("Payload/Y.app/Info.plist", b"p")]);
        let neither = write_zip(dir.path(), "z.apk", &[("Payload/.app/readme", b"r")]);

        assert_eq!(PackageArchive::open(&android).unwrap().sniff_kind(), PackageKind::Android);
        assert_eq!(PackageArchive::open(&apple).unwrap().sniff_kind(), PackageKind::Apple);
        assert_eq!(PackageArchive::open(&neither).unwrap().sniff_kind(), PackageKind::Unknown);
    }

    #[tokio::test]
    async fn with_archive_runs_closure_off_thread() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(dir.path(), "a.apk", &[("AndroidManifest.xml", b"m")]);

        let kind = with_archive(&path, Duration::from_secs(5), |a| Ok(a.sniff_kind()))
            .await
            .unwrap();
        assert_eq!(kind, PackageKind::Android);

        let missing = dir.path().join("nope.apk");
        let err = with_archive(&missing, Duration::from_secs(5), |a| Ok(a.entries().len()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "archive_unreadable");
    }
}
