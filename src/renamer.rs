//! Filename construction and collision-free renaming
//!
//! Target names have the form `"<Name> v<version>.<ext>"`. The
//! [`NameRegistry`] holds every name claimed during a run so that two
//! packages never resolve to the same destination, and the physical rename
//! retries transient failures before giving up.

use crate::config::RetryConfig;
use crate::error::{Error, RenameError, Result};
use crate::retry::with_retry;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info};

/// Characters that may not appear in a file name
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Make `name` safe to use as a file name
///
/// Each reserved character becomes `_`, runs of `_` collapse to one, and
/// whitespace and `_` are trimmed from both ends. Applying it twice gives
/// the same result as applying it once.
///
/// # Examples
///
/// ```
/// use mobile_pkg_renamer::renamer::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Foo: Bar?"), "Foo_ Bar");
/// assert_eq!(sanitize_filename("a<>b"), "a_b");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if RESERVED.contains(&c) { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches(|c: char| c.is_whitespace() || c == '_')
        .to_string()
}

/// Last dot-component of a package id, `_` as spaces, title-cased
///
/// `com.example.my_app` → `My App`.
pub fn package_display_name(package_id: &str) -> String {
    let last = package_id.rsplit('.').next().unwrap_or(package_id);
    last.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Choose the base name of a package
///
/// Tries in order, taking the first that is non-empty after sanitizing:
/// 1. The resolved label
/// 2. The package id's last component, title-cased
/// 3. The original file stem
/// 4. `App_<stem>`
pub fn resolve_base_name(label: &str, package_id: &str, original_stem: &str) -> String {
    let label = sanitize_filename(label);
    if !label.is_empty() {
        return label;
    }

    if !package_id.is_empty() {
        let from_id = sanitize_filename(&package_display_name(package_id));
        if !from_id.is_empty() {
            return from_id;
        }
    }

    let stem = sanitize_filename(original_stem);
    if !stem.is_empty() {
        return stem;
    }

    let fallback = sanitize_filename(&format!("App_{}", original_stem));
    if fallback.is_empty() {
        "App".to_string()
    } else {
        fallback
    }
}

/// `"<base> v<version>"`, sanitized, with `default_version` when `version` is empty
pub fn target_stem(base: &str, version: &str, default_version: &str) -> String {
    let version = sanitize_filename(version);
    let version = if version.is_empty() {
        default_version
    } else {
        version.as_str()
    };
    sanitize_filename(&format!("{} v{}", base, version))
}

/// File names claimed during one batch
///
/// Seeded with the directory's contents, so existing files are never
/// overwritten. Names are compared exactly (case-sensitive).
#[derive(Clone, Debug, Default)]
pub struct NameRegistry {
    claimed: HashSet<String>,
}

impl NameRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from every entry currently in `dir`
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            registry
                .claimed
                .insert(entry.file_name().to_string_lossy().into_owned());
        }
        debug!(?dir, claimed = registry.claimed.len(), "name registry seeded");
        Ok(registry)
    }

    /// Seed from explicit names
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            claimed: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` is taken
    pub fn contains(&self, name: &str) -> bool {
        self.claimed.contains(name)
    }

    /// Number of claimed names
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// True when nothing is claimed
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Claim a unique name for a file currently called `current`
    ///
    /// If `stem.ext` (or a numbered variant) equals `current`, the file keeps
    /// its name. Otherwise ` (n)` is inserted before the extension from
    /// n = 1 until the name is free. The winner is registered before it is
    /// returned.
    pub fn claim(&mut self, current: &str, stem: &str, ext: &str) -> String {
        let plain = format!("{}.{}", stem, ext);
        if plain == current || !self.claimed.contains(&plain) {
            self.claimed.insert(plain.clone());
            return plain;
        }

        let mut n: u32 = 1;
        loop {
            let numbered = format!("{} ({}).{}", stem, n, ext);
            if numbered == current || !self.claimed.contains(&numbered) {
                self.claimed.insert(numbered.clone());
                return numbered;
            }
            n += 1;
        }
    }

    /// Give a name back
    pub fn release(&mut self, name: &str) {
        self.claimed.remove(name);
    }
}

/// Performs the physical rename
#[async_trait]
pub trait FileMover: Send + Sync {
    /// Move `from` to `to` in one step
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;
}

/// [`FileMover`] backed by `tokio::fs::rename`
#[derive(Clone, Copy, Debug, Default)]
pub struct FsMover;

#[async_trait]
impl FileMover for FsMover {
    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        tokio::fs::rename(from, to).await?;
        Ok(())
    }
}

/// Rename `from` to `to` on the local filesystem, retrying transient failures
///
/// The destination must not exist. On failure the source is untouched.
pub async fn rename_with_retry(from: &Path, to: &Path, retry: &RetryConfig) -> Result<()> {
    rename_via(&FsMover, from, to, retry).await
}

/// [`rename_with_retry`] through an explicit [`FileMover`]
pub async fn rename_via(
    mover: &dyn FileMover,
    from: &Path,
    to: &Path,
    retry: &RetryConfig,
) -> Result<()> {
    if tokio::fs::try_exists(to).await.unwrap_or(false) {
        return Err(RenameError::InvalidPath {
            path: to.to_path_buf(),
            reason: "destination already exists".to_string(),
        }
        .into());
    }

    let attempts = AtomicU32::new(0);
    let outcome = with_retry(retry, || {
        attempts.fetch_add(1, Ordering::Relaxed);
        mover.rename(from, to)
    })
    .await;

    match outcome {
        Ok(()) => {
            info!(from = ?from, to = ?to, "renamed");
            Ok(())
        }
        Err(e) => Err(Error::Rename(RenameError::Exhausted {
            source_path: from.to_path_buf(),
            dest_path: to.to_path_buf(),
            attempts: attempts.load(Ordering::Relaxed),
            reason: e.to_string(),
        })),
    }
}
