//! Traits and types for external metadata tools

use crate::bundle::PropertyBundle;
use async_trait::async_trait;
use std::path::Path;

/// Identity reported by `aapt dump badging`
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgingInfo {
    /// Package name (e.g. `com.example.app`)
    pub package_id: String,
    /// `versionName`
    pub version: String,
    /// Application label
    pub label: String,
    /// Icon resource path of the highest density, if reported
    pub icon_hint: Option<String>,
}

/// Capabilities of a badging tool implementation
#[derive(Debug, Clone, Copy)]
pub struct ToolCapabilities {
    /// Can dump badging
    pub can_badge: bool,
    /// Can dump the resource table
    pub can_dump_resources: bool,
    /// Can dump the compiled manifest tree
    pub can_dump_xmltree: bool,
}

/// Trait for Android packaging tool access
///
/// Implementations can shell out to `aapt`, or stand in for it in tests and
/// when no tool is installed.
///
/// # Examples
///
/// ```no_run
/// use mobile_pkg_renamer::tools::{AaptTool, BadgingTool};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tool = AaptTool::from_path().expect("aapt binary not found");
/// let info = tool.badging(Path::new("app.apk")).await?;
/// println!("{} {}", info.label, info.version);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait BadgingTool: Send + Sync {
    /// Run `dump badging` and parse the identity lines
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be executed or exits non-zero.
    async fn badging(&self, package: &Path) -> crate::Result<BadgingInfo>;

    /// Look up the application name in the resource table
    ///
    /// `Ok(None)` when no app-name resource carries a string value.
    async fn resource_label(&self, package: &Path) -> crate::Result<Option<String>>;

    /// Read a literal `android:label` from the compiled manifest
    ///
    /// `Ok(None)` when the label is absent or is a resource reference.
    async fn manifest_label(&self, package: &Path) -> crate::Result<Option<String>>;

    /// Query capabilities of this tool
    fn capabilities(&self) -> ToolCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Trait for property-list dump utilities (`plutil -p`)
#[async_trait]
pub trait PlistDumpTool: Send + Sync {
    /// Dump the property list at `plist` and parse it
    async fn dump(&self, plist: &Path) -> crate::Result<PropertyBundle>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
