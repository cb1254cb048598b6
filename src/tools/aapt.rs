//! CLI-based badging tool using the external aapt binary

use super::parser::{ExitStatus, parse_badging_output, parse_manifest_label, parse_resource_label};
use super::traits::{BadgingInfo, BadgingTool, ToolCapabilities};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Command-line dialect of the binary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AaptFlavor {
    /// Legacy `aapt`
    Aapt,
    /// `aapt2`: no `--values` flag, xmltree takes `--file <entry>`
    Aapt2,
}

impl AaptFlavor {
    /// Guess the dialect from the binary's file name
    pub fn from_binary(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if stem.starts_with("aapt2") {
            AaptFlavor::Aapt2
        } else {
            AaptFlavor::Aapt
        }
    }
}

/// Badging tool invoking `aapt` or `aapt2`
///
/// Child processes are spawned with `kill_on_drop`, so a caller that stops
/// awaiting (e.g. on timeout) also terminates the process.
pub struct AaptTool {
    binary_path: PathBuf,
    flavor: AaptFlavor,
    resource_values: bool,
}

impl AaptTool {
    /// Create a new aapt tool with an explicit binary path
    ///
    /// The dialect is taken from the file name (see [`AaptFlavor::from_binary`]).
    ///
    /// # Arguments
    ///
    /// * `binary_path` - Path to the aapt or aapt2 binary
    pub fn new(binary_path: PathBuf) -> Self {
        let flavor = AaptFlavor::from_binary(&binary_path);
        Self {
            binary_path,
            flavor,
            resource_values: true,
        }
    }

    /// Override the detected dialect
    pub fn with_flavor(mut self, flavor: AaptFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Dialect in use
    pub fn flavor(&self) -> AaptFlavor {
        self.flavor
    }

    /// Attempt to find aapt in PATH
    ///
    /// Falls back to `aapt2` when plain `aapt` is not installed.
    pub fn from_path() -> Option<Self> {
        which::which("aapt")
            .or_else(|_| which::which("aapt2"))
            .ok()
            .map(Self::new)
    }

    /// Whether to pass `--values` to `dump resources` (default: true)
    pub fn with_resource_values(mut self, enabled: bool) -> Self {
        self.resource_values = enabled;
        self
    }

    /// Path of the binary in use
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn badging_args(&self, package: &Path) -> Vec<OsString> {
        vec!["dump".into(), "badging".into(), package.into()]
    }

    fn resource_args(&self, package: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["dump".into()];
        if self.flavor == AaptFlavor::Aapt && self.resource_values {
            args.push("--values".into());
        }
        args.push("resources".into());
        args.push(package.into());
        args
    }

    fn xmltree_args(&self, package: &Path) -> Vec<OsString> {
        match self.flavor {
            AaptFlavor::Aapt => vec![
                "dump".into(),
                "xmltree".into(),
                package.into(),
                MANIFEST_ENTRY.into(),
            ],
            AaptFlavor::Aapt2 => vec![
                "dump".into(),
                "xmltree".into(),
                "--file".into(),
                MANIFEST_ENTRY.into(),
                package.into(),
            ],
        }
    }

    async fn run(&self, args: &[OsString]) -> crate::Result<Output> {
        Command::new(&self.binary_path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute aapt: {}", e)))
    }
}

const MANIFEST_ENTRY: &str = "AndroidManifest.xml";

#[async_trait]
impl BadgingTool for AaptTool {
    async fn badging(&self, package: &Path) -> crate::Result<BadgingInfo> {
        let output = self.run(&self.badging_args(package)).await?;

        parse_badging_output(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        )
    }

    async fn resource_label(&self, package: &Path) -> crate::Result<Option<String>> {
        let output = self.run(&self.resource_args(package)).await?;

        parse_resource_label(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        )
    }

    async fn manifest_label(&self, package: &Path) -> crate::Result<Option<String>> {
        let output = self.run(&self.xmltree_args(package)).await?;

        parse_manifest_label(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities {
            can_badge: true,
            can_dump_resources: true,
            can_dump_xmltree: true,
        }
    }

    fn name(&self) -> &'static str {
        "cli-aapt"
    }
}
