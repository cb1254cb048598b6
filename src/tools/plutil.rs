//! Property-list dump via the external plutil binary

use super::parser::ExitStatus;
use super::traits::PlistDumpTool;
use crate::bundle::{PropertyBundle, parse_plist_dump};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Dump tool invoking `plutil -p`
pub struct PlutilTool {
    binary_path: PathBuf,
}

impl PlutilTool {
    /// Create a plutil tool with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find plutil in PATH
    pub fn from_path() -> Option<Self> {
        which::which("plutil").ok().map(Self::new)
    }

    /// Path of the binary in use
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl PlistDumpTool for PlutilTool {
    async fn dump(&self, plist: &Path) -> crate::Result<PropertyBundle> {
        let output = Command::new(&self.binary_path)
            .arg("-p")
            .arg(plist)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute plutil: {}", e)))?;

        if !ExitStatus::from(output.status.success()).is_success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::Error::ExternalTool(format!(
                "plutil -p failed: {}",
                stderr.trim()
            )));
        }

        Ok(parse_plist_dump(&String::from_utf8_lossy(&output.stdout)))
    }

    fn name(&self) -> &'static str {
        "cli-plutil"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_agrees_with_which() {
        assert_eq!(
            which::which("plutil").is_ok(),
            PlutilTool::from_path().is_some()
        );
    }

    #[tokio::test]
    async fn dump_with_invalid_binary_path() {
        let tool = PlutilTool::new(PathBuf::from("/nonexistent/path/to/plutil"));
        match tool.dump(Path::new("Info.plist")).await {
            Err(crate::Error::ExternalTool(msg)) => assert!(msg.contains("plutil")),
            other => panic!("Expected ExternalTool error, got: {:?}", other),
        }
    }
}
