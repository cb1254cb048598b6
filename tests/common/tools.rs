//! Scripted tool implementations

use async_trait::async_trait;
use mobile_pkg_renamer::{BadgingInfo, BadgingTool, Error, Result, ToolCapabilities};
use std::collections::HashMap;
use std::path::Path;

/// Badging tool answering from a table keyed by package file name
///
/// Unknown names fail like a real `aapt` on a broken package. A file named
/// in `panic_on` makes the tool panic.
#[derive(Default)]
pub struct ScriptedAapt {
    pub badging: HashMap<String, BadgingInfo>,
    pub panic_on: Option<String>,
}

impl ScriptedAapt {
    pub fn with(mut self, file: &str, package_id: &str, version: &str, label: &str) -> Self {
        self.badging.insert(
            file.to_string(),
            BadgingInfo {
                package_id: package_id.to_string(),
                version: version.to_string(),
                label: label.to_string(),
                icon_hint: None,
            },
        );
        self
    }

    fn key(package: &Path) -> String {
        package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BadgingTool for ScriptedAapt {
    async fn badging(&self, package: &Path) -> Result<BadgingInfo> {
        let key = Self::key(package);
        if self.panic_on.as_deref() == Some(key.as_str()) {
            panic!("scripted panic for {}", key);
        }
        self.badging
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::ExternalTool(format!("aapt dump badging failed: {}", key)))
    }

    async fn resource_label(&self, _package: &Path) -> Result<Option<String>> {
        Ok(None)
    }

    async fn manifest_label(&self, _package: &Path) -> Result<Option<String>> {
        Ok(None)
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities {
            can_badge: true,
            can_dump_resources: true,
            can_dump_xmltree: true,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
