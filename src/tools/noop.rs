//! No-op badging tool for graceful degradation

use super::traits::{BadgingInfo, BadgingTool, ToolCapabilities};
use async_trait::async_trait;
use std::path::Path;

/// Badging tool used when no aapt binary is available or configured
///
/// Every method returns `Error::NotSupported`. Android analysis still runs;
/// each method is recorded as a zero-confidence candidate with the error
/// note, and the file ends up invalid and unrenamed.
///
/// # Examples
///
/// ```
/// use mobile_pkg_renamer::tools::{BadgingTool, NoOpBadgingTool};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let tool = NoOpBadgingTool;
/// assert!(tool.badging(Path::new("app.apk")).await.is_err());
/// # }
/// ```
pub struct NoOpBadgingTool;

fn unsupported(operation: &str) -> crate::Error {
    crate::Error::NotSupported(format!(
        "{} requires the aapt binary. Configure tools.aapt_path or ensure aapt is in PATH.",
        operation
    ))
}

#[async_trait]
impl BadgingTool for NoOpBadgingTool {
    async fn badging(&self, _package: &Path) -> crate::Result<BadgingInfo> {
        Err(unsupported("dump badging"))
    }

    async fn resource_label(&self, _package: &Path) -> crate::Result<Option<String>> {
        Err(unsupported("dump resources"))
    }

    async fn manifest_label(&self, _package: &Path) -> crate::Result<Option<String>> {
        Err(unsupported("dump xmltree"))
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities {
            can_badge: false,
            can_dump_resources: false,
            can_dump_xmltree: false,
        }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_method_is_not_supported() {
        let tool = NoOpBadgingTool;
        let p = Path::new("x.apk");

        assert!(matches!(
            tool.badging(p).await,
            Err(crate::Error::NotSupported(_))
        ));
        assert!(matches!(
            tool.resource_label(p).await,
            Err(crate::Error::NotSupported(_))
        ));
        assert!(matches!(
            tool.manifest_label(p).await,
            Err(crate::Error::NotSupported(_))
        ));
    }

    #[test]
    fn reports_no_capabilities() {
        let caps = NoOpBadgingTool.capabilities();
        assert!(!caps.can_badge && !caps.can_dump_resources && !caps.can_dump_xmltree);
        assert_eq!(NoOpBadgingTool.name(), "noop");
    }
}
