//! External metadata tools
//!
//! Android identity comes from the platform packaging tool (`aapt`), which
//! is treated as a black box that prints text. Apple bundles can optionally
//! be corroborated with `plutil -p`. Both sit behind async traits so the
//! pipeline can run with real binaries, without them, or with fakes in tests.
//!
//! ## Architecture
//!
//! - [`BadgingTool`]: `dump badging`, `dump resources`, `dump xmltree`
//!   - [`AaptTool`]: shells out to the `aapt` or `aapt2` binary
//!   - [`NoOpBadgingTool`]: stand-in when no binary is available
//! - [`PlistDumpTool`]: `plutil -p`
//!   - [`PlutilTool`]: shells out to the `plutil` binary
//!
//! Parsers live in [`parser`] and are pure functions over captured output.

mod aapt;
mod noop;
pub mod parser;
mod plutil;
mod traits;

pub use aapt::{AaptFlavor, AaptTool};
pub use noop::NoOpBadgingTool;
pub use plutil::PlutilTool;
pub use traits::{BadgingInfo, BadgingTool, PlistDumpTool, ToolCapabilities};

use crate::config::ToolsConfig;
use std::sync::Arc;

/// Pick the badging tool for `config`
///
/// An explicit `aapt_path` wins; otherwise PATH is searched when enabled.
/// Falls back to [`NoOpBadgingTool`].
pub fn badging_tool_from_config(config: &ToolsConfig) -> Arc<dyn BadgingTool> {
    let tool: Arc<dyn BadgingTool> = if let Some(ref aapt_path) = config.aapt_path {
        Arc::new(AaptTool::new(aapt_path.clone()).with_resource_values(config.resource_values))
    } else if config.search_path {
        AaptTool::from_path()
            .map(|t| {
                Arc::new(t.with_resource_values(config.resource_values)) as Arc<dyn BadgingTool>
            })
            .unwrap_or_else(|| Arc::new(NoOpBadgingTool))
    } else {
        Arc::new(NoOpBadgingTool)
    };

    let caps = tool.capabilities();
    tracing::info!(
        badging_tool = tool.name(),
        can_badge = caps.can_badge,
        "badging tool selected"
    );
    tool
}

/// Pick the property-list dump tool for `config`, if one should be used
pub fn plist_dump_tool_from_config(config: &ToolsConfig) -> Option<Arc<dyn PlistDumpTool>> {
    if !config.use_plist_dump {
        return None;
    }
    let tool = if let Some(ref plutil_path) = config.plutil_path {
        Some(PlutilTool::new(plutil_path.clone()))
    } else if config.search_path {
        PlutilTool::from_path()
    } else {
        None
    };

    match tool {
        Some(t) => {
            tracing::info!(plist_dump_tool = t.name(), "property-list dump tool selected");
            Some(Arc::new(t))
        }
        None => {
            tracing::debug!("no property-list dump tool available");
            None
        }
    }
}
