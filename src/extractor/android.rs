//! Android package identity via the badging tool

use super::{Extractor, timed};
use crate::types::{AnalysisResult, Confidence, ExtractionCandidate, ExtractionMethod};
use tracing::{debug, warn};

/// `badging`: both label and package id present
const BADGING_FULL: Confidence = Confidence(3);
/// `badging`: tool ran but label or package id is missing
const BADGING_PARTIAL: Confidence = Confidence(1);
/// `resource_dump` and `manifest_xmltree` hits
const LABEL_ONLY: Confidence = Confidence(2);

pub(super) async fn analyze(ctx: &Extractor, mut result: AnalysisResult) -> AnalysisResult {
    let path = result.file.path.clone();
    let tool = &ctx.badging;

    let badging = match timed(
        "aapt dump badging",
        ctx.timeouts.badging,
        tool.badging(&path),
    )
    .await
    {
        Ok(info) => {
            let confidence = if !info.label.is_empty() && !info.package_id.is_empty() {
                BADGING_FULL
            } else {
                BADGING_PARTIAL
            };
            result.icon_hint = info.icon_hint;
            ExtractionCandidate {
                label: info.label,
                package_id: info.package_id,
                version: info.version,
                confidence,
                ..ExtractionCandidate::empty(ExtractionMethod::Badging)
            }
        }
        Err(e) => {
            warn!(path = ?path, tool = tool.name(), error = %e, "badging failed");
            ExtractionCandidate::failed(ExtractionMethod::Badging, e)
        }
    };
    result.push(badging);

    let caps = tool.capabilities();

    if caps.can_dump_resources {
        let resources = timed(
            "aapt dump resources",
            ctx.timeouts.resources,
            tool.resource_label(&path),
        )
        .await;
        result.push(label_candidate(ExtractionMethod::ResourceDump, resources));
    } else {
        debug!(tool = tool.name(), "resource dump not supported, skipped");
    }

    if caps.can_dump_xmltree {
        let manifest = timed(
            "aapt dump xmltree",
            ctx.timeouts.xmltree,
            tool.manifest_label(&path),
        )
        .await;
        result.push(label_candidate(ExtractionMethod::ManifestXmltree, manifest));
    } else {
        debug!(tool = tool.name(), "xmltree dump not supported, skipped");
    }

    result
}

fn label_candidate(
    method: ExtractionMethod,
    outcome: crate::Result<Option<String>>,
) -> ExtractionCandidate {
    match outcome {
        Ok(Some(label)) if !label.trim().is_empty() => ExtractionCandidate {
            label: label.trim().to_string(),
            confidence: LABEL_ONLY,
            ..ExtractionCandidate::empty(method)
        },
        Ok(_) => {
            debug!(%method, "no label found");
            ExtractionCandidate::empty(method)
        }
        Err(e) => {
            debug!(%method, error = %e, "method failed");
            ExtractionCandidate::failed(method, e)
        }
    }
}
