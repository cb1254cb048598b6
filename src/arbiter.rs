//! Confidence arbitration over extraction candidates
//!
//! A pure function: given the candidates for one file in trial order, pick
//! the one whose fields become the file's identity.

use crate::types::{Confidence, ExtractionCandidate, ExtractionMethod};

/// The chosen identity for one file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Display name, empty when no candidate carried one
    pub label: String,
    /// Version string
    pub version: String,
    /// Package identifier
    pub package_id: String,
    /// Confidence of the chosen candidate
    pub confidence: Confidence,
    /// Method of the chosen candidate
    pub method: Option<ExtractionMethod>,
}

impl From<&ExtractionCandidate> for Verdict {
    fn from(c: &ExtractionCandidate) -> Self {
        Self {
            label: c.label.clone(),
            version: c.version.clone(),
            package_id: c.package_id.clone(),
            confidence: c.confidence,
            method: Some(c.method),
        }
    }
}

/// First candidate with the strictly highest confidence among those passing `eligible`
fn best_by<'a, F>(
    candidates: &'a [ExtractionCandidate],
    eligible: F,
) -> Option<&'a ExtractionCandidate>
where
    F: Fn(&ExtractionCandidate) -> bool,
{
    let mut best: Option<&ExtractionCandidate> = None;
    for candidate in candidates.iter().filter(|c| eligible(c)) {
        match best {
            Some(current) if candidate.confidence <= current.confidence => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Choose the final identity
///
/// Candidates with a label and non-zero confidence compete first. If none
/// qualifies, the best non-zero candidate without a label supplies the
/// package id and version with an empty label. Otherwise the verdict is
/// empty with confidence 0.
pub fn arbitrate(candidates: &[ExtractionCandidate]) -> Verdict {
    if let Some(best) = best_by(candidates, |c| !c.confidence.is_none() && c.has_label()) {
        return Verdict::from(best);
    }
    if let Some(best) = best_by(candidates, |c| !c.confidence.is_none()) {
        return Verdict {
            label: String::new(),
            ..Verdict::from(best)
        };
    }
    Verdict::default()
}
