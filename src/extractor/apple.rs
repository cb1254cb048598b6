//! Apple application archive identity via Info.plist

use super::{Extractor, timed};
use crate::archive::{ArchiveEntry, PackageArchive};
use crate::bundle::{
    BUNDLE_NAME, DISPLAY_NAME, DISPLAY_NAME_LOCALIZED, EXECUTABLE, IDENTIFIER, PropertyBundle,
};
use crate::error::ArchiveError;
use crate::types::{AnalysisResult, Confidence, ExtractionCandidate, ExtractionMethod};
use tracing::{debug, warn};

/// Name keys of the main manifest, strongest first
const NAME_KEYS: &[(&str, Confidence)] = &[
    (DISPLAY_NAME, Confidence(4)),
    (DISPLAY_NAME_LOCALIZED, Confidence(3)),
    (BUNDLE_NAME, Confidence(3)),
    (EXECUTABLE, Confidence(2)),
];

/// Only a bundle identifier was found
const IDENTIFIER_ONLY: Confidence = Confidence(1);
/// A secondary Info.plist supplied the name
const ALTERNATE: Confidence = Confidence(2);

/// Directories whose Info.plist describes a nested component, not the app
const NESTED_BUNDLES: &[&str] = &[".bundle/", ".framework/", ".storyboardc/", ".appex/"];

/// Names of all `Info.plist` entries, in archive order
pub fn info_plist_entries(entries: &[ArchiveEntry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| !e.is_dir && e.name.ends_with("Info.plist"))
        .map(|e| e.name.as_str())
        .collect()
}

/// Pick the application's own Info.plist among `candidates`
///
/// Prefers an entry under `Payload/` inside a `.app/` directory that is not
/// part of a nested bundle or a `GoogleService-Info.plist`; then any entry
/// inside a `.app/` directory; then the first entry.
pub fn select_main_manifest<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    let is_main = |name: &str| {
        name.contains("Payload/")
            && name.contains(".app/")
            && !NESTED_BUNDLES.iter().any(|d| name.contains(d))
            && !name.ends_with("GoogleService-Info.plist")
    };

    candidates
        .iter()
        .copied()
        .find(|n| is_main(*n))
        .or_else(|| candidates.iter().copied().find(|n| n.contains(".app/")))
        .or_else(|| candidates.first().copied())
}

/// What the blocking archive pass found
struct ManifestScan {
    main_entry: String,
    main: crate::Result<PropertyBundle>,
    temp: Option<tempfile::NamedTempFile>,
    alternates: Vec<(String, PropertyBundle)>,
}

fn scan_archive(
    archive: &mut PackageArchive,
    want_temp: bool,
    alternate_limit: usize,
) -> crate::Result<ManifestScan> {
    let names: Vec<String> = info_plist_entries(archive.entries())
        .into_iter()
        .map(String::from)
        .collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let Some(main_entry) = select_main_manifest(&refs).map(String::from) else {
        return Err(ArchiveError::NoManifest {
            archive: archive.path().to_path_buf(),
        }
        .into());
    };

    let main = archive
        .read_entry(&main_entry)
        .and_then(|bytes| PropertyBundle::from_bytes(&bytes));

    let temp = if want_temp && main.is_ok() {
        archive.extract_to_temp(&main_entry).ok()
    } else {
        None
    };

    let main_has_name = main
        .as_ref()
        .map(|b| main_name(b).is_some())
        .unwrap_or(false);

    let mut alternates = Vec::new();
    if !main_has_name {
        for name in names
            .iter()
            .filter(|n| **n != main_entry)
            .take(alternate_limit)
        {
            match archive
                .read_entry(name)
                .and_then(|bytes| PropertyBundle::from_bytes(&bytes))
            {
                Ok(bundle) => alternates.push((name.clone(), bundle)),
                Err(e) => debug!(entry = %name, error = %e, "skipping unreadable Info.plist"),
            }
        }
    }

    Ok(ManifestScan {
        main_entry,
        main,
        temp,
        alternates,
    })
}

/// Strongest name key present in `bundle`, with its confidence
fn main_name(bundle: &PropertyBundle) -> Option<(&str, Confidence)> {
    NAME_KEYS.iter().find_map(|(key, confidence)| {
        let value = bundle.get(key);
        (!value.is_empty()).then_some((value, *confidence))
    })
}

fn info_plist_candidate(bundle: &PropertyBundle) -> ExtractionCandidate {
    let package_id = bundle.get(IDENTIFIER).to_string();
    let version = bundle.version().to_string();

    let (label, confidence, error) = match main_name(bundle) {
        Some((name, confidence)) => (name.to_string(), confidence, None),
        None if !package_id.is_empty() => (String::new(), IDENTIFIER_ONLY, None),
        None => (
            String::new(),
            Confidence::NONE,
            Some("Info.plist has neither a name nor a bundle identifier".to_string()),
        ),
    };

    ExtractionCandidate {
        label,
        package_id,
        version,
        confidence,
        error,
        ..ExtractionCandidate::empty(ExtractionMethod::InfoPlist)
    }
}

fn plist_dump_candidate(bundle: &PropertyBundle) -> ExtractionCandidate {
    let (label, confidence) = match bundle.first_of(&[DISPLAY_NAME]) {
        Some((_, v)) => (v.to_string(), Confidence(3)),
        None => match bundle.first_of(&[BUNDLE_NAME]) {
            Some((_, v)) => (v.to_string(), Confidence(2)),
            None => (String::new(), Confidence::NONE),
        },
    };
    ExtractionCandidate {
        label,
        package_id: bundle.get(IDENTIFIER).to_string(),
        version: bundle.version().to_string(),
        confidence,
        ..ExtractionCandidate::empty(ExtractionMethod::PlistDump)
    }
}

fn alternate_candidate(alternates: &[(String, PropertyBundle)]) -> Option<ExtractionCandidate> {
    alternates.iter().find_map(|(entry, bundle)| {
        let (_, name) = bundle.first_of(&[DISPLAY_NAME, BUNDLE_NAME, EXECUTABLE])?;
        debug!(entry = %entry, name = %name, "name found in secondary Info.plist");
        Some(ExtractionCandidate {
            label: name.to_string(),
            package_id: bundle.get(IDENTIFIER).to_string(),
            version: bundle.version().to_string(),
            confidence: ALTERNATE,
            ..ExtractionCandidate::empty(ExtractionMethod::AlternateInfoPlist)
        })
    })
}

pub(super) async fn analyze(ctx: &Extractor, mut result: AnalysisResult) -> AnalysisResult {
    let want_temp = ctx.plist_dump.is_some();
    let limit = ctx.alternate_limit;

    let scan = match ctx
        .read_archive(&result.file, move |a| scan_archive(a, want_temp, limit))
        .await
    {
        Ok(scan) => scan,
        Err(e) => {
            warn!(path = ?result.file.path, error = %e, "no usable Info.plist");
            result.push(ExtractionCandidate::failed(ExtractionMethod::InfoPlist, e));
            return result;
        }
    };

    debug!(path = ?result.file.path, entry = %scan.main_entry, "main Info.plist selected");

    let main_has_label = match &scan.main {
        Ok(bundle) => {
            let candidate = info_plist_candidate(bundle);
            let has_label = candidate.has_label();
            result.push(candidate);
            has_label
        }
        Err(e) => {
            warn!(
                path = ?result.file.path,
                entry = %scan.main_entry,
                error = %e,
                "Info.plist unreadable"
            );
            result.push(ExtractionCandidate::failed(ExtractionMethod::InfoPlist, e));
            false
        }
    };

    if let (Some(tool), Some(temp)) = (&ctx.plist_dump, &scan.temp) {
        let dumped = timed("plutil -p", ctx.timeouts.plist_dump, tool.dump(temp.path())).await;
        let candidate = match dumped {
            Ok(bundle) => plist_dump_candidate(&bundle),
            Err(e) => {
                debug!(tool = tool.name(), error = %e, "plist dump failed");
                ExtractionCandidate::failed(ExtractionMethod::PlistDump, e)
            }
        };
        result.push(candidate);
    }

    if !main_has_label && let Some(candidate) = alternate_candidate(&scan.alternates) {
        result.push(candidate);
    }

    // scan.temp is dropped here, removing the extracted manifest
    result
}
