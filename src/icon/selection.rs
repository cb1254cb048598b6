//! Icon candidate discovery and ranking
//!
//! Pure functions over archive entry listings; nothing here reads entry
//! contents.

use crate::archive::ArchiveEntry;
use crate::types::IconAsset;
use regex::Regex;
use std::sync::LazyLock;

static DIMENSIONS: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d+(?:\.\d+)?)x(\d+(?:\.\d+)?)").expect("valid dimension regex")
});

/// Filename fragments that mark an Apple icon
const APPLE_ICON_MARKERS: &[&str] = &["appicon", "app_icon", "applicationicon", "icon"];

/// Filename stems that look like an Android launcher icon
const LAUNCHER_STEMS: &[&str] = &["ic_launcher", "icon"];

/// Density qualifier → rank (hdpi < xhdpi < xxhdpi < xxxhdpi)
pub fn density_rank(dir_name: &str) -> u8 {
    dir_name
        .split('-')
        .map(|q| match q {
            "mdpi" => 1,
            "hdpi" => 2,
            "xhdpi" => 3,
            "xxhdpi" => 4,
            "xxxhdpi" => 5,
            _ => 0,
        })
        .max()
        .unwrap_or(0)
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

/// Android icon candidates: `.png` files under `res/drawable*` or `res/mipmap*`
///
/// When `icon_hint` names a resource, candidates are narrowed to the same
/// file stem if any match; otherwise to launcher-looking stems if any match.
pub fn android_candidates(entries: &[ArchiveEntry], icon_hint: Option<&str>) -> Vec<IconAsset> {
    let all: Vec<IconAsset> = entries
        .iter()
        .filter(|e| !e.is_dir && e.name.to_ascii_lowercase().ends_with(".png"))
        .filter_map(|e| {
            let mut parts = e.name.split('/');
            let (Some("res"), Some(dir)) = (parts.next(), parts.next()) else {
                return None;
            };
            if !(dir.starts_with("drawable") || dir.starts_with("mipmap")) {
                return None;
            }
            Some(IconAsset {
                entry_path: e.name.clone(),
                width_hint: None,
                height_hint: None,
                density_rank: density_rank(dir),
                byte_size: e.size,
            })
        })
        .collect();

    let hinted_stem = icon_hint.map(file_stem).filter(|s| !s.is_empty());
    if let Some(stem) = hinted_stem {
        let matching: Vec<IconAsset> = all
            .iter()
            .filter(|a| file_stem(&a.entry_path) == stem)
            .cloned()
            .collect();
        if !matching.is_empty() {
            return matching;
        }
    }

    let launcher: Vec<IconAsset> = all
        .iter()
        .filter(|a| LAUNCHER_STEMS.contains(&file_stem(&a.entry_path)))
        .cloned()
        .collect();
    if launcher.is_empty() { all } else { launcher }
}

/// Apple icon candidates: `.png` files whose name looks like an icon
///
/// A `WxH` token in the file name fills the dimension hints.
pub fn apple_candidates(entries: &[ArchiveEntry]) -> Vec<IconAsset> {
    entries
        .iter()
        .filter(|e| !e.is_dir)
        .filter_map(|e| {
            let name = e.file_name().to_ascii_lowercase();
            if !name.ends_with(".png") || !APPLE_ICON_MARKERS.iter().any(|m| name.contains(m)) {
                return None;
            }
            let dims = DIMENSIONS.captures(&name).and_then(|c| {
                Some((parse_point_size(&c[1])?, parse_point_size(&c[2])?))
            });
            Some(IconAsset {
                entry_path: e.name.clone(),
                width_hint: dims.map(|(w, _)| w),
                height_hint: dims.map(|(_, h)| h),
                density_rank: 0,
                byte_size: e.size,
            })
        })
        .collect()
}

/// `"83.5"` → 84; fractional point sizes round to the nearest pixel
fn parse_point_size(token: &str) -> Option<u32> {
    let value = token.parse::<f64>().ok()?;
    (0.0..=f64::from(u32::MAX))
        .contains(&value)
        .then(|| value.round() as u32)
}

/// Ranking key: Android by (density, size), Apple by (dimensioned, resolution or size)
fn rank(asset: &IconAsset) -> (u8, u64) {
    match asset.resolution() {
        Some(resolution) => (u8::MAX, resolution),
        None => (asset.density_rank, asset.byte_size),
    }
}

/// Pick exactly one asset
///
/// Non-square assets are dropped when any square one exists. The first asset
/// with the strictly greatest rank wins.
pub fn select_best(assets: &[IconAsset]) -> Option<&IconAsset> {
    let any_square = assets.iter().any(IconAsset::is_square);

    let mut best: Option<&IconAsset> = None;
    for asset in assets.iter().filter(|a| !any_square || a.is_square()) {
        match best {
            Some(current) if rank(asset) <= rank(current) => {}
            _ => best = Some(asset),
        }
    }
    best
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, size: u64) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            size,
            is_dir: false,
        }
    }

    #[test]
    fn density_ranks_are_ordered() {
        assert_eq!(density_rank("drawable"), 0);
        assert_eq!(density_rank("drawable-ldpi"), 0);
        assert_eq!(density_rank("mipmap-mdpi-v4"), 1);
        assert_eq!(density_rank("mipmap-hdpi-v4"), 2);
        assert_eq!(density_rank("mipmap-xhdpi-v4"), 3);
        assert_eq!(density_rank("mipmap-xxhdpi-v4"), 4);
        assert_eq!(density_rank("mipmap-xxxhdpi-v4"), 5);
        assert_eq!(density_rank("drawable-land-xxhdpi"), 4);
    }

    #[test]
    fn android_picks_highest_density_launcher() {
        let entries = vec![
            entry("res/mipmap-hdpi-v4/ic_launcher.png", 5000),
            entry("res/mipmap-xxxhdpi-v4/ic_launcher.png", 20000),
            entry("res/mipmap-xxhdpi-v4/ic_launcher.png", 15000),
            entry("res/drawable-xxxhdpi/splash_background.png", 90000),
            entry("res/layout/main.xml", 300),
            entry("assets/icon.png", 99999),
        ];
        let assets = android_candidates(&entries, None);
        assert_eq!(assets.len(), 3, "only launcher-looking names remain");
        let best = select_best(&assets).unwrap();
        assert_eq!(best.entry_path, "res/mipmap-xxxhdpi-v4/ic_launcher.png");
    }

    #[test]
    fn android_hint_narrows_by_stem() {
        let entries = vec![
            entry("res/mipmap-xxxhdpi-v4/ic_launcher.png", 20000),
            entry("res/mipmap-xhdpi-v4/app_logo.png", 8000),
            entry("res/mipmap-xxhdpi-v4/app_logo.png", 12000),
        ];
        let assets = android_candidates(&entries, Some("res/mipmap-anydpi-v26/app_logo.xml"));
        let best = select_best(&assets).unwrap();
        assert_eq!(best.entry_path, "res/mipmap-xxhdpi-v4/app_logo.png");
    }

    #[test]
    fn android_without_launcher_names_considers_all_pngs() {
        let entries = vec![
            entry("res/drawable-hdpi/a.png", 10),
            entry("res/drawable-hdpi/b.png", 30),
        ];
        let assets = android_candidates(&entries, Some("res/drawable/unknown.png"));
        assert_eq!(select_best(&assets).unwrap().entry_path, "res/drawable-hdpi/b.png");
    }

    #[test]
    fn apple_prefers_largest_square() {
        let entries = vec![
            entry("Payload/A.app/AppIcon20x20@2x.png", 900),
            entry("Payload/A.app/AppIcon60x60@3x.png", 4000),
            entry("Payload/A.app/AppIcon167x100.png", 9000),
            entry("Payload/A.app/Default.png", 50000),
            entry("Payload/A.app/Info.plist", 500),
        ];
        let assets = apple_candidates(&entries);
        assert_eq!(assets.len(), 3);
        let best = select_best(&assets).unwrap();
        assert_eq!(best.entry_path, "Payload/A.app/AppIcon60x60@3x.png");
        assert!(best.is_square());
    }

    #[test]
    fn apple_fractional_sizes_stay_square() {
        let entries = vec![
            entry("Payload/A.app/AppIcon83.5x83.5@2x~ipad.png", 9000),
            entry("Payload/A.app/AppIcon60x60@2x.png", 4000),
            entry("Payload/A.app/Banner100x40.png", 1),
        ];
        let assets = apple_candidates(&entries);
        assert_eq!(assets[0].dimensions(), Some((84, 84)));
        let best = select_best(&assets).unwrap();
        assert_eq!(best.entry_path, "Payload/A.app/AppIcon83.5x83.5@2x~ipad.png");
        assert!(best.is_square());
    }

    #[test]
    fn apple_dimensioned_beats_dimensionless() {
        let entries = vec![
            entry("Payload/A.app/icon.png", 100000),
            entry("Payload/A.app/AppIcon29x29.png", 800),
        ];
        let best = select_best(&apple_candidates(&entries)).cloned().unwrap();
        assert_eq!(best.entry_path, "Payload/A.app/AppIcon29x29.png");
    }

    #[test]
    fn apple_dimensionless_rank_by_size() {
        let entries = vec![
            entry("Payload/A.app/icon.png", 100),
            entry("Payload/A.app/AppIcon.png", 300),
            entry("Payload/A.app/app_icon.png", 300),
        ];
        let best = select_best(&apple_candidates(&entries)).cloned().unwrap();
        assert_eq!(best.entry_path, "Payload/A.app/AppIcon.png", "ties keep the first");
    }

    #[test]
    fn only_non_square_candidates_still_yield_one() {
        let entries = vec![
            entry("Payload/A.app/Icon100x50.png", 10),
            entry("Payload/A.app/Icon200x100.png", 10),
        ];
        let best = select_best(&apple_candidates(&entries)).cloned().unwrap();
        assert_eq!(best.entry_path, "Payload/A.app/Icon200x100.png");
    }

    #[test]
    fn never_non_square_when_square_exists() {
        // many orderings of a mixed pool
        let pool = vec![
            entry("Payload/A.app/Icon1024x500.png", 1),
            entry("Payload/A.app/Icon40x40.png", 1),
            entry("Payload/A.app/Icon2048x1024.png", 1),
            entry("Payload/A.app/Icon20x20.png", 1),
        ];
        for shift in 0..pool.len() {
            let mut entries = pool.clone();
            entries.rotate_left(shift);
            let best = select_best(&apple_candidates(&entries)).cloned().unwrap();
            assert!(best.is_square(), "picked {}", best.entry_path);
            assert_eq!(best.entry_path, "Payload/A.app/Icon40x40.png");
        }
    }

    #[test]
    fn no_candidates_no_selection() {
        assert!(select_best(&[]).is_none());
        assert!(apple_candidates(&[entry("Payload/A.app/Info.plist", 1)]).is_empty());
        assert!(android_candidates(&[entry("classes.dex", 1)], None).is_empty());
    }
}
