//! Asset directories written by the fetcher.
//!
//! A complete asset directory holds media files, one provenance sidecar per
//! file, `credits.txt`, and `fetch.json`. The fetch manifest is written last,
//! so later stages only accept directories that contain it.

use std::path::{Path, PathBuf};

use reelsmith_common::paths::{is_sidecar, media_kind, parse_dated_dir_name};
use reelsmith_common::{Asset, Error, LicenseSet, LicensedAsset, MediaKind, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Marks an asset directory as complete.
pub const FETCH_MANIFEST: &str = "fetch.json";

/// Sorted, deduplicated attribution lines of everything fetched.
pub const CREDITS_FILE: &str = "credits.txt";

/// Licensed assets found in one directory.
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    pub dir: PathBuf,
    /// Video clips and stills, sorted by path.
    pub visuals: Vec<LicensedAsset>,
    /// Audio tracks, sorted by path.
    pub audio: Vec<LicensedAsset>,
    /// Assets excluded because of their license.
    pub rejected: Vec<Asset>,
}

impl AssetLibrary {
    /// Find a usable visual asset by file name.
    pub fn visual(&self, file_name: &str) -> Option<&LicensedAsset> {
        self.visuals.iter().find(|a| a.file_name() == file_name)
    }

    /// Find an excluded asset by file name.
    pub fn find_rejected(&self, file_name: &str) -> Option<&Asset> {
        self.rejected.iter().find(|a| a.file_name() == file_name)
    }
}

/// Whether `dir` is a finished fetch.
pub fn is_complete(dir: &Path) -> bool {
    dir.join(FETCH_MANIFEST).is_file()
}

/// Load every media file with a sidecar in `dir` and check its license.
///
/// Files without a readable sidecar have no provenance and are skipped with a
/// warning. Videos must carry a duration. Disallowed licenses are reported
/// and kept in [`AssetLibrary::rejected`].
pub fn load_assets(dir: &Path, allowed: &LicenseSet) -> Result<AssetLibrary> {
    if !dir.is_dir() {
        return Err(Error::configuration(format!(
            "asset directory does not exist: {}",
            dir.display()
        )));
    }

    let mut library = AssetLibrary {
        dir: dir.to_path_buf(),
        ..Default::default()
    };

    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in entries {
        let path = entry.path();
        if is_sidecar(path) || media_kind(path).is_none() {
            continue;
        }

        let asset = match Asset::read_sidecar(path) {
            Ok(asset) => asset,
            Err(e) => {
                warn!("Skipping {:?}: no usable provenance ({})", path, e);
                continue;
            }
        };

        if asset.kind == MediaKind::Video && asset.duration_secs.is_none() {
            warn!("Skipping {:?}: no duration recorded", path);
            continue;
        }

        if !allowed.allows(&asset.license) {
            warn!("Excluding {:?}: license {} is not allowed", path, asset.license);
            library.rejected.push(asset);
            continue;
        }

        let licensed = asset.into_licensed(allowed)?;
        debug!(asset = %licensed.file_name(), license = %licensed.license, "Loaded asset");
        match licensed.kind {
            MediaKind::Audio => library.audio.push(licensed),
            MediaKind::Video | MediaKind::Image => library.visuals.push(licensed),
        }
    }

    Ok(library)
}

/// The newest complete asset directory under `root`.
///
/// Directories named `YYYY-MM-DD` win, newest date first; otherwise the most
/// recently modified complete directory is used.
pub fn latest_asset_dir(root: &Path) -> Result<PathBuf> {
    let mut dated: Vec<(chrono::NaiveDate, PathBuf)> = Vec::new();
    let mut other: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();

    let entries = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir());

    for entry in entries {
        let path = entry.path();
        if !is_complete(path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if let Some(date) = parse_dated_dir_name(&name) {
            dated.push((date, path.to_path_buf()));
        } else if let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) {
            other.push((modified, path.to_path_buf()));
        }
    }

    if let Some((_, path)) = dated.into_iter().max() {
        return Ok(path);
    }
    other
        .into_iter()
        .max()
        .map(|(_, path)| path)
        .ok_or_else(|| {
            Error::configuration(format!(
                "no complete asset directory (with {FETCH_MANIFEST}) under {}; run `reelsmith fetch` first",
                root.display()
            ))
        })
}

/// Use `explicit` if given (it must be complete), otherwise the latest one.
pub fn resolve_asset_dir(explicit: Option<&Path>, root: &Path) -> Result<PathBuf> {
    match explicit {
        Some(dir) if is_complete(dir) => Ok(dir.to_path_buf()),
        Some(dir) => Err(Error::configuration(format!(
            "{} is not a complete asset directory (missing {FETCH_MANIFEST})",
            dir.display()
        ))),
        None => latest_asset_dir(root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsmith_common::License;
    use tempfile::tempdir;

    fn write_asset(dir: &Path, name: &str, license: License, kind: MediaKind, secs: Option<f64>) {
        let path = dir.join(name);
        std::fs::write(&path, b"media").unwrap();
        let mut asset = Asset::new(&path, "pexels", license, "Ana", kind);
        if let Some(secs) = secs {
            asset = asset.with_duration(secs);
        }
        asset.write_sidecar().unwrap();
    }

    #[test]
    fn test_load_assets_filters_and_sorts() {
        let dir = tempdir().unwrap();
        write_asset(dir.path(), "b.mp4", License::Cc0, MediaKind::Video, Some(9.0));
        write_asset(dir.path(), "a.jpg", License::CcBy, MediaKind::Image, None);
        write_asset(dir.path(), "nc.mp4", License::Other("by-nc".into()), MediaKind::Video, Some(9.0));
        write_asset(dir.path(), "song.mp3", License::Cc0, MediaKind::Audio, Some(60.0));
        write_asset(dir.path(), "nodur.mp4", License::Cc0, MediaKind::Video, None);
        std::fs::write(dir.path().join("orphan.mp4"), b"no sidecar").unwrap();
        std::fs::write(dir.path().join(CREDITS_FILE), b"x").unwrap();

        let lib = load_assets(dir.path(), &LicenseSet::default()).unwrap();
        let names: Vec<String> = lib.visuals.iter().map(|a| a.file_name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.mp4"]);
        assert_eq!(lib.audio.len(), 1);
        assert_eq!(lib.rejected.len(), 1);
        assert!(lib.find_rejected("nc.mp4").is_some());
        assert!(lib.visual("nc.mp4").is_none());
    }

    #[test]
    fn test_cc0_only_set_rejects_cc_by() {
        let dir = tempdir().unwrap();
        write_asset(dir.path(), "a.jpg", License::CcBy, MediaKind::Image, None);
        let cc0 = LicenseSet::new(vec![License::Cc0]).unwrap();
        let lib = load_assets(dir.path(), &cc0).unwrap();
        assert!(lib.visuals.is_empty());
        assert_eq!(lib.rejected.len(), 1);
    }

    #[test]
    fn test_latest_asset_dir_prefers_newest_date() {
        let root = tempdir().unwrap();
        for name in ["2025-08-20", "2025-08-22", "2025-08-23", "music"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }
        std::fs::write(root.path().join("2025-08-20").join(FETCH_MANIFEST), "{}").unwrap();
        std::fs::write(root.path().join("2025-08-22").join(FETCH_MANIFEST), "{}").unwrap();
        // 2025-08-23 is incomplete.

        let latest = latest_asset_dir(root.path()).unwrap();
        assert_eq!(latest, root.path().join("2025-08-22"));
    }

    #[test]
    fn test_no_complete_dir() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join(".2025-08-22.partial")).unwrap();
        assert!(matches!(latest_asset_dir(root.path()), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_resolve_explicit_requires_manifest() {
        let root = tempdir().unwrap();
        let err = resolve_asset_dir(Some(root.path()), root.path()).unwrap_err();
        assert!(err.to_string().contains(FETCH_MANIFEST));
    }
}
