//! Deterministic scene-to-asset assignment.
//!
//! Both the assembler and the metadata generator consume the same
//! assignment, so chapters and credits always describe the cut that is
//! rendered.

use std::collections::BTreeSet;

use reelsmith_common::{Error, LicensedAsset, MediaKind, Result, ScenePlanEntry};
use serde::Serialize;

use crate::library::AssetLibrary;

/// One scene of the plan bound to the asset that fills it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneAssignment {
    /// Zero-based position in the plan.
    pub index: usize,
    pub scene: ScenePlanEntry,
    #[serde(serialize_with = "serialize_file_name")]
    pub asset: LicensedAsset,
    /// Rendered length of the scene.
    pub duration_secs: f64,
    /// Start of the window inside a video clip; 0 for stills.
    pub offset_secs: f64,
}

fn serialize_file_name<S: serde::Serializer>(
    asset: &LicensedAsset,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&asset.file_name())
}

impl SceneAssignment {
    fn new(index: usize, scene: &ScenePlanEntry, asset: &LicensedAsset) -> Self {
        let (duration_secs, offset_secs) = match (asset.kind, asset.duration_secs) {
            (MediaKind::Video, Some(d)) => {
                let duration = scene.max_secs.min(d);
                (duration, ((d - duration) / 2.0).max(0.0))
            }
            _ => (scene.max_secs, 0.0),
        };
        Self {
            index,
            scene: scene.clone(),
            asset: asset.clone(),
            duration_secs,
            offset_secs,
        }
    }

    /// Start of this scene in the montage, given the scenes before it.
    pub fn start_secs(assignments: &[SceneAssignment], index: usize) -> f64 {
        assignments[..index.min(assignments.len())]
            .iter()
            .map(|a| a.duration_secs)
            .sum()
    }
}

/// Planned length of the whole montage.
pub fn total_secs(assignments: &[SceneAssignment]) -> f64 {
    assignments.iter().map(|a| a.duration_secs).sum()
}

/// Whether `asset` can fill `scene`: stills fit anything, clips must be at
/// least `min_secs` long.
fn fits(scene: &ScenePlanEntry, asset: &LicensedAsset) -> bool {
    match asset.kind {
        MediaKind::Image => true,
        MediaKind::Video => asset.duration_secs.is_some_and(|d| d >= scene.min_secs),
        MediaKind::Audio => false,
    }
}

/// Assign a distinct asset to every scene.
///
/// Declared mappings are honoured first. Remaining scenes, in plan order,
/// take the unused clip with the smallest sufficient duration (ties broken
/// by path), falling back to stills.
///
/// # Errors
///
/// - [`Error::LicenseViolation`] when a declared asset has a disallowed license
/// - [`Error::Configuration`] when a declared asset is missing, reused, or too short
/// - [`Error::InsufficientAssets`] when a scene cannot be filled
pub fn assign_scenes(
    plan: &[ScenePlanEntry],
    library: &AssetLibrary,
) -> Result<Vec<SceneAssignment>> {
    let mut slots: Vec<Option<SceneAssignment>> = vec![None; plan.len()];
    let mut used: BTreeSet<String> = BTreeSet::new();

    for (index, scene) in plan.iter().enumerate() {
        let Some(ref name) = scene.asset else {
            continue;
        };
        if let Some(rejected) = library.find_rejected(name) {
            return Err(Error::LicenseViolation {
                path: rejected.path.clone(),
                license: rejected.license.clone(),
            });
        }
        let asset = library.visual(name).ok_or_else(|| {
            Error::configuration(format!(
                "scene {} is mapped to {name:?}, which is not a usable visual asset in {}",
                index + 1,
                library.dir.display()
            ))
        })?;
        if !used.insert(name.clone()) {
            return Err(Error::configuration(format!(
                "asset {name:?} is mapped to more than one scene"
            )));
        }
        if !fits(scene, asset) {
            return Err(Error::configuration(format!(
                "asset {name:?} is shorter than the {}s minimum of scene {}",
                scene.min_secs,
                index + 1
            )));
        }
        slots[index] = Some(SceneAssignment::new(index, scene, asset));
    }

    for (index, scene) in plan.iter().enumerate() {
        if slots[index].is_some() {
            continue;
        }
        let best = library
            .visuals
            .iter()
            .filter(|a| !used.contains(&a.file_name()) && fits(scene, a))
            .min_by(|a, b| {
                sort_key(a)
                    .partial_cmp(&sort_key(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(asset) = best else {
            return Err(Error::InsufficientAssets {
                required: plan.len(),
                available: library.visuals.len(),
            });
        };
        used.insert(asset.file_name());
        slots[index] = Some(SceneAssignment::new(index, scene, asset));
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Clips before stills, shortest sufficient clip first, then by path.
fn sort_key(asset: &LicensedAsset) -> (u8, f64, &std::path::Path) {
    match asset.kind {
        MediaKind::Video => (0, asset.duration_secs.unwrap_or(f64::MAX), asset.path.as_path()),
        _ => (1, 0.0, asset.path.as_path()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsmith_common::{Asset, License, LicenseSet, SceneRole};
    use std::path::PathBuf;

    fn video(name: &str, secs: f64) -> LicensedAsset {
        Asset::new(format!("/a/{name}"), "pexels", License::Cc0, "Ana", MediaKind::Video)
            .with_duration(secs)
            .into_licensed(&LicenseSet::default())
            .unwrap()
    }

    fn image(name: &str) -> LicensedAsset {
        Asset::new(format!("/a/{name}"), "openverse", License::CcBy, "Rui", MediaKind::Image)
            .into_licensed(&LicenseSet::default())
            .unwrap()
    }

    fn library(visuals: Vec<LicensedAsset>) -> AssetLibrary {
        AssetLibrary {
            dir: PathBuf::from("/a"),
            visuals,
            ..Default::default()
        }
    }

    fn plan() -> Vec<ScenePlanEntry> {
        vec![
            ScenePlanEntry::fixed(SceneRole::Open, 4.0, "open"),
            ScenePlanEntry::fixed(SceneRole::Cut, 6.0, "cut"),
            ScenePlanEntry::fixed(SceneRole::End, 3.0, "end"),
        ]
    }

    #[test]
    fn test_smallest_sufficient_clip_wins() {
        let lib = library(vec![video("long.mp4", 30.0), video("short.mp4", 5.0), video("mid.mp4", 8.0)]);
        let assignments = assign_scenes(&plan(), &lib).unwrap();
        let names: Vec<String> = assignments.iter().map(|a| a.asset.file_name()).collect();
        assert_eq!(names, vec!["short.mp4", "mid.mp4", "long.mp4"]);
        assert_eq!(assignments[0].duration_secs, 4.0);
        assert_eq!(assignments[0].offset_secs, 0.5);
        assert_eq!(total_secs(&assignments), 13.0);
        assert_eq!(SceneAssignment::start_secs(&assignments, 2), 10.0);
    }

    #[test]
    fn test_images_fill_when_clips_run_out() {
        let lib = library(vec![video("a.mp4", 10.0), image("still.jpg"), image("b.jpg")]);
        let assignments = assign_scenes(&plan(), &lib).unwrap();
        assert_eq!(assignments[1].asset.file_name(), "b.jpg");
        assert_eq!(assignments[2].asset.file_name(), "still.jpg");
        assert_eq!(assignments[2].offset_secs, 0.0);
    }

    #[test]
    fn test_insufficient_assets() {
        let lib = library(vec![video("a.mp4", 10.0), video("b.mp4", 2.0)]);
        let err = assign_scenes(&plan(), &lib).unwrap_err();
        assert!(matches!(err, Error::InsufficientAssets { required: 3, available: 2 }));
    }

    #[test]
    fn test_declared_mapping_first() {
        let mut plan = plan();
        plan[0] = plan[0].clone().with_asset("long.mp4");
        let lib = library(vec![video("long.mp4", 30.0), video("x.mp4", 6.0), video("y.mp4", 7.0)]);
        let assignments = assign_scenes(&plan, &lib).unwrap();
        assert_eq!(assignments[0].asset.file_name(), "long.mp4");
        assert_eq!(assignments[0].offset_secs, 13.0);
        assert_eq!(assignments[1].asset.file_name(), "x.mp4");
    }

    #[test]
    fn test_declared_disallowed_asset_is_violation() {
        let mut plan = plan();
        plan[1] = plan[1].clone().with_asset("nc.mp4");
        let mut lib = library(vec![video("a.mp4", 10.0)]);
        lib.rejected.push(Asset::new(
            "/a/nc.mp4",
            "openverse",
            License::Other("by-nc".into()),
            "X",
            MediaKind::Video,
        ));
        let err = assign_scenes(&plan, &lib).unwrap_err();
        assert!(matches!(err, Error::LicenseViolation { .. }));
    }

    #[test]
    fn test_declared_duplicate_is_configuration_error() {
        let mut plan = plan();
        plan[0] = plan[0].clone().with_asset("a.mp4");
        plan[1] = plan[1].clone().with_asset("a.mp4");
        let lib = library(vec![video("a.mp4", 10.0)]);
        assert!(matches!(assign_scenes(&plan, &lib), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_deterministic() {
        let lib = library(vec![video("b.mp4", 8.0), video("a.mp4", 8.0), video("c.mp4", 8.0)]);
        let first = assign_scenes(&plan(), &lib).unwrap();
        let second = assign_scenes(&plan(), &lib).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].asset.file_name(), "a.mp4");
    }
}
