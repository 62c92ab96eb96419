//! Finished run directories.
//!
//! `output/<run-id>/` holds exactly one montage, one thumbnail and one
//! metadata file. `manifest.json` is written last and lists the size and
//! SHA-256 digest of each; a directory without it is incomplete.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reelsmith_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::metadata::MetadataRecord;

pub const MONTAGE_FILE: &str = "montage.mp4";
pub const THUMBNAIL_FILE: &str = "thumbnail.jpg";
pub const METADATA_FILE: &str = "metadata.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// The artifacts every finished run contains.
pub const ARTIFACTS: [&str; 3] = [MONTAGE_FILE, THUMBNAIL_FILE, METADATA_FILE];

/// One file listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub artifacts: Vec<ArtifactEntry>,
    /// Number of credit lines in the metadata.
    pub credits: usize,
    /// Asset file names in scene order.
    pub assets: Vec<String>,
    pub soundtrack: Option<String>,
}

impl RunManifest {
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|_| Error::OutputIncomplete {
            dir: dir.to_path_buf(),
            missing: vec![MANIFEST_FILE.to_string()],
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// What a run contributes to its manifest besides the artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    pub duration_secs: f64,
    /// Credit lines the metadata must contain, in any order.
    pub expected_credits: Vec<String>,
    pub assets: Vec<String>,
    pub soundtrack: Option<String>,
}

/// Directory of run `run_id` under `output_root`.
pub fn run_dir(output_root: &Path, run_id: &str) -> PathBuf {
    output_root.join(run_id)
}

/// Prepare `dir` for a new run: create it and drop a stale manifest so the
/// directory reads as incomplete until the run finishes.
pub fn begin_run(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let manifest = dir.join(MANIFEST_FILE);
    if manifest.exists() {
        warn!("Removing manifest of an earlier run in {:?}", dir);
        std::fs::remove_file(manifest)?;
    }
    Ok(())
}

/// SHA-256 of a file, hex encoded.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Artifacts that are missing or empty.
fn missing_artifacts(dir: &Path) -> Vec<String> {
    ARTIFACTS
        .iter()
        .filter(|name| {
            !std::fs::metadata(dir.join(name))
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false)
        })
        .map(|name| name.to_string())
        .collect()
}

fn check_credits(dir: &Path, expected: &[String]) -> Result<usize> {
    let record = MetadataRecord::read(&dir.join(METADATA_FILE))?;
    let found: BTreeSet<&String> = record.credits.iter().collect();
    let wanted: BTreeSet<&String> = expected.iter().collect();
    if found != wanted {
        let mut missing: Vec<String> = wanted
            .difference(&found)
            .map(|c| format!("credit: {c}"))
            .collect();
        missing.extend(found.difference(&wanted).map(|c| format!("unexpected credit: {c}")));
        return Err(Error::OutputIncomplete {
            dir: dir.to_path_buf(),
            missing,
        });
    }
    Ok(record.credits.len())
}

/// Check the artifacts and write `manifest.json`.
///
/// # Errors
///
/// [`Error::OutputIncomplete`] when an artifact is missing or empty, or when
/// the metadata credits differ from `summary.expected_credits`.
pub fn finalize(dir: &Path, summary: &RunSummary) -> Result<RunManifest> {
    let missing = missing_artifacts(dir);
    if !missing.is_empty() {
        return Err(Error::OutputIncomplete {
            dir: dir.to_path_buf(),
            missing,
        });
    }
    let credits = check_credits(dir, &summary.expected_credits)?;

    let artifacts = ARTIFACTS
        .iter()
        .map(|name| {
            let path = dir.join(name);
            Ok(ArtifactEntry {
                name: name.to_string(),
                bytes: std::fs::metadata(&path)?.len(),
                sha256: sha256_file(&path)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let manifest = RunManifest {
        run_id: summary.run_id.clone(),
        created_at: Utc::now(),
        duration_secs: summary.duration_secs,
        artifacts,
        credits,
        assets: summary.assets.clone(),
        soundtrack: summary.soundtrack.clone(),
    };

    let tmp = dir.join(format!("{MANIFEST_FILE}.tmp"));
    std::fs::write(&tmp, serde_json::to_string_pretty(&manifest)? + "\n")?;
    std::fs::rename(&tmp, dir.join(MANIFEST_FILE))?;
    info!(dir = %dir.display(), run_id = %manifest.run_id, "Run complete");
    Ok(manifest)
}

/// Re-check a finished run directory against its manifest.
///
/// # Errors
///
/// [`Error::OutputIncomplete`] listing every missing artifact, the manifest
/// itself when absent, and every artifact whose size or digest changed.
pub fn verify(dir: &Path) -> Result<RunManifest> {
    let manifest = RunManifest::read(dir)?;
    let mut problems = missing_artifacts(dir);

    for name in ARTIFACTS {
        if problems.iter().any(|p| p == name) {
            continue;
        }
        let Some(entry) = manifest.artifacts.iter().find(|a| a.name == name) else {
            problems.push(format!("{name} (not in manifest)"));
            continue;
        };
        let path = dir.join(name);
        let bytes = std::fs::metadata(&path)?.len();
        if bytes != entry.bytes || sha256_file(&path)? != entry.sha256 {
            problems.push(format!("{name} (changed since the run)"));
        } else {
            debug!(artifact = name, "Digest matches");
        }
    }

    if problems.is_empty() {
        Ok(manifest)
    } else {
        Err(Error::OutputIncomplete {
            dir: dir.to_path_buf(),
            missing: problems,
        })
    }
}
