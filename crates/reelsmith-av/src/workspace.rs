//! Staging workspace for encoding steps.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Staging directory for intermediate and final files of one stage.
///
/// The directory is created next to the final destination so finished files
/// can be renamed into place. Anything not finalized is removed when the
/// workspace is dropped, so a failed stage never leaves partial output behind.
///
/// # Example
///
/// ```no_run
/// use reelsmith_av::Workspace;
///
/// let workspace = Workspace::new_in("/content/output/2025-08-22")?;
/// let montage = workspace.file("montage.mp4");
/// // ... encode into `montage` ...
/// workspace.finalize("montage.mp4", "/content/output/2025-08-22/montage.mp4".as_ref())?;
/// # Ok::<(), reelsmith_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace inside `parent`, creating `parent` if needed.
    pub fn new_in<P: AsRef<Path>>(parent: P) -> Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Workspace(format!("Failed to create {}: {}", parent.display(), e))
        })?;
        let temp_dir = tempfile::Builder::new()
            .prefix(".reelsmith-")
            .tempdir_in(parent)
            .map_err(|e| Error::Workspace(e.to_string()))?;
        Ok(Self { temp_dir })
    }

    /// Get the workspace directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of a file with the given name inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Move the workspace file `name` to `dest`.
    ///
    /// An existing file at `dest` is moved aside to `<dest>.bak` first and
    /// restored if the move fails.
    pub fn finalize(&self, name: &str, dest: &Path) -> Result<PathBuf> {
        let output_path = self.file(name);
        let produced = std::fs::metadata(&output_path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(Error::Workspace(format!(
                "Output file does not exist or is empty: {:?}",
                output_path
            )));
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if dest.exists() {
            let backup = backup_path(dest);
            std::fs::rename(dest, &backup).map_err(|e| {
                Error::Workspace(format!("Failed to create backup of {:?}: {}", dest, e))
            })?;

            if let Err(e) = move_file(&output_path, dest) {
                let _ = std::fs::rename(&backup, dest);
                return Err(Error::Workspace(format!(
                    "Failed to move output to destination: {}",
                    e
                )));
            }

            let _ = std::fs::remove_file(&backup);
        } else {
            move_file(&output_path, dest).map_err(|e| {
                Error::Workspace(format!("Failed to move output to destination: {}", e))
            })?;
        }

        Ok(dest.to_path_buf())
    }

    /// Discard the workspace and everything in it.
    pub fn cleanup(self) {
        drop(self.temp_dir);
    }
}

fn backup_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Rename, falling back to copy + remove when `dest` is on another filesystem.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}
