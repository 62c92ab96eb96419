//! Path utilities for the asset directory handoff.
//!
//! Media kind detection by extension, provenance sidecar naming, and the
//! dated directory names the fetcher writes (`assets/2025-08-22/`).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::MediaKind;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv"];

/// List of supported image file extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// List of supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "aac", "ogg"];

/// Suffix appended to a media file name to form its sidecar name.
pub const SIDECAR_SUFFIX: &str = ".provenance.json";

/// Date format of fetch directory names.
const DATE_DIR_FORMAT: &str = "%Y-%m-%d";

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Detect the media kind of a path from its extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use reelsmith_common::MediaKind;
/// use reelsmith_common::paths::media_kind;
///
/// assert_eq!(media_kind(Path::new("clip.MP4")), Some(MediaKind::Video));
/// assert_eq!(media_kind(Path::new("still.jpg")), Some(MediaKind::Image));
/// assert_eq!(media_kind(Path::new("song.mp3")), Some(MediaKind::Audio));
/// assert_eq!(media_kind(Path::new("credits.txt")), None);
/// ```
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = extension_lower(path)?;
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Sidecar path for a media file.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use reelsmith_common::paths::sidecar_path;
///
/// assert_eq!(
///     sidecar_path(Path::new("/assets/clip.mp4")),
///     PathBuf::from("/assets/clip.mp4.provenance.json")
/// );
/// ```
pub fn sidecar_path(media: &Path) -> PathBuf {
    let mut name = media.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Check if a path is a provenance sidecar.
pub fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(SIDECAR_SUFFIX))
        .unwrap_or(false)
}

/// Check if a file name looks like an ultra-HD rendition.
///
/// Stock providers encode the resolution in download names
/// (`..._3840_2160_25fps.mp4`).
pub fn is_uhd_filename(name: &str) -> bool {
    let n = name.to_lowercase();
    ["3840_2160", "4096_", "uhd"].iter().any(|tok| n.contains(tok))
}

/// Directory name for a fetch on `date`.
#[must_use]
pub fn dated_dir_name(date: NaiveDate) -> String {
    date.format(DATE_DIR_FORMAT).to_string()
}

/// Parse a fetch directory name back into its date.
pub fn parse_dated_dir_name(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, DATE_DIR_FORMAT).ok()
}

/// Make a string safe to use as a file name component.
///
/// Spaces become underscores; anything outside `[A-Za-z0-9._-]` is dropped.
///
/// ```
/// use reelsmith_common::paths::sanitize_component;
///
/// assert_eq!(sanitize_component("kitesurf drone"), "kitesurf_drone");
/// assert_eq!(sanitize_component("a/b?c"), "abc");
/// ```
pub fn sanitize_component(s: &str) -> String {
    s.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect()
}
