//! Shared helpers for integration tests.
//!
//! Builds asset directories with provenance sidecars, configs rooted in a
//! temporary directory, and (when a full `ffmpeg` is installed) real media
//! generated from lavfi test sources.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use reelsmith::config::Config;
use reelsmith::library::FETCH_MANIFEST;
use reelsmith_av::Tools;
use reelsmith_common::{Asset, License, MediaKind};

/// A config whose directories all live under `root`.
pub fn config_in(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.assets_dir = root.join("assets");
    config.paths.music_dir = root.join("assets/music");
    config.paths.output_dir = root.join("output");
    config.paths.templates_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
    config
}

/// Write a placeholder media file plus its sidecar.
pub fn write_asset(
    dir: &Path,
    name: &str,
    license: License,
    kind: MediaKind,
    secs: Option<f64>,
) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"media").unwrap();
    record_asset(&path, license, kind, secs);
    path
}

/// Write the sidecar for an existing media file.
pub fn record_asset(path: &Path, license: License, kind: MediaKind, secs: Option<f64>) {
    let stem = path.file_stem().unwrap().to_string_lossy().to_string();
    let mut asset = Asset::new(path, "pexels", license, format!("Author {stem}"), kind)
        .with_title(format!("Clip {stem}"))
        .with_source_url(format!("https://www.pexels.com/video/{stem}/"));
    if let Some(secs) = secs {
        asset = asset.with_duration(secs);
    }
    asset.write_sidecar().unwrap();
}

/// Create `<assets>/<name>` and mark it as a finished fetch.
pub fn complete_asset_dir(config: &Config, name: &str) -> PathBuf {
    let dir = config.paths.assets_dir.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(FETCH_MANIFEST), "{}").unwrap();
    dir
}

/// Five CC0 clips, each long enough for any scene of the default plan.
pub fn five_cc0_clips(dir: &Path) -> Vec<PathBuf> {
    (1..=5)
        .map(|n| write_asset(dir, &format!("clip{n}.mp4"), License::Cc0, MediaKind::Video, Some(10.0)))
        .collect()
}

/// `ffmpeg`/`ffprobe` with the `drawtext` filter, or `None` when the
/// installed build cannot run the full pipeline.
pub fn full_ffmpeg() -> Option<Tools> {
    let tools = Tools::discover(None, None).ok()?;
    tools.supports_text().then_some(tools)
}

fn ffmpeg(tools: &Tools, args: &[&str]) {
    let status = Command::new(&tools.ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(args)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg {:?} failed", args);
}

/// A silent test-pattern clip of `secs` seconds.
pub fn make_clip(tools: &Tools, path: &Path, secs: f64, width: u32, height: u32) {
    let source = format!("testsrc2=size={width}x{height}:rate=30:duration={secs}");
    ffmpeg(
        tools,
        &[
            "-f",
            "lavfi",
            "-i",
            &source,
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            path.to_str().unwrap(),
        ],
    );
}

/// A sine tone of `secs` seconds.
pub fn make_tone(tools: &Tools, path: &Path, secs: f64) {
    let source = format!("sine=frequency=220:duration={secs}");
    ffmpeg(
        tools,
        &["-f", "lavfi", "-i", &source, "-c:a", "aac", path.to_str().unwrap()],
    );
}
