//! FFprobe-based media probing.

use crate::{Error, Result, ToolCommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The facts about a media file the montage pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Path that was probed.
    pub file_path: PathBuf,
    /// Container format name (e.g. "mov,mp4,m4a,3gp,3g2,mj2").
    pub container: String,
    /// Container duration in seconds, if known. Still images have none.
    pub duration_secs: Option<f64>,
    /// Width of the first video stream.
    pub width: Option<u32>,
    /// Height of the first video stream.
    pub height: Option<u32>,
    /// Codec of the first video stream.
    pub video_codec: Option<String>,
    /// Whether any video stream exists.
    pub has_video: bool,
    /// Whether any audio stream exists.
    pub has_audio: bool,
}

impl MediaInfo {
    /// Dimensions of the first video stream, when both are known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width?, self.height?))
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: String,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Probe a media file using ffprobe.
pub fn probe_with_ffprobe(ffprobe: &Path, path: &Path) -> Result<MediaInfo> {
    if !path.exists() {
        return Err(Error::missing_input(path));
    }

    let output = ToolCommand::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .execute()?;

    parse_ffprobe_json(path, &output.stdout)
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> Result<MediaInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::parse_error("ffprobe", e.to_string()))?;

    let video = output.streams.iter().find(|s| s.codec_type == "video");
    let has_audio = output.streams.iter().any(|s| s.codec_type == "audio");

    // Some containers only report duration per stream.
    let duration_secs = output
        .format
        .duration
        .as_deref()
        .and_then(parse_secs)
        .or_else(|| {
            output
                .streams
                .iter()
                .filter_map(|s| s.duration.as_deref().and_then(parse_secs))
                .reduce(f64::max)
        });

    Ok(MediaInfo {
        file_path: path.to_path_buf(),
        container: output.format.format_name,
        duration_secs,
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        video_codec: video.and_then(|v| v.codec_name.clone()),
        has_video: video.is_some(),
        has_audio,
    })
}

fn parse_secs(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite() && *d > 0.0)
}
