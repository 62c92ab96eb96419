//! Montage assembly.
//!
//! Each scene is rendered to its own normalized segment, the segments are
//! joined with stream copy, and the soundtrack is mixed on top. Everything
//! happens in a staging workspace next to the output file; the montage is
//! probed and only then moved into place.

pub mod matcher;

pub use matcher::{assign_scenes, total_secs, SceneAssignment};

use std::path::{Path, PathBuf};

use reelsmith_av::actions::text::{stage_font, write_text_file};
use reelsmith_av::actions::{
    concat_segments, faststart, mix_soundtrack, render_segment, MixSpec, SegmentSource,
    SegmentSpec, TextOverlay, VideoFormat,
};
use reelsmith_av::{MediaInfo, Tools, Workspace};
use reelsmith_common::{Error, LicensedAsset, MediaKind, Result};
use tracing::{debug, info};

use crate::config::{AudioConfig, Config, VideoConfig};
use crate::tools::encoding;

const CAPTION_FONT: &str = "caption_font.ttf";
const CONCAT_FILE: &str = "concat.mp4";
const MIXED_FILE: &str = "mixed.mp4";

/// What came out of an assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembleReport {
    pub output: PathBuf,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub segments: usize,
    pub soundtrack: Option<String>,
}

impl From<&VideoConfig> for VideoFormat {
    fn from(video: &VideoConfig) -> Self {
        VideoFormat {
            width: video.width,
            height: video.height,
            fps: video.fps,
            crf: video.crf,
            preset: video.preset.clone(),
        }
    }
}

/// Soundtrack mix settings for a montage of `duration_secs`.
pub fn mix_spec(audio: &AudioConfig, duration_secs: f64) -> MixSpec {
    MixSpec {
        volume: audio.volume,
        fade_in: audio.fade_secs,
        fade_out: audio.fade_secs,
        duration_secs,
        bitrate: audio.bitrate.clone(),
    }
}

/// Absolute form of `path`, which must exist.
fn absolute(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        Error::configuration(format!("cannot resolve {}: {e}", path.display()))
    })
}

/// Check the probed montage against the plan.
///
/// The duration must be within `tolerance_secs` of `expected_secs` and the
/// first video stream must be exactly `width`x`height`.
pub fn check_montage(
    info: &MediaInfo,
    expected_secs: f64,
    tolerance_secs: f64,
    width: u32,
    height: u32,
) -> Result<f64> {
    if !info.has_video {
        return Err(Error::encoding("verify", "montage has no video stream"));
    }
    match info.dimensions() {
        Some((w, h)) if w == width && h == height => {}
        other => {
            return Err(Error::encoding(
                "verify",
                format!("expected {width}x{height}, found {other:?}"),
            ))
        }
    }
    let duration = info
        .duration_secs
        .ok_or_else(|| Error::encoding("verify", "montage has no duration"))?;
    if (duration - expected_secs).abs() > tolerance_secs {
        return Err(Error::encoding(
            "verify",
            format!(
                "duration {duration:.2}s is outside {expected_secs:.2}s ± {tolerance_secs:.2}s"
            ),
        ));
    }
    Ok(duration)
}

fn segment_spec(
    assignment: &SceneAssignment,
    format: &VideoFormat,
    caption: Option<TextOverlay>,
) -> Result<SegmentSpec> {
    let path = absolute(&assignment.asset.path)?;
    let source = match assignment.asset.kind {
        MediaKind::Video => SegmentSource::Video {
            path,
            offset_secs: assignment.offset_secs,
        },
        MediaKind::Image => SegmentSource::Image { path },
        MediaKind::Audio => {
            return Err(Error::configuration(format!(
                "scene {} is assigned an audio file",
                assignment.index + 1
            )))
        }
    };
    let half = assignment.duration_secs / 2.0;
    Ok(SegmentSpec {
        source,
        duration_secs: assignment.duration_secs,
        format: format.clone(),
        fade_in: assignment.scene.fade_in.min(half),
        fade_out: assignment.scene.fade_out.min(half),
        caption,
    })
}

/// Render `assignments` into `output`, mixing `soundtrack` when given.
///
/// # Errors
///
/// - [`Error::Configuration`] when captions are requested but `ffmpeg` has no
///   `drawtext` filter, or an asset path cannot be resolved
/// - [`Error::Encoding`] naming the failed step; nothing is written to
///   `output` in that case
pub fn assemble(
    config: &Config,
    tools: &Tools,
    assignments: &[SceneAssignment],
    soundtrack: Option<&LicensedAsset>,
    output: &Path,
) -> Result<AssembleReport> {
    if assignments.is_empty() {
        return Err(Error::configuration("nothing to assemble: empty scene assignment"));
    }
    let video = &config.video;
    let captions = video.captions && assignments.iter().any(|a| !a.scene.caption.trim().is_empty());
    if captions && !tools.supports_text() {
        return Err(Error::configuration(
            "ffmpeg has no drawtext filter (needs libfreetype); install a full build or set video.captions = false",
        ));
    }

    let file_name = output
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::configuration(format!("invalid output path {}", output.display())))?
        .to_string();
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;
    let output = absolute(&parent)?.join(&file_name);

    let workspace = Workspace::new_in(output.parent().unwrap_or(Path::new("."))).map_err(encoding("workspace"))?;
    let work_dir = workspace.path();
    let format = VideoFormat::from(video);

    let font = stage_font(work_dir, video.font.as_deref(), CAPTION_FONT)
        .map_err(encoding("caption font"))?;

    let mut segments = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let n = assignment.index;
        let caption_text = assignment.scene.caption.trim();
        let caption = if captions && !caption_text.is_empty() {
            let text_file = format!("caption_{n:02}.txt");
            write_text_file(work_dir, &text_file, caption_text).map_err(encoding("captions"))?;
            Some(TextOverlay::caption(text_file, video.caption_font_size).with_font(font.clone()))
        } else {
            None
        };

        let spec = segment_spec(assignment, &format, caption)?;
        let segment = format!("seg_{n:02}.mp4");
        info!(
            scene = n + 1,
            asset = %assignment.asset.file_name(),
            duration = assignment.duration_secs,
            "Rendering scene"
        );
        render_segment(&tools.ffmpeg, work_dir, &spec, &workspace.file(&segment))
            .map_err(|e| Error::encoding(format!("segment {}", n + 1), e.to_string()))?;
        segments.push(segment);
    }

    let concat = workspace.file(CONCAT_FILE);
    concat_segments(&tools.ffmpeg, work_dir, &segments, &concat).map_err(encoding("concat"))?;

    let expected = total_secs(assignments);
    let mixed = workspace.file(MIXED_FILE);
    let soundtrack_name = match soundtrack {
        Some(track) => {
            let audio = absolute(&track.path)?;
            info!(track = %track.file_name(), volume = config.audio.volume, "Mixing soundtrack");
            mix_soundtrack(&tools.ffmpeg, &concat, &audio, &mix_spec(&config.audio, expected), &mixed)
                .map_err(encoding("soundtrack"))?;
            Some(track.file_name())
        }
        None => {
            info!("No soundtrack; montage will be silent");
            faststart(&tools.ffmpeg, &concat, &mixed).map_err(encoding("faststart"))?;
            None
        }
    };

    let probed = reelsmith_av::probe(&tools.ffprobe, &mixed).map_err(encoding("verify"))?;
    let tolerance = video.tolerance_per_scene_secs * assignments.len() as f64;
    let duration = check_montage(&probed, expected, tolerance, video.width, video.height)?;
    debug!(duration, expected, tolerance, "Montage verified");

    workspace.finalize(MIXED_FILE, &output).map_err(encoding("finalize"))?;
    info!(output = %output.display(), duration, "Montage written");

    Ok(AssembleReport {
        output,
        duration_secs: duration,
        width: video.width,
        height: video.height,
        segments: segments.len(),
        soundtrack: soundtrack_name,
    })
}
