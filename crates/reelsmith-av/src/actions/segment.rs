//! Render one scene of a montage into a normalized segment.

use std::path::{Path, PathBuf};

use crate::actions::text::TextOverlay;
use crate::actions::VideoFormat;
use crate::{Error, Result, ToolCommand};

/// Source of a segment.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSource {
    /// A window of a video clip starting at `offset_secs`.
    Video { path: PathBuf, offset_secs: f64 },
    /// A still image held for the segment duration.
    Image { path: PathBuf },
}

impl SegmentSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Video { path, .. } | Self::Image { path } => path,
        }
    }
}

/// Everything needed to encode one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    pub source: SegmentSource,
    pub duration_secs: f64,
    pub format: VideoFormat,
    pub fade_in: f64,
    pub fade_out: f64,
    /// Caption overlay; text and font files must live in the working directory.
    pub caption: Option<TextOverlay>,
}

impl SegmentSpec {
    /// The `-vf` filter chain.
    pub fn filter_chain(&self) -> String {
        let VideoFormat { width, height, fps, .. } = self.format;
        let mut filters = vec![
            format!("scale={width}:{height}:force_original_aspect_ratio=increase"),
            format!("crop={width}:{height}"),
            "setsar=1".to_string(),
            format!("fps={fps}"),
            "format=yuv420p".to_string(),
        ];
        if self.fade_in > 0.0 {
            filters.push(format!("fade=t=in:st=0:d={:.3}", self.fade_in));
        }
        if self.fade_out > 0.0 {
            let start = (self.duration_secs - self.fade_out).max(0.0);
            filters.push(format!("fade=t=out:st={:.3}:d={:.3}", start, self.fade_out));
        }
        if let Some(ref caption) = self.caption {
            filters.push(caption.to_filter());
        }
        filters.join(",")
    }

    /// Arguments after the common ffmpeg prefix.
    pub fn args(&self, output: &Path) -> Vec<String> {
        let mut args = Vec::new();
        match &self.source {
            SegmentSource::Video { path, offset_secs } => {
                args.extend([
                    "-ss".to_string(),
                    format!("{:.3}", offset_secs),
                    "-t".to_string(),
                    format!("{:.3}", self.duration_secs),
                    "-i".to_string(),
                    path.display().to_string(),
                ]);
            }
            SegmentSource::Image { path } => {
                args.extend([
                    "-loop".to_string(),
                    "1".to_string(),
                    "-t".to_string(),
                    format!("{:.3}", self.duration_secs),
                    "-i".to_string(),
                    path.display().to_string(),
                ]);
            }
        }
        args.extend(["-vf".to_string(), self.filter_chain(), "-an".to_string()]);
        args.extend(self.format.encoder_args());
        args.extend(["-t".to_string(), format!("{:.3}", self.duration_secs)]);
        args.push(output.display().to_string());
        args
    }
}

/// Encode a segment into `output`, running ffmpeg inside `work_dir`.
pub fn render_segment(
    ffmpeg: &Path,
    work_dir: &Path,
    spec: &SegmentSpec,
    output: &Path,
) -> Result<PathBuf> {
    if !spec.source.path().exists() {
        return Err(Error::missing_input(spec.source.path()));
    }
    if !(spec.duration_secs > 0.0) {
        return Err(Error::InvalidSpec(format!(
            "segment duration must be positive, got {}",
            spec.duration_secs
        )));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        source = %spec.source.path().display(),
        duration = spec.duration_secs,
        "Rendering segment"
    );

    let mut cmd = ToolCommand::ffmpeg(ffmpeg);
    cmd.args(spec.args(output)).current_dir(work_dir);
    cmd.execute_producing(output)?;

    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(source: SegmentSource) -> SegmentSpec {
        SegmentSpec {
            source,
            duration_secs: 6.0,
            format: VideoFormat::default(),
            fade_in: 0.0,
            fade_out: 0.0,
            caption: None,
        }
    }

    #[test]
    fn test_video_args_seek_before_input() {
        let s = spec(SegmentSource::Video {
            path: PathBuf::from("/a/clip.mp4"),
            offset_secs: 3.25,
        });
        let args = s.args(Path::new("seg_01.mp4"));
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(&args[..i], &["-ss", "3.250", "-t", "6.000"]);
        assert_eq!(args[i + 1], "/a/clip.mp4");
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().unwrap(), "seg_01.mp4");
    }

    #[test]
    fn test_image_loops() {
        let s = spec(SegmentSource::Image {
            path: PathBuf::from("still.jpg"),
        });
        let args = s.args(Path::new("seg_00.mp4"));
        assert_eq!(&args[..2], &["-loop", "1"]);
    }

    #[test]
    fn test_filter_chain_scales_then_crops() {
        let mut s = spec(SegmentSource::Image {
            path: PathBuf::from("still.jpg"),
        });
        s.fade_in = 0.5;
        s.fade_out = 1.0;
        s.caption = Some(TextOverlay::caption("caption_00.txt", 48));
        let chain = s.filter_chain();
        assert!(chain.starts_with(
            "scale=1920:1080:force_original_aspect_ratio=increase,crop=1920:1080,setsar=1,fps=30,format=yuv420p"
        ));
        assert!(chain.contains("fade=t=in:st=0:d=0.500"));
        assert!(chain.contains("fade=t=out:st=5.000:d=1.000"));
        assert!(chain.ends_with("boxborderw=16"));
    }

    #[test]
    fn test_render_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let s = spec(SegmentSource::Video {
            path: dir.path().join("missing.mp4"),
            offset_secs: 0.0,
        });
        let err = render_segment(Path::new("ffmpeg"), dir.path(), &s, &dir.path().join("o.mp4"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }
}
