//! Still frame extraction with text overlays.

use std::path::{Path, PathBuf};

use crate::actions::text::TextOverlay;
use crate::{Error, Result, ToolCommand};

/// One still frame taken from a video or image.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    pub input: PathBuf,
    /// Timestamp for video inputs; `None` for stills.
    pub at_secs: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub overlays: Vec<TextOverlay>,
}

impl FrameSpec {
    pub fn filter_chain(&self) -> String {
        let (w, h) = (self.width, self.height);
        let mut filters = vec![
            format!("scale={w}:{h}:force_original_aspect_ratio=increase"),
            format!("crop={w}:{h}"),
            "setsar=1".to_string(),
        ];
        filters.extend(self.overlays.iter().map(TextOverlay::to_filter));
        filters.join(",")
    }

    /// Arguments after the common ffmpeg prefix.
    pub fn args(&self, output: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(at) = self.at_secs {
            args.extend(["-ss".to_string(), format!("{:.3}", at)]);
        }
        args.extend([
            "-i".to_string(),
            self.input.display().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            self.filter_chain(),
            "-update".to_string(),
            "1".to_string(),
            output.display().to_string(),
        ]);
        args
    }
}

/// Write the frame described by `spec` to `output` (PNG recommended).
pub fn extract_frame(ffmpeg: &Path, work_dir: &Path, spec: &FrameSpec, output: &Path) -> Result<PathBuf> {
    if !spec.input.exists() {
        return Err(Error::missing_input(&spec.input));
    }
    if spec.width == 0 || spec.height == 0 {
        return Err(Error::InvalidSpec(format!(
            "frame size {}x{} must be positive",
            spec.width, spec.height
        )));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(input = %spec.input.display(), at = ?spec.at_secs, "Extracting frame");

    let mut cmd = ToolCommand::ffmpeg(ffmpeg);
    cmd.args(spec.args(output)).current_dir(work_dir);
    cmd.execute_producing(output)?;

    Ok(output.to_path_buf())
}
