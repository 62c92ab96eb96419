//! Encoding actions.
//!
//! Each action builds one ffmpeg invocation:
//! - Scene segments (trim or loop, scale and crop, fades, captions)
//! - Concatenation of segments
//! - Soundtrack mixing
//! - Still frame extraction
//! - Ambient tone synthesis

mod concat;
mod frame;
mod segment;
mod soundtrack;
pub mod text;
mod tone;

pub use concat::{concat_list, concat_segments};
pub use frame::{extract_frame, FrameSpec};
pub use segment::{render_segment, SegmentSource, SegmentSpec};
pub use soundtrack::{faststart, mix_soundtrack, MixSpec};
pub use text::{TextOverlay, TextPosition};
pub use tone::{synthesize_ambient, AmbientSpec};

/// Output video format shared by every segment of a montage.
///
/// Segments are joined with stream copy, so they must agree on all of these.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub crf: u8,
    pub preset: String,
}

impl Default for VideoFormat {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            crf: 20,
            preset: "veryfast".to_string(),
        }
    }
}

impl VideoFormat {
    /// libx264 encoder arguments.
    pub fn encoder_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            self.fps.to_string(),
        ]
    }
}
