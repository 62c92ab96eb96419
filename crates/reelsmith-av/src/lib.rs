//! # reelsmith-av
//!
//! Thin wrappers around `ffmpeg` and `ffprobe` for building short montages.
//!
//! This crate provides:
//! - Tool discovery (`ffmpeg`, `ffprobe`, and whether `drawtext` is compiled in)
//! - Probing media files for duration, dimensions and streams
//! - `{name}` template substitution
//! - A staging workspace whose outputs are moved into place only on success
//! - Encoding actions: scene segments, concatenation, soundtrack mixing,
//!   frame extraction and tone synthesis
//!
//! ## Features
//!
//! - `tracing` (default) - Log tool invocations with `tracing`
//!
//! ## Example
//!
//! ```no_run
//! use reelsmith_av::{probe, Tools};
//!
//! let tools = Tools::discover(None, None)?;
//! let info = probe(&tools.ffprobe, "/path/to/clip.mp4")?;
//! println!("duration: {:?}", info.duration_secs);
//! # Ok::<(), reelsmith_av::Error>(())
//! ```

pub mod actions;
mod command;
mod error;
pub mod probe;
pub mod template;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use probe::MediaInfo;
pub use template::TemplateContext;
pub use tools::{check_tool, check_tool_at, check_tools, has_filter, require_tool, ToolInfo, Tools};
pub use workspace::Workspace;

/// Probe a media file with the given `ffprobe` binary.
pub fn probe<P: AsRef<std::path::Path>>(ffprobe: &std::path::Path, path: P) -> Result<MediaInfo> {
    probe::probe_with_ffprobe(ffprobe, path.as_ref())
}
