//! Encoding tool lookup for the pipeline stages.

use reelsmith_av::Tools;
use reelsmith_common::{Error, Result};

use crate::config::Config;

/// Resolve `ffmpeg` and `ffprobe`, preferring the paths in `[tools]`.
pub fn discover(config: &Config) -> Result<Tools> {
    Tools::discover(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )
    .map_err(|e| {
        Error::configuration(format!(
            "{e}; install ffmpeg or set tools.ffmpeg_path / tools.ffprobe_path"
        ))
    })
}

/// Map a tool-level error to [`Error::Encoding`] naming `step`. A tool that
/// vanished mid-run is a [`Error::Configuration`] problem instead.
pub fn encoding(step: &'static str) -> impl Fn(reelsmith_av::Error) -> Error {
    move |e| {
        if e.is_missing_tool() {
            Error::configuration(format!("{step}: {e}"))
        } else {
            Error::encoding(step, e.to_string())
        }
    }
}
