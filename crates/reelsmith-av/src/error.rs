//! Failures of the encoding building blocks.
//!
//! These carry the tool and file involved but not the pipeline step; the
//! caller names the step (segment, concat, soundtrack, frame, ...) when it
//! converts them.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `ffmpeg` or `ffprobe` could not be located or spawned.
    #[error("{tool} is not installed or not on PATH")]
    ToolNotFound { tool: String },

    /// Non-zero exit; `message` is the tail of stderr.
    #[error("{tool} exited with an error: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("could not read {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// A clip, still, soundtrack or font handed to an action does not exist.
    #[error("media input {} does not exist", path.display())]
    MissingInput { path: PathBuf },

    /// The tool exited cleanly but left no file, or an empty one.
    #[error("{} was not written or is empty", path.display())]
    MissingOutput { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("ffprobe JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An action was asked for something it cannot render, such as an empty
    /// concat list or a non-positive duration.
    #[error("cannot render: {0}")]
    InvalidSpec(String),

    #[error("staging workspace: {0}")]
    Workspace(String),
}

impl Error {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// Whether the failure is about the environment (a missing tool) rather
    /// than the media being encoded.
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }
}
