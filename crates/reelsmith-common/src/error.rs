//! Error kinds shared by every pipeline stage.
//!
//! Each stage fails fast on its own kind: configuration problems surface
//! before any network call, provider failures name the provider and search
//! term, and encoding failures name the step that broke.

use std::path::PathBuf;

use crate::License;

/// Common error type for reelsmith.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid API key, template, scene plan, or path.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stock-media provider was unreachable, rejected the request, or had
    /// no licensed results.
    #[error("Provider error ({provider}, term {term:?}): {message}")]
    Provider {
        provider: String,
        term: String,
        message: String,
    },

    /// An asset's license is outside the allowed set.
    #[error("License violation: {} is licensed {license}", path.display())]
    LicenseViolation { path: PathBuf, license: License },

    /// The external media tool failed or produced unusable output.
    #[error("Encoding error in {step}: {message}")]
    Encoding { step: String, message: String },

    /// One of the final artifacts is missing after a run.
    #[error("Output incomplete in {}: missing {}", dir.display(), missing.join(", "))]
    OutputIncomplete { dir: PathBuf, missing: Vec<String> },

    /// The scene plan needs more licensed assets than are available.
    #[error("Insufficient assets: scene plan needs {required}, only {available} usable")]
    InsufficientAssets { required: usize, available: usize },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be read or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new Configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new Provider error.
    pub fn provider(
        provider: impl Into<String>,
        term: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            term: term.into(),
            message: message.into(),
        }
    }

    /// Create a new Encoding error.
    pub fn encoding(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Provider { .. } => "provider",
            Self::LicenseViolation { .. } => "license_violation",
            Self::Encoding { .. } => "encoding",
            Self::OutputIncomplete { .. } => "output_incomplete",
            Self::InsufficientAssets { .. } => "insufficient_assets",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
