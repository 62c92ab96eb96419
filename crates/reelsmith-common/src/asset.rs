//! Downloaded media assets and their provenance sidecars.
//!
//! Every media file in an asset directory has a JSON sidecar next to it
//! (`clip.mp4` -> `clip.mp4.provenance.json`) recording where it came from and
//! under which license. Assets are never mutated after the fetcher writes them.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::sidecar_path;
use crate::{Error, License, LicenseSet, Result};

/// Kind of media an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A video clip.
    Video,
    /// A still image.
    Image,
    /// An audio track.
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// A downloaded media file plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Local path of the media file. Not stored in the sidecar.
    #[serde(skip)]
    pub path: PathBuf,
    /// Provider the asset came from (e.g. "pexels").
    pub source: String,
    /// License tag reported by the provider.
    pub license: License,
    /// Creator name.
    pub author: String,
    /// Work title, when the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Landing page of the asset at the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Media kind.
    pub kind: MediaKind,
    /// Provider-specific identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    /// Search term that found the asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    /// Pixel width, for video and images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height, for video and images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Duration in seconds, for video and audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl Asset {
    /// Create an asset with the required provenance fields.
    pub fn new(
        path: impl Into<PathBuf>,
        source: impl Into<String>,
        license: License,
        author: impl Into<String>,
        kind: MediaKind,
    ) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            license,
            author: author.into(),
            title: None,
            source_url: None,
            kind,
            provider_id: None,
            term: None,
            width: None,
            height: None,
            duration_secs: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_provider_id(mut self, id: impl Into<String>) -> Self {
        self.provider_id = Some(id.into());
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// File name of the media file.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// The credit line for this asset.
    ///
    /// Format: `"Title" by Author (CC-BY) via pexels: https://...`, with the
    /// title and URL parts omitted when unknown.
    pub fn attribution(&self) -> String {
        let mut line = String::new();
        if let Some(ref title) = self.title {
            line.push_str(&format!("\"{}\" by ", title));
        }
        line.push_str(&self.author);
        line.push_str(&format!(" ({}) via {}", self.license, self.source));
        if let Some(ref url) = self.source_url {
            line.push_str(": ");
            line.push_str(url);
        }
        line
    }

    /// Check the license against `allowed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LicenseViolation`] when the license is not allowed.
    pub fn into_licensed(self, allowed: &LicenseSet) -> Result<LicensedAsset> {
        if allowed.allows(&self.license) {
            Ok(LicensedAsset(self))
        } else {
            Err(Error::LicenseViolation {
                path: self.path,
                license: self.license,
            })
        }
    }

    /// Read the provenance sidecar belonging to `media_path`.
    pub fn read_sidecar(media_path: &Path) -> Result<Self> {
        let sidecar = sidecar_path(media_path);
        let content = std::fs::read_to_string(&sidecar)?;
        let mut asset: Asset = serde_json::from_str(&content)?;
        asset.path = media_path.to_path_buf();
        Ok(asset)
    }

    /// Write the provenance sidecar next to the media file.
    pub fn write_sidecar(&self) -> Result<PathBuf> {
        let sidecar = sidecar_path(&self.path);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&sidecar, json)?;
        Ok(sidecar)
    }
}

/// An asset whose license has been checked against the run's allowed set.
///
/// The only way to obtain one is [`Asset::into_licensed`], so code that takes
/// a `LicensedAsset` cannot see a disallowed license.
#[derive(Debug, Clone, PartialEq)]
pub struct LicensedAsset(Asset);

impl LicensedAsset {
    /// Unwrap into the plain asset.
    pub fn into_inner(self) -> Asset {
        self.0
    }
}

impl Deref for LicensedAsset {
    type Target = Asset;

    fn deref(&self) -> &Asset {
        &self.0
    }
}
