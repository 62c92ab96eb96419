//! Trait definition and types for stock-media providers.
//!
//! This module defines the [`StockProvider`] trait every stock-media backend
//! (Pexels, Openverse) implements, along with the [`Candidate`] type returned
//! by searches.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reelsmith_common::{Asset, License, MediaKind, Result};

/// A downloadable search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Provider-specific identifier.
    pub provider_id: String,
    pub kind: MediaKind,
    /// Direct link to the media file.
    pub download_url: String,
    /// Suggested local file name (already sanitized).
    pub file_name: String,
    pub license: License,
    pub author: String,
    pub title: Option<String>,
    /// Landing page at the provider.
    pub source_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
}

impl Candidate {
    /// Turn a downloaded candidate into an asset with provenance.
    pub fn into_asset(self, path: PathBuf, source: &str, term: &str) -> Asset {
        let mut asset = Asset::new(path, source, self.license, self.author, self.kind)
            .with_provider_id(self.provider_id)
            .with_term(term);
        asset.title = self.title;
        asset.source_url = self.source_url;
        asset.width = self.width;
        asset.height = self.height;
        asset.duration_secs = self.duration_secs;
        asset
    }
}

/// A stock-media search API.
///
/// Implementations make exactly one attempt per request; any failure is a
/// provider error naming the provider and the search term.
#[async_trait]
pub trait StockProvider: Send + Sync {
    /// Short provider name (e.g. "pexels"), recorded in provenance.
    fn name(&self) -> &'static str;

    /// Search for media matching `term`.
    async fn search(&self, term: &str, per_page: u32) -> Result<Vec<Candidate>>;

    /// Download `candidate` to `dest`, returning the number of bytes written.
    async fn download(&self, candidate: &Candidate, term: &str, dest: &Path) -> Result<u64>;
}

/// Last path segment of a URL, without query string, sanitized for use as a
/// file name.
pub fn url_file_name(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let name = reelsmith_common::paths::sanitize_component(last);
    (!name.is_empty() && name.contains('.')).then_some(name)
}
