//! Pexels video provider.
//!
//! Implements [`StockProvider`] over the Pexels video search API.
//!
//! - Token-bucket rate limiting via [`governor`] (3 requests / second by default).
//! - One attempt per request; failures become provider errors.
//! - Picks the largest rendition that fits under the configured height.
//!
//! Pexels content is published under the Pexels license, which is treated
//! as CC0.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reelsmith_common::paths::is_uhd_filename;
use reelsmith_common::{Error, License, MediaKind, Result};
use serde::Deserialize;
use tracing::debug;

use super::{api_url, check_status, http_client, limiter, Limiter};
use crate::config::PexelsConfig;
use crate::fetch::download::download_file;
use crate::fetch::provider::{url_file_name, Candidate, StockProvider};

const NAME: &str = "pexels";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    user: Option<PexelsUser>,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    link: String,
}

impl PexelsVideoFile {
    fn is_mp4(&self) -> bool {
        match self.file_type.as_deref() {
            Some(t) => t.eq_ignore_ascii_case("video/mp4"),
            None => url_file_name(&self.link).is_some_and(|n| n.to_lowercase().ends_with(".mp4")),
        }
    }

    fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// Pick the highest-resolution MP4 rendition, skipping anything taller than
/// `max_height`.
fn best_file(files: &[PexelsVideoFile], max_height: Option<u32>) -> Option<&PexelsVideoFile> {
    files
        .iter()
        .filter(|f| f.is_mp4() && f.width.is_some() && f.height.is_some())
        .filter(|f| match max_height {
            Some(max) => {
                f.height.is_some_and(|h| h <= max)
                    && !url_file_name(&f.link).is_some_and(|n| is_uhd_filename(&n))
            }
            None => true,
        })
        .max_by(|a, b| a.area().cmp(&b.area()).then_with(|| b.link.cmp(&a.link)))
}

/// Pexels video search.
pub struct PexelsProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_height: Option<u32>,
    download_timeout: Duration,
    rate_limiter: Limiter,
}

impl PexelsProvider {
    /// Create a provider with an already-resolved API key.
    pub fn new(api_key: String, config: &PexelsConfig, max_height: Option<u32>) -> Result<Self> {
        Ok(Self {
            client: http_client(NAME, Duration::from_secs(config.timeout_secs))?,
            api_key,
            base_url: config.base_url.clone(),
            max_height,
            download_timeout: Duration::from_secs(config.download_timeout_secs),
            rate_limiter: limiter(config.requests_per_second),
        })
    }

    fn to_candidate(&self, video: PexelsVideo) -> Option<Candidate> {
        let file = match best_file(&video.video_files, self.max_height) {
            Some(file) => file,
            None => {
                debug!(provider = NAME, id = video.id, "No usable rendition");
                return None;
            }
        };
        let (width, height) = (file.width.unwrap_or(0), file.height.unwrap_or(0));
        Some(Candidate {
            provider_id: video.id.to_string(),
            kind: MediaKind::Video,
            download_url: file.link.clone(),
            file_name: format!("pexels_{}_{}x{}.mp4", video.id, width, height),
            license: License::Cc0,
            author: video
                .user
                .map(|u| u.name)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Pexels contributor".to_string()),
            title: None,
            source_url: video.url,
            width: Some(width),
            height: Some(height),
            duration_secs: video.duration,
        })
    }
}

#[async_trait]
impl StockProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(&self, term: &str, per_page: u32) -> Result<Vec<Candidate>> {
        self.rate_limiter.until_ready().await;

        let url = api_url(&self.base_url, "/videos/search");
        debug!(provider = NAME, term, "Searching");
        let per_page = per_page.to_string();
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .query(&[
                ("query", term),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await
            .map_err(|e| Error::provider(NAME, term, format!("request failed: {e}")))?;

        let body: SearchResponse = check_status(NAME, term, resp)?
            .json()
            .await
            .map_err(|e| Error::provider(NAME, term, format!("undecodable response: {e}")))?;

        let found = body.videos.len();
        let candidates: Vec<Candidate> = body
            .videos
            .into_iter()
            .filter_map(|v| self.to_candidate(v))
            .collect();
        debug!(provider = NAME, term, found, usable = candidates.len(), "Search complete");
        Ok(candidates)
    }

    async fn download(&self, candidate: &Candidate, term: &str, dest: &Path) -> Result<u64> {
        download_file(&self.client, &candidate.download_url, dest, self.download_timeout)
            .await
            .map_err(|e| Error::provider(NAME, term, format!("{e:#}")))
    }
}
