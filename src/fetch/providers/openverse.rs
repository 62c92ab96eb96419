//! Openverse image and audio provider.
//!
//! Queries the Openverse catalogue for openly licensed stills and, when
//! enabled, audio tracks. License tags come straight from the API and are
//! filtered by the fetcher against the allowed set.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reelsmith_common::paths::{media_kind, sanitize_component};
use reelsmith_common::{Error, License, MediaKind, Result};
use serde::Deserialize;
use tracing::debug;

use super::{api_url, check_status, http_client, limiter, Limiter};
use crate::config::OpenverseConfig;
use crate::fetch::download::download_file;
use crate::fetch::provider::{url_file_name, Candidate, StockProvider};

const NAME: &str = "openverse";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<OpenverseResult>,
}

#[derive(Debug, Deserialize)]
struct OpenverseResult {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    creator: Option<String>,
    license: String,
    url: String,
    #[serde(default)]
    foreign_landing_url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    filetype: Option<String>,
    /// Milliseconds, audio only.
    #[serde(default)]
    duration: Option<u64>,
}

impl OpenverseResult {
    fn into_candidate(self, kind: MediaKind) -> Option<Candidate> {
        let ext = self
            .filetype
            .as_deref()
            .map(str::to_lowercase)
            .or_else(|| {
                url_file_name(&self.url)
                    .and_then(|n| n.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
            })?;
        let file_name = format!("openverse_{}.{}", sanitize_component(&self.id), ext);
        if media_kind(Path::new(&file_name)) != Some(kind) {
            debug!(provider = NAME, id = %self.id, ext, "Unsupported file type");
            return None;
        }

        Some(Candidate {
            provider_id: self.id,
            kind,
            download_url: self.url,
            file_name,
            license: License::parse(&self.license),
            author: self
                .creator
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "Unknown creator".to_string()),
            title: self.title.filter(|t| !t.trim().is_empty()),
            source_url: self.foreign_landing_url,
            width: self.width,
            height: self.height,
            duration_secs: self.duration.map(|ms| ms as f64 / 1000.0),
        })
    }
}

/// Openverse image (and optional audio) search.
pub struct OpenverseProvider {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
    include_audio: bool,
    download_timeout: Duration,
    rate_limiter: Limiter,
}

impl OpenverseProvider {
    pub fn new(token: Option<String>, config: &OpenverseConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(NAME, Duration::from_secs(config.timeout_secs))?,
            token,
            base_url: config.base_url.clone(),
            include_audio: config.include_audio,
            download_timeout: Duration::from_secs(config.download_timeout_secs),
            rate_limiter: limiter(config.requests_per_second),
        })
    }

    async fn query(
        &self,
        path: &str,
        kind: MediaKind,
        term: &str,
        per_page: u32,
    ) -> Result<Vec<Candidate>> {
        self.rate_limiter.until_ready().await;

        let page_size = per_page.to_string();
        let mut req = self.client.get(api_url(&self.base_url, path)).query(&[
            ("q", term),
            ("license", "cc0,by"),
            ("page_size", page_size.as_str()),
        ]);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::provider(NAME, term, format!("request failed: {e}")))?;
        let body: SearchResponse = check_status(NAME, term, resp)?
            .json()
            .await
            .map_err(|e| Error::provider(NAME, term, format!("undecodable response: {e}")))?;

        Ok(body
            .results
            .into_iter()
            .filter_map(|r| r.into_candidate(kind))
            .collect())
    }
}

#[async_trait]
impl StockProvider for OpenverseProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(&self, term: &str, per_page: u32) -> Result<Vec<Candidate>> {
        let mut candidates = self.query("/v1/images/", MediaKind::Image, term, per_page).await?;
        if self.include_audio {
            candidates.extend(self.query("/v1/audio/", MediaKind::Audio, term, per_page).await?);
        }
        debug!(provider = NAME, term, usable = candidates.len(), "Search complete");
        Ok(candidates)
    }

    async fn download(&self, candidate: &Candidate, term: &str, dest: &Path) -> Result<u64> {
        download_file(&self.client, &candidate.download_url, dest, self.download_timeout)
            .await
            .map_err(|e| Error::provider(NAME, term, format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(license: &str, filetype: Option<&str>, url: &str) -> OpenverseResult {
        OpenverseResult {
            id: "4bc4-9f".into(),
            title: Some("Dunes".into()),
            creator: Some("Rui".into()),
            license: license.into(),
            url: url.into(),
            foreign_landing_url: Some("https://flickr.com/p/1".into()),
            width: Some(2048),
            height: Some(1365),
            filetype: filetype.map(String::from),
            duration: None,
        }
    }

    #[test]
    fn test_candidate_license_and_name() {
        let c = result("by", Some("jpg"), "https://live.staticflickr.com/1.jpg")
            .into_candidate(MediaKind::Image)
            .unwrap();
        assert_eq!(c.license, License::CcBy);
        assert_eq!(c.file_name, "openverse_4bc4-9f.jpg");
        assert_eq!(c.title.as_deref(), Some("Dunes"));
    }

    #[test]
    fn test_extension_from_url_when_filetype_missing() {
        let c = result("cc0", None, "https://example.org/media/shot.PNG")
            .into_candidate(MediaKind::Image)
            .unwrap();
        assert_eq!(c.file_name, "openverse_4bc4-9f.png");
        assert_eq!(c.license, License::Cc0);
    }

    #[test]
    fn test_wrong_kind_is_skipped() {
        assert!(result("cc0", Some("svg"), "https://x/y.svg")
            .into_candidate(MediaKind::Image)
            .is_none());
        assert!(result("cc0", Some("mp3"), "https://x/y.mp3")
            .into_candidate(MediaKind::Image)
            .is_none());
    }

    #[test]
    fn test_audio_duration_in_seconds() {
        let mut r = result("cc0", Some("mp3"), "https://x/y.mp3");
        r.duration = Some(93_500);
        let c = r.into_candidate(MediaKind::Audio).unwrap();
        assert_eq!(c.duration_secs, Some(93.5));
    }
}
