//! Streaming file downloads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

/// Path of the in-progress file for `dest`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Stream `url` into `dest`.
///
/// The body is written to `<dest>.part` and renamed once complete, so `dest`
/// either holds a whole file or does not exist. A partial file is removed on
/// failure.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    timeout: Duration,
) -> Result<u64> {
    let part = part_path(dest);
    match stream_to(client, url, &part, timeout).await {
        Ok(bytes) => {
            tokio::fs::rename(&part, dest)
                .await
                .with_context(|| format!("Failed to move download into place: {:?}", dest))?;
            Ok(bytes)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            Err(e)
        }
    }
}

async fn stream_to(
    client: &reqwest::Client,
    url: &str,
    part: &Path,
    timeout: Duration,
) -> Result<u64> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .with_context(|| format!("download request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("download returned error: {url}"))?;

    let mut file = tokio::fs::File::create(part)
        .await
        .with_context(|| format!("Failed to create {:?}", part))?;

    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("download interrupted: {url}"))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        anyhow::bail!("download was empty: {url}");
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_whole_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        let client = reqwest::Client::new();
        let bytes = download_file(
            &client,
            &format!("{}/files/clip.mp4", server.uri()),
            &dest,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(bytes, 4096);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 4096);
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        let client = reqwest::Client::new();
        let result = download_file(
            &client,
            &format!("{}/missing.mp4", server.uri()),
            &dest,
            Duration::from_secs(5),
        )
        .await;

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }
}
