//! Asset fetcher against mock Pexels and Openverse servers.

mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use reelsmith::config::Config;
use reelsmith::fetch::{fetch_assets, FetchOptions, FetchReport};
use reelsmith::library::{load_assets, CREDITS_FILE, FETCH_MANIFEST};
use reelsmith_common::{Error, License, MediaKind};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-pexels-key";

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 22).unwrap()
}

fn options(queries: &[&str]) -> FetchOptions {
    FetchOptions {
        queries: queries.iter().map(|q| q.to_string()).collect(),
        per_page: 10,
        date: date(),
        pexels_key: Some(KEY.to_string()),
    }
}

fn config_for(root: &Path, server: &MockServer) -> Config {
    let mut config = common::config_in(root);
    config.providers.pexels.base_url = server.uri();
    config.providers.openverse.base_url = server.uri();
    config.providers.pexels.requests_per_second = 50;
    config.providers.openverse.requests_per_second = 50;
    config
}

fn pexels_video(server: &MockServer, id: u64, duration: f64) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("https://www.pexels.com/video/kite-{id}/"),
        "duration": duration,
        "user": { "name": format!("Pilot {id}") },
        "video_files": [
            { "file_type": "video/mp4", "width": 3840, "height": 2160,
              "link": format!("{}/files/{id}_uhd_3840_2160.mp4", server.uri()) },
            { "file_type": "video/mp4", "width": 1920, "height": 1080,
              "link": format!("{}/files/{id}_hd.mp4", server.uri()) },
            { "file_type": "video/mp4", "width": 640, "height": 360,
              "link": format!("{}/files/{id}_sd.mp4", server.uri()) }
        ]
    })
}

async fn mount_files(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/files/\d+_hd\.mp4$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake mp4 bytes".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"uhd"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"too big".to_vec()))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_downloads_licensed_clips() {
    let server = MockServer::start().await;
    let videos: Vec<_> = (1..=5)
        .map(|id| pexels_video(&server, id, 12.0))
        .chain([pexels_video(&server, 99, 2.0)])
        .collect();
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .and(header("Authorization", KEY))
        .and(query_param("query", "kitesurf drone"))
        .and(query_param("orientation", "landscape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "videos": videos })))
        .expect(1)
        .mount(&server)
        .await;
    mount_files(&server).await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), &server);
    let report = fetch_assets(&config, &options(&["kitesurf drone"])).await.unwrap();

    let dir = root.path().join("assets/2025-08-22");
    assert_eq!(report.dir, dir);
    assert_eq!(report.visuals, 5);
    assert_eq!(report.shortfall, 0);
    assert!(dir.join(FETCH_MANIFEST).is_file());
    assert!(!root.path().join("assets/.2025-08-22.partial").exists());
    assert!(dir.join("pexels_1_1920x1080.mp4").is_file());
    assert!(!dir.join("pexels_99_1920x1080.mp4").exists(), "2s clip is shorter than every scene");

    let credits = std::fs::read_to_string(dir.join(CREDITS_FILE)).unwrap();
    assert_eq!(credits.lines().count(), 5);
    assert!(credits.contains("Pilot 3"));

    let written = FetchReport::read(&dir).unwrap();
    assert_eq!(written.files.len(), 5);
    assert_eq!(written.providers, vec!["pexels"]);

    let library = load_assets(&dir, &config.fetch.licenses).unwrap();
    assert_eq!(library.visuals.len(), 5);
    let first = &library.visuals[0];
    assert_eq!(first.license, License::Cc0);
    assert_eq!(first.source, "pexels");
    assert_eq!(first.term.as_deref(), Some("kitesurf drone"));
    assert_eq!(first.duration_secs, Some(12.0));
}

#[tokio::test]
async fn test_fetch_records_shortfall() {
    let server = MockServer::start().await;
    let videos: Vec<_> = (1..=3).map(|id| pexels_video(&server, id, 12.0)).collect();
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "videos": videos })))
        .mount(&server)
        .await;
    mount_files(&server).await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), &server);
    let report = fetch_assets(&config, &options(&["kitesurf"])).await.unwrap();

    assert_eq!(report.visuals, 3);
    assert_eq!(report.required, 5);
    assert_eq!(report.shortfall, 2);
    assert!(report.dir.join(FETCH_MANIFEST).is_file());
}

#[tokio::test]
async fn test_fetch_rejected_key_names_provider_and_term() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), &server);
    let err = fetch_assets(&config, &options(&["kitesurf"])).await.unwrap_err();

    assert_matches!(err, Error::Provider { ref provider, ref term, ref message } => {
        assert_eq!(provider, "pexels");
        assert_eq!(term, "kitesurf");
        assert!(message.contains("authentication rejected"));
    });
    let assets = root.path().join("assets");
    assert!(!assets.join("2025-08-22").exists());
    assert!(!assets.join(".2025-08-22.partial").exists());
}

#[tokio::test]
async fn test_fetch_undecodable_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), &server);
    let err = fetch_assets(&config, &options(&["kitesurf"])).await.unwrap_err();
    assert_matches!(err, Error::Provider { ref message, .. } if message.contains("undecodable"));
}

#[tokio::test]
async fn test_fetch_no_results_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "videos": [] })))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), &server);
    let err = fetch_assets(&config, &options(&["snow kiting"])).await.unwrap_err();

    assert_matches!(err, Error::Provider { ref term, ref message, .. } => {
        assert_eq!(term, "snow kiting");
        assert!(message.contains("no licensed results"));
    });
    assert!(!root.path().join("assets/2025-08-22").exists());
}

#[tokio::test]
async fn test_fetch_failed_download_removes_staging() {
    let server = MockServer::start().await;
    let videos = vec![pexels_video(&server, 1, 12.0)];
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "videos": videos })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/files/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), &server);
    let err = fetch_assets(&config, &options(&["kitesurf"])).await.unwrap_err();

    assert_matches!(err, Error::Provider { .. });
    let assets = root.path().join("assets");
    assert!(!assets.join(".2025-08-22.partial").exists());
    assert!(!assets.join("2025-08-22").exists());
}

#[tokio::test]
async fn test_placeholder_key_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "videos": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), &server);
    let mut opts = options(&["kitesurf"]);
    opts.pexels_key = Some("YOUR_PEXELS_API_KEY".into());

    let err = fetch_assets(&config, &opts).await.unwrap_err();
    assert_matches!(err, Error::Configuration(_));
    assert!(!root.path().join("assets").exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_openverse_filters_licenses_and_adds_images() {
    let server = MockServer::start().await;
    let videos: Vec<_> = (1..=4).map(|id| pexels_video(&server, id, 12.0)).collect();
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "videos": videos })))
        .mount(&server)
        .await;
    mount_files(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/images/"))
        .and(query_param("license", "cc0,by"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "id": "img-by",
                    "title": "Kites at dusk",
                    "creator": "Marina",
                    "license": "by",
                    "url": format!("{}/ov/dusk.jpg", server.uri()),
                    "foreign_landing_url": "https://example.org/dusk",
                    "filetype": "jpg",
                    "width": 1920,
                    "height": 1080
                },
                {
                    "id": "img-nc",
                    "title": "Not for us",
                    "creator": "Someone",
                    "license": "by-nc",
                    "url": format!("{}/ov/nc.jpg", server.uri()),
                    "filetype": "jpg"
                }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ov/dusk.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ov/nc.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(root.path(), &server);
    config.providers.openverse.enabled = true;
    let report = fetch_assets(&config, &options(&["kitesurf"])).await.unwrap();

    assert_eq!(report.visuals, 5);
    assert_eq!(report.providers, vec!["pexels", "openverse"]);

    let library = load_assets(&report.dir, &config.fetch.licenses).unwrap();
    let image = library
        .visuals
        .iter()
        .find(|a| a.kind == MediaKind::Image)
        .unwrap();
    assert_eq!(image.license, License::CcBy);
    assert_eq!(image.author, "Marina");
    let credits = std::fs::read_to_string(report.dir.join(CREDITS_FILE)).unwrap();
    assert!(credits.contains("\"Kites at dusk\" by Marina (CC-BY)"));
}
