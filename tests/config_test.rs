//! Configuration loading, validation and credential precedence.

mod common;

use assert_matches::assert_matches;
use reelsmith::config::{
    load_config, resolve_openverse_token, resolve_pexels_key, validate_config, Config,
    OPENVERSE_TOKEN_ENV, PEXELS_KEY_ENV,
};
use reelsmith::music::Mode;
use reelsmith_common::{Error, License, SceneRole};
use serial_test::serial;
use std::path::PathBuf;

fn example_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/reelsmith.example.toml")
}

/// Runs `f` with `var` set (or removed), restoring the previous value.
fn with_env<T>(var: &str, value: Option<&str>, f: impl FnOnce() -> T) -> T {
    let previous = std::env::var(var).ok();
    match value {
        Some(v) => std::env::set_var(var, v),
        None => std::env::remove_var(var),
    }
    let result = f();
    match previous {
        Some(v) => std::env::set_var(var, v),
        None => std::env::remove_var(var),
    }
    result
}

#[test]
fn test_example_config_loads() {
    let config = load_config(&example_config()).unwrap();
    assert_eq!(config.scenes.len(), 5);
    assert_eq!(config.scenes[0].role, SceneRole::Open);
    assert_eq!(config.scenes[2].min_secs, 8.0);
    assert_eq!(config.scenes[4].fade_out, 0.5);
    assert!(config.fetch.licenses.allows(&License::CcBy));
    assert_eq!(config.video.preset, "veryfast");
    assert_eq!(config.metadata.locale_vars["pt"]["location"], "Jericoacoara, Ceará");
}

#[test]
fn test_partial_config_gets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reelsmith.toml");
    std::fs::write(&path, "[channel]\nname = \"Kite Lab\"\n").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.channel.name, "Kite Lab");
    assert_eq!(config.video.width, 1920);
    assert_eq!(config.audio.volume, 0.15);
    assert_eq!(config.thumbnail.quality, 92);
    assert_eq!(config.scenes.len(), 5);
}

#[test]
fn test_disallowed_license_in_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reelsmith.toml");
    std::fs::write(&path, "[fetch]\nlicenses = [\"cc0\", \"by-nc\"]\n").unwrap();
    assert!(load_config(&path).is_err());
}

#[test]
fn test_empty_plan_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reelsmith.toml");
    std::fs::write(&path, "scenes = []\n").unwrap();
    assert!(load_config(&path).is_err());
}

#[test]
fn test_missing_thumbnail_font_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reelsmith.toml");
    let font = dir.path().join("missing.ttf");
    std::fs::write(&path, format!("[thumbnail]\nfont = {:?}\n", font.display().to_string())).unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("thumbnail.font"));
}

#[test]
fn test_missing_caption_font_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.video.font = Some(dir.path().join("missing.ttf"));
    assert_matches!(validate_config(&config), Err(Error::Configuration(ref msg)) if msg.contains("video.font"));

    let font = dir.path().join("caption.ttf");
    std::fs::write(&font, b"ttf").unwrap();
    config.video.font = Some(font);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_music_section_is_read_and_checked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reelsmith.toml");
    std::fs::write(&path, "[music]\nkey = \"Eb\"\nmode = \"minor\"\nbpm = 96\n").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.music.key.as_deref(), Some("Eb"));
    assert_eq!(config.music.mode, Some(Mode::Minor));
    assert_eq!(config.music.bpm, 96.0);
    assert_eq!(config.music.pulse, 0.25);

    let mut bad = config.clone();
    bad.music.key = Some("H".into());
    assert_matches!(validate_config(&bad), Err(Error::Configuration(_)));

    let mut bad = config.clone();
    bad.music.bpm = 300.0;
    assert_matches!(validate_config(&bad), Err(Error::Configuration(ref msg)) if msg.contains("bpm"));

    let mut bad = config;
    bad.music.ocean_level = 1.5;
    assert_matches!(validate_config(&bad), Err(Error::Configuration(ref msg)) if msg.contains("music.ocean_level"));
}

#[test]
#[serial]
fn test_env_key_beats_config() {
    let mut config = Config::default();
    config.providers.pexels.api_key = Some("from-config".into());

    let key = with_env(PEXELS_KEY_ENV, Some("from-env"), || resolve_pexels_key(None, &config));
    assert_eq!(key.unwrap(), "from-env");

    let key = with_env(PEXELS_KEY_ENV, None, || resolve_pexels_key(None, &config));
    assert_eq!(key.unwrap(), "from-config");
}

#[test]
#[serial]
fn test_flag_beats_env() {
    let config = Config::default();
    let key = with_env(PEXELS_KEY_ENV, Some("from-env"), || {
        resolve_pexels_key(Some("from-flag"), &config)
    });
    assert_eq!(key.unwrap(), "from-flag");
}

#[test]
#[serial]
fn test_placeholder_env_key_is_not_skipped() {
    let mut config = Config::default();
    config.providers.pexels.api_key = Some("real-config-key".into());
    let err = with_env(PEXELS_KEY_ENV, Some("YOUR_PEXELS_API_KEY"), || {
        resolve_pexels_key(None, &config)
    })
    .unwrap_err();
    assert_matches!(err, Error::Configuration(ref msg) if msg.contains("environment"));
}

#[test]
#[serial]
fn test_missing_key() {
    let err = with_env(PEXELS_KEY_ENV, None, || resolve_pexels_key(None, &Config::default()))
        .unwrap_err();
    assert_matches!(err, Error::Configuration(ref msg) if msg.contains(PEXELS_KEY_ENV));
}

#[test]
#[serial]
fn test_openverse_token_is_optional() {
    let config = Config::default();
    let token = with_env(OPENVERSE_TOKEN_ENV, None, || resolve_openverse_token(&config));
    assert_eq!(token.unwrap(), None);

    let token = with_env(OPENVERSE_TOKEN_ENV, Some("ov-token"), || resolve_openverse_token(&config));
    assert_eq!(token.unwrap().as_deref(), Some("ov-token"));
}

#[test]
fn test_config_in_keeps_paths_inside_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config_in(dir.path());
    assert!(config.paths.assets_dir.starts_with(dir.path()));
    assert!(config.template_path().is_file());
}
