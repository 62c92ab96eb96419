mod types;

pub use types::*;

use anyhow::{Context, Result};
use reelsmith_common::{scene, Error};
use std::path::{Path, PathBuf};

/// Environment variable holding the Pexels API key.
pub const PEXELS_KEY_ENV: &str = "PEXELS_API_KEY";

/// Environment variable holding the Openverse token.
pub const OPENVERSE_TOKEN_ENV: &str = "OPENVERSE_TOKEN";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelsmith.toml",
        "./config/reelsmith.toml",
        "~/.config/reelsmith/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration.
///
/// Provider keys are not checked here; they are resolved (and rejected) by the
/// fetch stage, the only stage that needs them.
pub fn validate_config(config: &Config) -> reelsmith_common::Result<()> {
    scene::validate_plan(&config.scenes)?;

    let video = &config.video;
    if video.width == 0 || video.height == 0 {
        return Err(Error::configuration("video width and height must be positive"));
    }
    if video.width % 2 != 0 || video.height % 2 != 0 {
        return Err(Error::configuration(format!(
            "video size {}x{} must be even for yuv420p",
            video.width, video.height
        )));
    }
    if video.fps == 0 {
        return Err(Error::configuration("video fps must be positive"));
    }
    if video.crf > 51 {
        return Err(Error::configuration("video crf must be in 0..=51"));
    }
    if !(video.tolerance_per_scene_secs > 0.0) {
        return Err(Error::configuration("tolerance_per_scene_secs must be positive"));
    }

    let audio = &config.audio;
    if !(0.0..=1.0).contains(&audio.volume) {
        return Err(Error::configuration(format!(
            "audio volume {} must be in 0.0..=1.0",
            audio.volume
        )));
    }
    if audio.fade_secs < 0.0 {
        return Err(Error::configuration("audio fade_secs cannot be negative"));
    }

    let music = &config.music;
    if let Some(key) = &music.key {
        crate::music::parse_key(key)?;
    }
    if !(40.0..=200.0).contains(&music.bpm) {
        return Err(Error::configuration(format!(
            "music bpm {} must be in 40..=200",
            music.bpm
        )));
    }
    for (key, level) in [("music.pulse", music.pulse), ("music.ocean_level", music.ocean_level)] {
        if !(0.0..=1.0).contains(&level) {
            return Err(Error::configuration(format!("{key} {level} must be in 0.0..=1.0")));
        }
    }

    let thumb = &config.thumbnail;
    if thumb.width == 0 || thumb.height == 0 {
        return Err(Error::configuration("thumbnail width and height must be positive"));
    }
    if thumb.quality == 0 || thumb.quality > 100 {
        return Err(Error::configuration("thumbnail quality must be in 1..=100"));
    }

    let fetch = &config.fetch;
    if fetch.per_page == 0 || fetch.per_page > 80 {
        return Err(Error::configuration("fetch per_page must be in 1..=80"));
    }
    if fetch.queries.iter().any(|q| q.trim().is_empty()) {
        return Err(Error::configuration("fetch queries cannot be blank"));
    }

    let pexels = &config.providers.pexels;
    let openverse = &config.providers.openverse;
    for (name, url) in [("pexels", &pexels.base_url), ("openverse", &openverse.base_url)] {
        reqwest::Url::parse(url).map_err(|e| {
            Error::configuration(format!("{name} base_url {url:?} is invalid: {e}"))
        })?;
    }
    if pexels.requests_per_second == 0 || openverse.requests_per_second == 0 {
        return Err(Error::configuration("requests_per_second must be positive"));
    }

    let fonts = [
        ("video.font", &config.video.font),
        ("thumbnail.font", &config.thumbnail.font),
    ];
    for (key, font) in fonts {
        if let Some(font) = font {
            if !font.is_file() {
                return Err(Error::configuration(format!(
                    "{key} {} does not exist",
                    font.display()
                )));
            }
        }
    }

    Ok(())
}

impl Config {
    /// Path of the metadata template.
    pub fn template_path(&self) -> PathBuf {
        self.metadata
            .template
            .clone()
            .unwrap_or_else(|| self.paths.templates_dir.join("metadata.json"))
    }

    /// Font for thumbnail text.
    pub fn thumbnail_font(&self) -> Option<&Path> {
        self.thumbnail.font.as_deref().or(self.video.font.as_deref())
    }
}

/// Where a credential came from, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Flag,
    Env,
    ConfigFile,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag => write!(f, "command-line flag"),
            Self::Env => write!(f, "environment"),
            Self::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Pick the first non-empty credential: flag, then environment, then config.
fn pick_credential(
    flag: Option<&str>,
    env_var: &str,
    config: Option<&str>,
) -> Option<(String, KeySource)> {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    flag.and_then(non_empty)
        .map(|k| (k, KeySource::Flag))
        .or_else(|| {
            std::env::var(env_var)
                .ok()
                .and_then(|v| non_empty(&v))
                .map(|k| (k, KeySource::Env))
        })
        .or_else(|| config.and_then(non_empty).map(|k| (k, KeySource::ConfigFile)))
}

/// Whether a credential is a template placeholder such as `YOUR_PEXELS_API_KEY`.
pub fn is_placeholder(key: &str) -> bool {
    let upper = key.trim().to_ascii_uppercase();
    upper.is_empty()
        || upper.starts_with("YOUR_")
        || upper.starts_with("YOUR-")
        || (upper.starts_with('<') && upper.ends_with('>'))
        || matches!(upper.as_str(), "CHANGEME" | "CHANGE_ME" | "REPLACE_ME" | "XXX")
}

fn check_credential(name: &str, key: String, source: KeySource) -> reelsmith_common::Result<String> {
    if is_placeholder(&key) {
        return Err(Error::configuration(format!(
            "{name} from {source} is a placeholder ({key:?}); set a real key"
        )));
    }
    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(Error::configuration(format!(
            "{name} from {source} is malformed: only printable ASCII without spaces is allowed"
        )));
    }
    Ok(key)
}

/// Resolve the Pexels API key: `--pexels-key` > `PEXELS_API_KEY` > config.
///
/// # Errors
///
/// [`Error::Configuration`] when no key is set, or the winning key is a
/// placeholder or malformed.
pub fn resolve_pexels_key(flag: Option<&str>, config: &Config) -> reelsmith_common::Result<String> {
    match pick_credential(flag, PEXELS_KEY_ENV, config.providers.pexels.api_key.as_deref()) {
        Some((key, source)) => check_credential("Pexels API key", key, source),
        None => Err(Error::configuration(format!(
            "no Pexels API key provided; pass --pexels-key, set {PEXELS_KEY_ENV}, \
             or set providers.pexels.api_key in the config file"
        ))),
    }
}

/// Resolve the optional Openverse token: `OPENVERSE_TOKEN` > config.
pub fn resolve_openverse_token(config: &Config) -> reelsmith_common::Result<Option<String>> {
    pick_credential(None, OPENVERSE_TOKEN_ENV, config.providers.openverse.token.as_deref())
        .map(|(token, source)| check_credential("Openverse token", token, source))
        .transpose()
}
