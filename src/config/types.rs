use std::collections::BTreeMap;
use std::path::PathBuf;

use reelsmith_common::{LicenseSet, ScenePlanEntry, SceneRole};
use serde::{Deserialize, Serialize};

use crate::music::Mode;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Ordered scene plan.
    #[serde(default = "default_scenes")]
    pub scenes: Vec<ScenePlanEntry>,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub music: MusicConfig,

    #[serde(default)]
    pub thumbnail: ThumbnailConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            channel: ChannelConfig::default(),
            fetch: FetchConfig::default(),
            providers: ProvidersConfig::default(),
            scenes: default_scenes(),
            video: VideoConfig::default(),
            audio: AudioConfig::default(),
            music: MusicConfig::default(),
            thumbnail: ThumbnailConfig::default(),
            metadata: MetadataConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// The five-cut, 27 second plan the channel launched with.
pub fn default_scenes() -> Vec<ScenePlanEntry> {
    vec![
        ScenePlanEntry::fixed(SceneRole::Open, 4.0, "Trade winds are on").with_fades(0.5, 0.0),
        ScenePlanEntry::fixed(SceneRole::Cut, 6.0, "Launch"),
        ScenePlanEntry::fixed(SceneRole::Cut, 8.0, "Downwinder along the dunes"),
        ScenePlanEntry::fixed(SceneRole::Cut, 6.0, "Boosted jumps"),
        ScenePlanEntry::fixed(SceneRole::End, 3.0, "See you on the water").with_fades(0.0, 0.5),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root of the dated asset directories.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Soundtracks (generated or hand-placed, each with a sidecar).
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,

    /// Read-only templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Root of the per-run output directories.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("content/assets")
}
fn default_music_dir() -> PathBuf {
    PathBuf::from("content/assets/music")
}
fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("content/output")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            music_dir: default_music_dir(),
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Channel name; author of generated soundtracks and default brand mark.
    #[serde(default = "default_channel_name")]
    pub name: String,
}

fn default_channel_name() -> String {
    "Reelsmith".to_string()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Search terms, in order.
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,

    /// Results requested per search.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Licenses allowed into a montage.
    #[serde(default)]
    pub licenses: LicenseSet,

    /// Skip renditions taller than this (UHD files are slow to cut).
    #[serde(default = "default_max_height")]
    pub max_height: Option<u32>,

    /// Assets to download beyond one per scene.
    #[serde(default = "default_spare_assets")]
    pub spare_assets: usize,
}

fn default_queries() -> Vec<String> {
    [
        "kitesurf drone",
        "kiteboarding ocean",
        "beach dunes aerial",
        "sunset ocean drone",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_per_page() -> u32 {
    15
}
fn default_max_height() -> Option<u32> {
    Some(1080)
}
fn default_spare_assets() -> usize {
    3
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            per_page: default_per_page(),
            licenses: LicenseSet::default(),
            max_height: default_max_height(),
            spare_assets: default_spare_assets(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub pexels: PexelsConfig,

    #[serde(default)]
    pub openverse: OpenverseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PexelsConfig {
    /// API key (overridden by `PEXELS_API_KEY` and `--pexels-key`).
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_pexels_url")]
    pub base_url: String,

    #[serde(default = "default_pexels_rate")]
    pub requests_per_second: u32,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_pexels_url() -> String {
    "https://api.pexels.com".to_string()
}
fn default_pexels_rate() -> u32 {
    3
}
fn default_request_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    300
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_pexels_url(),
            requests_per_second: default_pexels_rate(),
            timeout_secs: default_request_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenverseConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Optional OAuth token (overridden by `OPENVERSE_TOKEN`).
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_openverse_url")]
    pub base_url: String,

    #[serde(default = "default_openverse_rate")]
    pub requests_per_second: u32,

    /// Also search audio tracks for the soundtrack.
    #[serde(default)]
    pub include_audio: bool,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_openverse_url() -> String {
    "https://api.openverse.org".to_string()
}
fn default_openverse_rate() -> u32 {
    1
}

impl Default for OpenverseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token: None,
            base_url: default_openverse_url(),
            requests_per_second: default_openverse_rate(),
            include_audio: false,
            timeout_secs: default_request_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_preset")]
    pub preset: String,

    /// Burn scene captions into the video.
    #[serde(default = "default_true")]
    pub captions: bool,

    #[serde(default = "default_caption_font_size")]
    pub caption_font_size: u32,

    /// TrueType font for captions; fontconfig's default when unset.
    #[serde(default)]
    pub font: Option<PathBuf>,

    /// Allowed drift of the final duration, per scene.
    #[serde(default = "default_tolerance")]
    pub tolerance_per_scene_secs: f64,
}

fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}
fn default_fps() -> u32 {
    30
}
fn default_crf() -> u8 {
    20
}
fn default_preset() -> String {
    "veryfast".to_string()
}
fn default_true() -> bool {
    true
}
fn default_caption_font_size() -> u32 {
    54
}
fn default_tolerance() -> f64 {
    1.0
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            preset: default_preset(),
            captions: true,
            caption_font_size: default_caption_font_size(),
            font: None,
            tolerance_per_scene_secs: default_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// Lay a soundtrack under the montage. Turning this off is logged.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Explicit soundtrack file; it must have a provenance sidecar.
    #[serde(default)]
    pub track: Option<PathBuf>,

    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(default = "default_audio_fade")]
    pub fade_secs: f64,

    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// Synthesize an ambient track during `run` when none is available.
    #[serde(default = "default_true")]
    pub generate: bool,

    /// Seed for generated tracks.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_volume() -> f64 {
    0.15
}
fn default_audio_fade() -> f64 {
    1.5
}
fn default_bitrate() -> String {
    "192k".to_string()
}
fn default_seed() -> u64 {
    7
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            track: None,
            volume: default_volume(),
            fade_secs: default_audio_fade(),
            bitrate: default_bitrate(),
            generate: true,
            seed: default_seed(),
        }
    }
}

/// Shape of generated soundtracks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MusicConfig {
    /// Root note such as `A` or `Eb`; seeded when unset.
    #[serde(default)]
    pub key: Option<String>,

    /// `major` or `minor`; seeded when unset.
    #[serde(default)]
    pub mode: Option<Mode>,

    /// Tempo of the pad pulse, 40 to 200.
    #[serde(default = "default_bpm")]
    pub bpm: f64,

    /// Depth of the pulse, 0 (steady pad) to 1.
    #[serde(default = "default_pulse")]
    pub pulse: f64,

    /// Level of the pink-noise ocean bed, 0 to 1.
    #[serde(default = "default_ocean_level")]
    pub ocean_level: f64,
}

fn default_bpm() -> f64 {
    84.0
}
fn default_pulse() -> f64 {
    0.25
}
fn default_ocean_level() -> f64 {
    0.05
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            key: None,
            mode: None,
            bpm: default_bpm(),
            pulse: default_pulse(),
            ocean_level: default_ocean_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumb_width")]
    pub width: u32,

    #[serde(default = "default_thumb_height")]
    pub height: u32,

    /// Title text; the metadata title when unset.
    #[serde(default)]
    pub title: Option<String>,

    /// Brand mark; the channel name when unset.
    #[serde(default)]
    pub brand: Option<String>,

    /// Title size in pixels; scales with the thumbnail when unset.
    #[serde(default)]
    pub title_font_size: Option<u32>,

    /// Brand size in pixels; scales with the thumbnail when unset.
    #[serde(default)]
    pub brand_font_size: Option<u32>,

    /// JPEG quality (1-100).
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Font for thumbnail text; falls back to `video.font`.
    #[serde(default)]
    pub font: Option<PathBuf>,
}

fn default_thumb_width() -> u32 {
    1280
}
fn default_thumb_height() -> u32 {
    720
}
fn default_quality() -> u8 {
    92
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: default_thumb_width(),
            height: default_thumb_height(),
            title: None,
            brand: None,
            title_font_size: None,
            brand_font_size: None,
            quality: default_quality(),
            font: None,
        }
    }
}

impl ThumbnailConfig {
    /// Title font size for a `width`x`height` thumbnail.
    pub fn title_size(&self, width: u32, height: u32) -> u32 {
        self.title_font_size
            .unwrap_or_else(|| ((width.min(height) as f64 * 0.09) as u32).max(44))
    }

    /// Brand font size for a `width`x`height` thumbnail.
    pub fn brand_size(&self, width: u32, height: u32) -> u32 {
        self.brand_font_size
            .unwrap_or_else(|| ((width.min(height) as f64 * 0.03) as u32).max(22))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Template file; `<templates_dir>/metadata.json` when unset.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Variables for every locale. Built-in variables cannot be overridden.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Per-locale variables, taking precedence over `vars`.
    #[serde(default)]
    pub locale_vars: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}
