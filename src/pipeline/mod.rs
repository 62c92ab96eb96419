//! Stage orchestration.
//!
//! The stage commands and `reelsmith run` share the helpers here so both
//! resolve the asset directory, the scene assignment and the soundtrack the
//! same way. Stages run strictly in order and the first failure stops the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reelsmith_av::Tools;
use reelsmith_common::{Asset, Error, LicensedAsset, MediaKind};
use tracing::{info, warn};

use crate::assemble::{self, assign_scenes, AssembleReport, SceneAssignment};
use crate::config::Config;
use crate::fetch::{self, FetchOptions};
use crate::library::{self, AssetLibrary};
use crate::metadata::{self, MetadataInput, MetadataRecord, MetadataTemplate};
use crate::music;
use crate::output::{self, RunManifest, RunSummary};
use crate::thumbnail::{ThumbnailOptions, ThumbnailSource};
use crate::tools;

/// Everything the later stages need from the asset directory.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub asset_dir: PathBuf,
    pub library: AssetLibrary,
    pub assignments: Vec<SceneAssignment>,
    pub soundtrack: Option<LicensedAsset>,
}

impl RunPlan {
    /// Asset file names in scene order.
    pub fn asset_names(&self) -> Vec<String> {
        self.assignments.iter().map(|a| a.asset.file_name()).collect()
    }

    /// Planned montage length.
    pub fn duration_secs(&self) -> f64 {
        assemble::total_secs(&self.assignments)
    }

    pub fn credits(&self) -> Vec<String> {
        metadata::credits_for(&self.assignments, self.soundtrack.as_ref())
    }
}

/// Resolve the asset directory, match scenes and pick the soundtrack.
///
/// `tools` enables generating a soundtrack when none is available and
/// `audio.generate` is set.
pub fn plan_run(
    config: &Config,
    asset_dir: Option<&Path>,
    tools: Option<&Tools>,
) -> reelsmith_common::Result<RunPlan> {
    let asset_dir = library::resolve_asset_dir(asset_dir, &config.paths.assets_dir)?;
    info!(dir = %asset_dir.display(), "Using assets");

    let library = library::load_assets(&asset_dir, &config.fetch.licenses)?;
    let assignments = assign_scenes(&config.scenes, &library)?;
    let duration = assemble::total_secs(&assignments);
    let soundtrack = select_soundtrack(config, &library, tools, duration)?;

    Ok(RunPlan {
        asset_dir,
        library,
        assignments,
        soundtrack,
    })
}

/// Pick the soundtrack for a run.
///
/// In order: `audio.track`, the first licensed audio file fetched with the
/// assets, the first licensed track in the music directory, and finally a
/// generated track when `tools` is given and `audio.generate` is set.
///
/// # Errors
///
/// - [`Error::LicenseViolation`] when `audio.track` has a disallowed license
/// - [`Error::Configuration`] when the soundtrack is enabled and none exists
pub fn select_soundtrack(
    config: &Config,
    library: &AssetLibrary,
    tools: Option<&Tools>,
    duration_secs: f64,
) -> reelsmith_common::Result<Option<LicensedAsset>> {
    let audio = &config.audio;
    if !audio.enabled {
        info!("Soundtrack disabled by audio.enabled = false");
        return Ok(None);
    }

    if let Some(ref track) = audio.track {
        let asset = Asset::read_sidecar(track).map_err(|e| {
            Error::configuration(format!(
                "audio.track {} has no provenance sidecar: {e}",
                track.display()
            ))
        })?;
        return asset.into_licensed(&config.fetch.licenses).map(Some);
    }

    if let Some(track) = library.audio.first() {
        return Ok(Some(track.clone()));
    }

    let music_dir = &config.paths.music_dir;
    if music_dir.is_dir() {
        let music = library::load_assets(music_dir, &config.fetch.licenses)?;
        if let Some(track) = music.audio.into_iter().next() {
            return Ok(Some(track));
        }
    }

    match tools {
        Some(tools) if audio.generate => {
            info!("No soundtrack on disk; generating one");
            music::generate_music(config, tools, duration_secs.ceil(), audio.seed).map(Some)
        }
        _ => Err(Error::configuration(format!(
            "no licensed soundtrack in the asset directory or {}; run `reelsmith music` \
             or set audio.enabled = false",
            music_dir.display()
        ))),
    }
}

/// Render and write `metadata.json` for `plan`.
pub fn write_metadata(
    config: &Config,
    plan: &RunPlan,
    date: NaiveDate,
    output: &Path,
) -> reelsmith_common::Result<MetadataRecord> {
    let template = MetadataTemplate::load(&config.template_path())?;
    let record = metadata::generate(&MetadataInput {
        template: &template,
        assignments: &plan.assignments,
        soundtrack: plan.soundtrack.as_ref(),
        vars: &config.metadata.vars,
        locale_vars: &config.metadata.locale_vars,
        date,
    })?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    record.write(output)?;
    info!(output = %output.display(), title = %record.title, "Metadata written");
    Ok(record)
}

/// Overrides for the thumbnail stage, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailRequest {
    /// Assembled montage to take the frame from.
    pub video: Option<PathBuf>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub size: Option<(u32, u32)>,
    /// Title of the run's metadata, used when no title is given.
    pub metadata_title: Option<String>,
}

/// Where the thumbnail frame comes from.
///
/// The montage at the midpoint of the first scene; without a montage, the
/// first scene's asset at the same moment; without either, a branded card.
pub fn thumbnail_source(video: Option<&Path>, assignments: &[SceneAssignment]) -> ThumbnailSource {
    let first = assignments.first();
    match (video, first) {
        (Some(video), first) => ThumbnailSource::Video {
            path: video.to_path_buf(),
            at_secs: first.map(|a| a.duration_secs / 2.0).unwrap_or(0.0),
        },
        (None, Some(first)) => match first.asset.kind {
            MediaKind::Video => ThumbnailSource::Video {
                path: first.asset.path.clone(),
                at_secs: first.offset_secs + first.duration_secs / 2.0,
            },
            MediaKind::Image => ThumbnailSource::Image {
                path: first.asset.path.clone(),
            },
            MediaKind::Audio => ThumbnailSource::Card,
        },
        (None, None) => ThumbnailSource::Card,
    }
}

/// Resolve title, brand, size and source for the thumbnail.
pub fn thumbnail_options(
    config: &Config,
    assignments: &[SceneAssignment],
    request: &ThumbnailRequest,
) -> ThumbnailOptions {
    let thumb = &config.thumbnail;
    let non_blank = |s: &&String| !s.trim().is_empty();

    let title = request
        .title
        .as_ref()
        .filter(non_blank)
        .or(thumb.title.as_ref().filter(non_blank))
        .or(request.metadata_title.as_ref().filter(non_blank))
        .cloned()
        .or_else(|| {
            assignments
                .first()
                .map(|a| a.scene.caption.trim().to_string())
                .filter(|c| !c.is_empty())
        })
        .unwrap_or_else(|| config.channel.name.clone());
    let brand = request
        .brand
        .as_ref()
        .or(thumb.brand.as_ref())
        .cloned()
        .unwrap_or_else(|| config.channel.name.clone());
    let (width, height) = request.size.unwrap_or((thumb.width, thumb.height));

    ThumbnailOptions {
        source: thumbnail_source(request.video.as_deref(), assignments),
        title,
        brand,
        width,
        height,
        title_font_size: thumb.title_size(width, height),
        brand_font_size: thumb.brand_size(width, height),
        quality: thumb.quality,
        font: config.thumbnail_font().map(Path::to_path_buf),
    }
}

/// Options of a whole run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Run date; names the asset and output directories.
    pub date: NaiveDate,
    /// Reuse the latest complete asset directory instead of fetching.
    pub skip_fetch: bool,
    pub pexels_key: Option<String>,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub dir: PathBuf,
    pub manifest: RunManifest,
    pub montage: AssembleReport,
}

const STAGES: usize = 5;

fn stage(n: usize, name: &str) {
    info!("[{}/{}] {}", n, STAGES, name);
}

/// Run every stage into `output/<run-id>/`, the run id being the date.
pub fn run(config: &Config, options: &RunOptions) -> Result<RunOutcome> {
    let run_id = options.date.format("%Y-%m-%d").to_string();
    info!(run_id = %run_id, "Starting run");

    // Checked before anything is downloaded.
    let tools = tools::discover(config)?;

    stage(1, "Fetching assets");
    let asset_dir = if options.skip_fetch {
        info!("Skipping fetch; using the latest complete asset directory");
        None
    } else {
        let mut fetch_options = FetchOptions::from_config(config, options.date);
        fetch_options.pexels_key = options.pexels_key.clone();
        let report = fetch::fetch_assets_blocking(config, &fetch_options).context("fetch stage failed")?;
        if report.shortfall > 0 {
            warn!(shortfall = report.shortfall, "Fetched fewer assets than the plan needs");
        }
        Some(report.dir)
    };

    let plan = plan_run(config, asset_dir.as_deref(), Some(&tools)).context("planning failed")?;
    let dir = output::run_dir(&config.paths.output_dir, &run_id);
    output::begin_run(&dir)?;

    stage(2, "Writing metadata");
    let record = write_metadata(config, &plan, options.date, &dir.join(output::METADATA_FILE))
        .context("metadata stage failed")?;

    stage(3, "Assembling montage");
    let montage = assemble::assemble(
        config,
        &tools,
        &plan.assignments,
        plan.soundtrack.as_ref(),
        &dir.join(output::MONTAGE_FILE),
    )
    .context("assemble stage failed")?;

    stage(4, "Drawing thumbnail");
    let request = ThumbnailRequest {
        video: Some(montage.output.clone()),
        metadata_title: Some(record.title.clone()),
        ..Default::default()
    };
    let options_thumb = thumbnail_options(config, &plan.assignments, &request);
    crate::thumbnail::generate_thumbnail(&tools, &options_thumb, &dir.join(output::THUMBNAIL_FILE))
        .context("thumbnail stage failed")?;

    stage(5, "Finalizing");
    let manifest = output::finalize(
        &dir,
        &RunSummary {
            run_id,
            duration_secs: montage.duration_secs,
            expected_credits: plan.credits(),
            assets: plan.asset_names(),
            soundtrack: plan.soundtrack.as_ref().map(|s| s.file_name()),
        },
    )
    .context("finalize failed")?;

    Ok(RunOutcome {
        dir,
        manifest,
        montage,
    })
}
