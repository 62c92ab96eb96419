//! Asset fetching from stock-media providers.
//!
//! A fetch searches every provider for every term, keeps results whose
//! license is allowed, and downloads them into a hidden staging directory
//! (`assets/.<date>.partial`). Each visual is taken only when it fills a scene
//! of the plan that is still open, or as one of the spares. Each file gets a
//! provenance sidecar. When the terms are exhausted, `credits.txt` and `fetch.json`
//! are written and the staging directory is renamed to `assets/<date>/`.
//!
//! A failed fetch removes its staging directory, so any directory holding
//! `fetch.json` is complete.

pub mod download;
pub mod provider;
pub mod providers;

pub use provider::{Candidate, StockProvider};
pub use providers::{OpenverseProvider, PexelsProvider};

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reelsmith_common::paths::dated_dir_name;
use reelsmith_common::{Asset, Error, MediaKind, Result, ScenePlanEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{resolve_openverse_token, resolve_pexels_key, Config};
use crate::library::{is_complete, CREDITS_FILE, FETCH_MANIFEST};

/// Per-invocation fetch settings.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub queries: Vec<String>,
    pub per_page: u32,
    pub date: NaiveDate,
    /// `--pexels-key`, highest precedence.
    pub pexels_key: Option<String>,
}

impl FetchOptions {
    /// Options taken from the configuration for `date`.
    pub fn from_config(config: &Config, date: NaiveDate) -> Self {
        Self {
            queries: config.fetch.queries.clone(),
            per_page: config.fetch.per_page,
            date,
            pexels_key: None,
        }
    }
}

/// Contents of `fetch.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchReport {
    pub date: NaiveDate,
    pub queries: Vec<String>,
    pub per_page: u32,
    pub providers: Vec<String>,
    /// Scenes in the plan.
    pub required: usize,
    /// Video clips and stills downloaded.
    pub visuals: usize,
    /// Audio tracks downloaded.
    pub audio: usize,
    /// Scenes no downloaded visual is long enough for.
    pub shortfall: usize,
    /// Downloaded file names, sorted.
    pub files: Vec<String>,
    /// Final asset directory. Not stored.
    #[serde(skip)]
    pub dir: PathBuf,
}

impl FetchReport {
    /// Read `fetch.json` from a complete asset directory.
    pub fn read(dir: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(dir.join(FETCH_MANIFEST))?;
        let mut report: FetchReport = serde_json::from_str(&content)?;
        report.dir = dir.to_path_buf();
        Ok(report)
    }
}

/// Build the enabled providers, resolving credentials first.
///
/// # Errors
///
/// [`Error::Configuration`] for a missing, placeholder or malformed key.
/// Nothing touches the network or the filesystem before this succeeds.
pub fn build_providers(
    config: &Config,
    pexels_key: Option<&str>,
) -> Result<Vec<Box<dyn StockProvider>>> {
    let key = resolve_pexels_key(pexels_key, config)?;
    let mut providers: Vec<Box<dyn StockProvider>> = vec![Box::new(PexelsProvider::new(
        key,
        &config.providers.pexels,
        config.fetch.max_height,
    )?)];

    if config.providers.openverse.enabled {
        let token = resolve_openverse_token(config)?;
        providers.push(Box::new(OpenverseProvider::new(
            token,
            &config.providers.openverse,
        )?));
    }
    Ok(providers)
}

/// Fetch assets with the providers named in `config`.
pub async fn fetch_assets(config: &Config, options: &FetchOptions) -> Result<FetchReport> {
    check_queries(&options.queries)?;
    let providers = build_providers(config, options.pexels_key.as_deref())?;
    fetch_with_providers(config, options, &providers).await
}

/// Blocking wrapper around [`fetch_assets`] on a current-thread runtime.
pub fn fetch_assets_blocking(config: &Config, options: &FetchOptions) -> anyhow::Result<FetchReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(fetch_assets(config, options))?)
}

/// Fetch into `assets/<date>/` using the given providers.
pub async fn fetch_with_providers(
    config: &Config,
    options: &FetchOptions,
    providers: &[Box<dyn StockProvider>],
) -> Result<FetchReport> {
    check_queries(&options.queries)?;
    if providers.is_empty() {
        return Err(Error::configuration("no stock providers enabled"));
    }

    let root = &config.paths.assets_dir;
    std::fs::create_dir_all(root)?;
    let name = dated_dir_name(options.date);
    let final_dir = root.join(&name);
    let staging = root.join(format!(".{name}.partial"));

    if staging.exists() {
        warn!("Removing stale staging directory {:?}", staging);
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let mut report = match fetch_into(&staging, config, options, providers).await {
        Ok(report) => report,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }
    };

    if let Err(e) = promote(&staging, &final_dir) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }
    report.dir = final_dir;

    info!(
        dir = %report.dir.display(),
        visuals = report.visuals,
        audio = report.audio,
        "Fetch complete"
    );
    Ok(report)
}

/// Rename the staging directory into place, replacing an earlier fetch for
/// the same date.
fn promote(staging: &Path, final_dir: &Path) -> Result<()> {
    if final_dir.exists() {
        if is_complete(final_dir) {
            info!("Replacing earlier fetch {:?}", final_dir);
        }
        std::fs::remove_dir_all(final_dir)?;
    }
    std::fs::rename(staging, final_dir)?;
    Ok(())
}

/// Unique file name inside `dir` for a candidate.
fn unique_dest(dir: &Path, file_name: &str) -> PathBuf {
    let dest = dir.join(file_name);
    if !dest.exists() {
        return dest;
    }
    let (stem, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    (2..)
        .map(|n| dir.join(format!("{stem}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(dest)
}

/// Scene minimums no downloaded visual covers yet.
///
/// A clip claims the most demanding open scene it is long enough for, so the
/// downloaded set can always be matched the way `assign_scenes` matches it.
#[derive(Debug)]
struct OpenScenes {
    /// Ascending.
    mins: Vec<f64>,
}

impl OpenScenes {
    fn new(plan: &[ScenePlanEntry]) -> Self {
        let mut mins: Vec<f64> = plan.iter().map(|s| s.min_secs).collect();
        mins.sort_by(f64::total_cmp);
        Self { mins }
    }

    /// Claim a scene for a visual; stills fit any scene.
    fn claim(&mut self, kind: MediaKind, duration_secs: Option<f64>) -> bool {
        let fits = |min: f64| match kind {
            MediaKind::Image => true,
            MediaKind::Video => duration_secs.is_some_and(|d| d >= min),
            MediaKind::Audio => false,
        };
        match self.mins.iter().rposition(|&min| fits(min)) {
            Some(i) => {
                self.mins.remove(i);
                true
            }
            None => false,
        }
    }

    fn remaining(&self) -> usize {
        self.mins.len()
    }
}

fn check_queries(queries: &[String]) -> Result<()> {
    if queries.is_empty() || queries.iter().any(|q| q.trim().is_empty()) {
        return Err(Error::configuration("at least one non-blank search query is required"));
    }
    Ok(())
}

async fn fetch_into(
    staging: &Path,
    config: &Config,
    options: &FetchOptions,
    providers: &[Box<dyn StockProvider>],
) -> Result<FetchReport> {
    let allowed = &config.fetch.licenses;
    let required = config.scenes.len();
    let min_clip_secs = config
        .scenes
        .iter()
        .map(|s| s.min_secs)
        .fold(f64::INFINITY, f64::min);

    let mut open = OpenScenes::new(&config.scenes);
    let mut spares_left = config.fetch.spare_assets;
    let mut seen: HashSet<(&'static str, String)> = HashSet::new();
    let mut assets: Vec<Asset> = Vec::new();
    let mut visuals = 0usize;
    let mut audio = 0usize;

    for (i, term) in options.queries.iter().enumerate() {
        // The remaining quota is spread over the remaining terms.
        let per_term = (open.remaining() + spares_left).div_ceil(options.queries.len() - i);
        debug!(term = %term, per_term, open = open.remaining(), spares_left, "Term quota");
        let mut licensed_results = 0usize;
        let mut taken = 0usize;

        for provider in providers {
            let candidates = provider.search(term, options.per_page).await?;
            let total = candidates.len();

            let usable: Vec<Candidate> = candidates
                .into_iter()
                .filter(|c| allowed.allows(&c.license))
                .collect();
            if usable.len() < total {
                debug!(
                    provider = provider.name(),
                    term = %term,
                    excluded = total - usable.len(),
                    "Excluded results with disallowed licenses"
                );
            }
            licensed_results += usable.len();

            for candidate in usable {
                let key = (provider.name(), candidate.provider_id.clone());
                if seen.contains(&key) {
                    continue;
                }
                let wanted = match candidate.kind {
                    MediaKind::Audio => audio == 0,
                    _ if taken >= per_term => false,
                    kind if open.claim(kind, candidate.duration_secs) => true,
                    kind => {
                        let usable_spare = kind == MediaKind::Image
                            || candidate.duration_secs.is_some_and(|d| d >= min_clip_secs);
                        if spares_left > 0 && usable_spare {
                            spares_left -= 1;
                            true
                        } else {
                            debug!(
                                file = %candidate.file_name,
                                duration = ?candidate.duration_secs,
                                "Skipped: fills no open scene"
                            );
                            false
                        }
                    }
                };
                if !wanted {
                    continue;
                }
                seen.insert(key);

                let dest = unique_dest(staging, &candidate.file_name);
                let bytes = provider.download(&candidate, term, &dest).await?;
                let asset = candidate.into_asset(dest, provider.name(), term);
                asset.write_sidecar()?;
                info!(
                    provider = provider.name(),
                    term = %term,
                    file = %asset.file_name(),
                    bytes,
                    "Downloaded"
                );

                if asset.kind == MediaKind::Audio {
                    audio += 1;
                } else {
                    visuals += 1;
                    taken += 1;
                }
                assets.push(asset);
            }
        }

        if licensed_results == 0 {
            let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
            return Err(Error::provider(names.join("+"), term.as_str(), "no licensed results"));
        }
    }

    let shortfall = open.remaining();
    if shortfall > 0 {
        warn!(required, visuals, shortfall, "Downloaded visuals cannot fill every scene");
    }

    write_credits(staging, &assets)?;

    let mut files: Vec<String> = assets.iter().map(|a| a.file_name()).collect();
    files.sort();
    let report = FetchReport {
        date: options.date,
        queries: options.queries.clone(),
        per_page: options.per_page,
        providers: providers.iter().map(|p| p.name().to_string()).collect(),
        required,
        visuals,
        audio,
        shortfall,
        files,
        dir: staging.to_path_buf(),
    };
    std::fs::write(
        staging.join(FETCH_MANIFEST),
        serde_json::to_string_pretty(&report)?,
    )?;
    Ok(report)
}

/// Write `credits.txt`: sorted, deduplicated attribution lines.
fn write_credits(dir: &Path, assets: &[Asset]) -> Result<()> {
    let lines: BTreeSet<String> = assets.iter().map(Asset::attribution).collect();
    let mut content = lines.into_iter().collect::<Vec<_>>().join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(dir.join(CREDITS_FILE), content)?;
    Ok(())
}
