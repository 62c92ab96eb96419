mod cli;

use reelsmith::{
    assemble, config, fetch, library, music, output,
    pipeline::{self, RunOptions, ThumbnailRequest},
    thumbnail, tools,
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelsmith=trace,reelsmith_av=debug,reelsmith_common=debug".to_string()
        } else {
            "reelsmith=info,reelsmith_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Fetch {
            queries,
            per_page,
            date,
            pexels_key,
        } => fetch_assets(config_path, queries, per_page, date, pexels_key),
        Commands::Metadata { assets, output } => {
            write_metadata(config_path, assets.as_deref(), &output)
        }
        Commands::Assemble { assets, output } => {
            assemble_montage(config_path, assets.as_deref(), &output)
        }
        Commands::Thumbnail {
            video,
            title,
            brand,
            size,
            assets,
            output,
        } => {
            let size = size
                .as_deref()
                .map(thumbnail::parse_size)
                .transpose()?;
            let request = ThumbnailRequest {
                video,
                title,
                brand,
                size,
                metadata_title: None,
            };
            draw_thumbnail(config_path, request, assets.as_deref(), &output)
        }
        Commands::Music {
            duration,
            seed,
            key,
            mode,
            bpm,
        } => generate_music(config_path, duration, seed, key, mode, bpm),
        Commands::Run {
            date,
            skip_fetch,
            pexels_key,
        } => run_pipeline(config_path, date, skip_fetch, pexels_key),
        Commands::Verify { dir } => verify_run(&dir),
        Commands::CheckTools => check_tools(config_path),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelsmith {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn fetch_assets(
    config_path: Option<&Path>,
    queries: Vec<String>,
    per_page: Option<u32>,
    date: Option<NaiveDate>,
    pexels_key: Option<String>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let mut options = fetch::FetchOptions::from_config(&config, date.unwrap_or_else(today));
    if !queries.is_empty() {
        options.queries = queries;
    }
    if let Some(per_page) = per_page {
        if per_page == 0 || per_page > 80 {
            anyhow::bail!("--per-page must be in 1..=80, got {}", per_page);
        }
        options.per_page = per_page;
    }
    options.pexels_key = pexels_key;

    let report = fetch::fetch_assets_blocking(&config, &options)?;

    println!("Assets: {}", report.dir.display());
    println!("  Visuals: {}", report.visuals);
    println!("  Audio: {}", report.audio);
    if report.shortfall > 0 {
        println!(
            "  Shortfall: {} (the plan needs {}; assembly will fail until more assets are fetched)",
            report.shortfall, report.required
        );
    }
    Ok(())
}

fn write_metadata(config_path: Option<&Path>, assets: Option<&Path>, output: &Path) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let plan = pipeline::plan_run(&config, assets, None)?;
    let record = pipeline::write_metadata(&config, &plan, today(), output)?;

    println!("Metadata: {}", output.display());
    println!("  Title: {}", record.title);
    println!("  Locales: {}", record.locales.len());
    println!("  Credits: {}", record.credits.len());
    Ok(())
}

fn assemble_montage(config_path: Option<&Path>, assets: Option<&Path>, output: &Path) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = tools::discover(&config)?;
    let plan = pipeline::plan_run(&config, assets, None)?;

    let report = assemble::assemble(
        &config,
        &tools,
        &plan.assignments,
        plan.soundtrack.as_ref(),
        output,
    )?;

    println!("Montage: {}", report.output.display());
    println!(
        "  {} scenes, {:.1}s, {}x{}",
        report.segments, report.duration_secs, report.width, report.height
    );
    if let Some(ref track) = report.soundtrack {
        println!("  Soundtrack: {}", track);
    }
    Ok(())
}

fn draw_thumbnail(
    config_path: Option<&Path>,
    mut request: ThumbnailRequest,
    assets: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = tools::discover(&config)?;

    // Without a montage the frame comes from the first scene's asset, if any.
    let assignments = if request.video.is_some() {
        Vec::new()
    } else {
        match library::resolve_asset_dir(assets, &config.paths.assets_dir)
            .and_then(|dir| library::load_assets(&dir, &config.fetch.licenses))
            .and_then(|lib| assemble::assign_scenes(&config.scenes, &lib))
        {
            Ok(assignments) => assignments,
            Err(e) => {
                tracing::warn!("No scene asset for the thumbnail ({}); drawing a card", e);
                Vec::new()
            }
        }
    };

    if request.metadata_title.is_none() {
        request.metadata_title = sibling_metadata_title(request.video.as_deref());
    }
    let options = pipeline::thumbnail_options(&config, &assignments, &request);
    let written = thumbnail::generate_thumbnail(&tools, &options, output)?;

    println!("Thumbnail: {}", written.display());
    println!("  {}x{}, title {:?}", options.width, options.height, options.title);
    Ok(())
}

/// Title from a `metadata.json` next to the montage.
fn sibling_metadata_title(video: Option<&Path>) -> Option<String> {
    let dir = video?.parent()?;
    let path: PathBuf = dir.join(output::METADATA_FILE);
    reelsmith::metadata::MetadataRecord::read(&path)
        .ok()
        .map(|record| record.title)
}

fn generate_music(
    config_path: Option<&Path>,
    duration: f64,
    seed: Option<u64>,
    key: Option<String>,
    mode: Option<music::Mode>,
    bpm: Option<f64>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if key.is_some() {
        config.music.key = key;
    }
    if mode.is_some() {
        config.music.mode = mode;
    }
    if let Some(bpm) = bpm {
        config.music.bpm = bpm;
    }
    config::validate_config(&config)?;
    let tools = tools::discover(&config)?;
    let seed = seed.unwrap_or(config.audio.seed);

    let track = music::generate_music(&config, &tools, duration, seed)?;

    println!("Soundtrack: {}", track.path.display());
    println!("  {}", track.attribution());
    Ok(())
}

fn run_pipeline(
    config_path: Option<&Path>,
    date: Option<NaiveDate>,
    skip_fetch: bool,
    pexels_key: Option<String>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let options = RunOptions {
        date: date.unwrap_or_else(today),
        skip_fetch,
        pexels_key,
    };

    let outcome = pipeline::run(&config, &options)?;

    println!("Run complete: {}", outcome.dir.display());
    println!("  Duration: {:.1}s", outcome.manifest.duration_secs);
    for artifact in &outcome.manifest.artifacts {
        println!("  {} ({} bytes)", artifact.name, artifact.bytes);
    }
    Ok(())
}

fn verify_run(dir: &Path) -> Result<()> {
    let manifest = output::verify(dir).with_context(|| format!("Run directory {:?} failed verification", dir))?;

    println!("✓ {} is complete", dir.display());
    println!("  Run: {}", manifest.run_id);
    println!("  Duration: {:.1}s", manifest.duration_secs);
    println!("  Credits: {}", manifest.credits);
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let infos = [
        ("ffmpeg", config.tools.ffmpeg_path.as_deref()),
        ("ffprobe", config.tools.ffprobe_path.as_deref()),
    ]
    .map(|(name, configured)| match configured {
        Some(path) => reelsmith_av::check_tool_at(name, path),
        None => reelsmith_av::check_tool(name),
    });
    let mut all_ok = true;

    for tool in &infos {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    if let Ok(tools) = tools::discover(&config) {
        if tools.supports_text() {
            println!("✓ drawtext filter");
        } else {
            all_ok = false;
            println!("✗ drawtext filter (ffmpeg built without libfreetype; captions and thumbnails need it)");
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(())
    } else {
        anyhow::bail!("Some tools are missing. Install a full ffmpeg build.")
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            config::validate_config(&config)?;
            config
        }
    };

    println!("✓ Configuration is valid");
    println!("  Channel: {}", config.channel.name);
    println!(
        "  Scenes: {} ({:.0}-{:.0}s)",
        config.scenes.len(),
        reelsmith_common::scene::min_total_secs(&config.scenes),
        reelsmith_common::scene::max_total_secs(&config.scenes)
    );
    println!("  Queries: {}", config.fetch.queries.join(", "));
    println!(
        "  Video: {}x{} @ {} fps",
        config.video.width, config.video.height, config.video.fps
    );
    println!(
        "  Soundtrack: {}",
        if config.audio.enabled { "enabled" } else { "disabled" }
    );
    println!("  Openverse: {}", config.providers.openverse.enabled);
    Ok(())
}
