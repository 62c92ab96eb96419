use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use reelsmith::music::Mode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelsmith")]
#[command(author, version, about = "Stock-footage montage pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download licensed clips into a dated asset directory
    Fetch {
        /// Search term (repeat for several; replaces fetch.queries)
        #[arg(short, long = "query")]
        queries: Vec<String>,

        /// Results requested per search
        #[arg(long)]
        per_page: Option<u32>,

        /// Date naming the asset directory (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Pexels API key (overrides PEXELS_API_KEY and the config file)
        #[arg(long)]
        pexels_key: Option<String>,
    },

    /// Write title, description, tags and credits as JSON
    Metadata {
        /// Asset directory (default: latest complete one)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "metadata.json")]
        output: PathBuf,
    },

    /// Render the scene plan into a montage
    Assemble {
        /// Asset directory (default: latest complete one)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "montage.mp4")]
        output: PathBuf,
    },

    /// Draw the thumbnail
    Thumbnail {
        /// Montage to take the frame from
        #[arg(long)]
        video: Option<PathBuf>,

        /// Title text
        #[arg(long)]
        title: Option<String>,

        /// Brand mark
        #[arg(long)]
        brand: Option<String>,

        /// Size as WIDTHxHEIGHT
        #[arg(long)]
        size: Option<String>,

        /// Asset directory used when no video is given
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "thumbnail.jpg")]
        output: PathBuf,
    },

    /// Generate an ambient soundtrack into the music directory
    Music {
        /// Length in seconds
        #[arg(long, default_value = "75")]
        duration: f64,

        /// Seed choosing the chord (default: audio.seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Root note such as A or Eb (default: music.key, else seeded)
        #[arg(long)]
        key: Option<String>,

        /// major or minor (default: music.mode, else seeded)
        #[arg(long)]
        mode: Option<Mode>,

        /// Pulse tempo (default: music.bpm)
        #[arg(long)]
        bpm: Option<f64>,
    },

    /// Run every stage into output/<date>/
    Run {
        /// Run date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Reuse the latest complete asset directory
        #[arg(long)]
        skip_fetch: bool,

        /// Pexels API key (overrides PEXELS_API_KEY and the config file)
        #[arg(long)]
        pexels_key: Option<String>,
    },

    /// Check that a run directory is complete and unchanged
    Verify {
        /// Run directory
        #[arg(required = true)]
        dir: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
