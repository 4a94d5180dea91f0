use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidgrab")]
#[command(author, version, about = "Video download service and A/V toolbox")]
pub struct Cli {
    /// Path to config file (JSON)
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
    /// Start the HTTP download service
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and the PORT env var)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Download a video at the given resolution
    Fetch {
        /// Video page URL
        #[arg(required = true)]
        url: String,

        /// Target resolution, e.g. 1080p
        #[arg(short, long, default_value = "1080p")]
        resolution: String,

        /// Directory to place the artifact in (defaults to the configured
        /// download directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Upscale a video frame-by-frame and carry the original audio over
    Upscale {
        /// Input video file
        #[arg(required = true)]
        input: PathBuf,

        /// Output file (defaults to <input>_upscaled.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target width (overrides config)
        #[arg(long)]
        width: Option<u32>,

        /// Target height (overrides config)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Look up public traces of an email address
    Lookup {
        /// Email address to look up
        #[arg(required = true)]
        email: String,

        /// Maximum number of search result links
        #[arg(short = 'n', long)]
        results: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a video file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
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
