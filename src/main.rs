mod cli;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use vg_av::{ToolRegistry, UpscaleOptions, Workspace};
use vg_core::config::Config;
use vg_fetch::{FetchClient, Fetched, Resolution};
use vg_lookup::LookupClient;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging.
    // Respect RUST_LOG env var if set, otherwise use defaults based on the
    // verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidgrab=trace,vg_core=trace,vg_av=trace,vg_fetch=trace,vg_lookup=trace,vg_server=trace,tower_http=debug"
                .to_string()
        } else {
            "vidgrab=debug,vg_av=debug,vg_fetch=debug,vg_lookup=debug,vg_server=debug,tower_http=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            } else if let Some(port) = port_from_env() {
                config.server.port = port;
            }
            tracing::info!(
                "Starting vidgrab server on {}:{}",
                config.server.host,
                config.server.port
            );
            rt.block_on(vg_server::start(config))?;
            Ok(())
        }
        Commands::Fetch {
            url,
            resolution,
            output_dir,
        } => rt.block_on(run_fetch(&url, &resolution, output_dir, cli.config.as_deref())),
        Commands::Upscale {
            input,
            output,
            width,
            height,
        } => rt.block_on(run_upscale(&input, output, width, height, cli.config.as_deref())),
        Commands::Lookup {
            email,
            results,
            json,
        } => rt.block_on(run_lookup(&email, results, json, cli.config.as_deref())),
        Commands::Probe { file, json } => rt.block_on(probe_file(&file, json, cli.config.as_deref())),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidgrab {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// The hosting environment passes the listen port via `PORT`.
fn port_from_env() -> Option<u16> {
    std::env::var("PORT").ok()?.parse().ok()
}

async fn run_fetch(
    url: &str,
    resolution: &str,
    output_dir: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let resolution: Resolution = resolution.parse()?;

    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    let fetch = FetchClient::new(tools.clone(), &config.fetch);

    let workspace = Workspace::new()?;

    println!("Fetching {url} at {resolution}...");
    let outcome = fetch.fetch(url, resolution, workspace.path()).await?;

    let (artifact, merged) = match &outcome.streams {
        Fetched::Progressive { path } => (path.clone(), false),
        Fetched::Split { video, audio } => {
            println!("No progressive stream; merging video and audio...");
            let merged_path = workspace.temp_file(&format!("output_{resolution}.mp4"));
            vg_av::merge_streams(&tools, video, audio, &merged_path).await?;
            (merged_path, true)
        }
    };

    let dir = output_dir.unwrap_or_else(|| config.server.download_dir.clone());
    std::fs::create_dir_all(&dir)?;
    let dest = dir.join(outcome.artifact_name(None));
    workspace.promote(&artifact, &dest)?;

    if let Some(title) = &outcome.title {
        println!("Title: {title}");
    }
    if merged {
        println!("Downloaded and merged video successfully.");
    } else {
        println!("Downloaded video with audio successfully.");
    }
    println!("Saved as '{}'.", dest.display());

    Ok(())
}

async fn run_upscale(
    input: &Path,
    output: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load_or_default(config_path);

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let mut opts = UpscaleOptions::from(&config.upscale);
    if let Some(w) = width {
        opts.width = w;
    }
    if let Some(h) = height {
        opts.height = h;
    }

    let output = output.unwrap_or_else(|| default_upscale_output(input));
    let tools = ToolRegistry::discover(&config.tools);

    println!("Upscaling video to {}x{}...", opts.width, opts.height);

    let result = vg_av::upscale(&tools, input, &output, &opts, |progress| {
        match progress.percent() {
            Some(pct) => print!("\rProgress: {pct:.2}%"),
            None => print!("\rFrames: {}", progress.frames_done),
        }
        let _ = std::io::stdout().flush();
    })
    .await?;

    println!();
    println!("Final video saved as '{}'.", result.display());

    Ok(())
}

/// `<stem>_upscaled.mp4` next to the input.
fn default_upscale_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    input.with_file_name(format!("{stem}_upscaled.mp4"))
}

async fn run_lookup(
    email: &str,
    results: Option<usize>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);
    if let Some(n) = results {
        config.lookup.result_count = n;
    }

    let client = LookupClient::new(config.lookup)?;
    let report = client.run(email).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nChecking Gravatar...");
    match &report.gravatar {
        Some(info) => {
            println!("Found Gravatar profile:");
            if let Some(url) = &info.profile_url {
                println!("  Profile: {url}");
            }
            if let Some(name) = &info.name {
                println!("  Name: {name}");
            }
        }
        None => println!("No Gravatar profile found."),
    }

    println!("\nPerforming web search...");
    if report.links.is_empty() {
        println!("No public links found.");
    } else {
        println!("Public links found:");
        for link in &report.links {
            println!("  {link}");
        }
    }

    Ok(())
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let meta = vg_av::probe(&tools, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Resolution: {}x{}", meta.width, meta.height);
    println!("Frame rate: {:.3} fps", meta.fps);
    match meta.frame_count {
        Some(n) => println!("Frames: {n}"),
        None => println!("Frames: unknown"),
    }
    if let Some(duration) = meta.duration_secs {
        let secs = duration as u64;
        println!("Duration: {:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    }
    println!("Audio: {}", if meta.has_audio { "yes" } else { "no" });

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let registry = ToolRegistry::discover(&config.tools);

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in registry.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)?;
            let config = Config::from_json(&contents)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("✓ Configuration is valid");
            } else {
                println!("Configuration parsed with {} warning(s):", warnings.len());
                for warning in &warnings {
                    println!("  - {warning}");
                }
            }
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Download dir: {}", config.server.download_dir.display());
            println!("  Fetch attempts: {}", config.fetch.max_attempts);
            println!(
                "  Player clients: {}",
                config.fetch.player_clients.join(", ")
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Download dir: {}", config.server.download_dir.display());
        }
    }

    Ok(())
}
