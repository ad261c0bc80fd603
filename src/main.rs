//! Meaty MIDI Editor - terminal front end
//!
//! Assign MIDI functions to the controls of the meaty controller, four
//! layers at a time, and save them as XML.

use anyhow::{Context, Result};
use clap::Parser;
use meaty_midi_editor::cli;
use meaty_midi_editor::paths::AppPaths;
use meaty_midi_editor::{EditorConfig, EditorSession, MappingStore};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Meaty MIDI Editor - map controller buttons, knobs and slider to MIDI functions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to settings file (defaults to the platform location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Mapping file to load at startup
    #[arg(short, long)]
    open: Option<PathBuf>,

    /// List every mappable control and exit
    #[arg(long)]
    list_controls: bool,

    /// Print the assignments in a mapping file and exit
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Validate a mapping file and exit (non-zero status on error)
    #[arg(long, value_name = "FILE")]
    check: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level)?;

    if args.list_controls {
        cli::print_controls();
        return Ok(());
    }

    let paths = AppPaths::detect();
    let settings_path = args.config.clone().unwrap_or_else(|| paths.settings.clone());
    info!("Settings file: {}", settings_path.display());
    let config = EditorConfig::load_or_default(&settings_path)?;

    if let Some(path) = &args.dump {
        let store = MappingStore::new();
        store
            .load_from_file(path, config.file.load_policy)
            .with_context(|| format!("Failed to read mapping file {}", path.display()))?;
        cli::print_document(&store);
        return Ok(());
    }

    if let Some(path) = &args.check {
        let report = MappingStore::new()
            .load_from_file(path, config.file.load_policy)
            .with_context(|| format!("{} is not a valid mapping file", path.display()))?;
        cli::print_load_report(&report);
        return Ok(());
    }

    let session = EditorSession::with_config(MappingStore::new(), &config)
        .context("Invalid session settings")?;

    if let Err(e) = paths.ensure_directories() {
        warn!("{:#}", e);
    }

    if let Some(path) = &args.open {
        let report = session
            .load(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        cli::print_load_report(&report);
    }

    cli::run_repl(&session, &paths)?;

    info!("Meaty MIDI Editor closed");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
