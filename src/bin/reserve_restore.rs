//! # Reserve Restore - Entry Point
//!
//! Riporta i video dalla directory reserve nella directory di lavoro,
//! sostituendo solo i file che ffprobe considera non validi.
//! Esce sempre con codice 0: gli errori sono solo loggati.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reserve_shrink::{
    platform, video_processor::VideoProcessor, Config, ReconcileAction, Reconciler,
};

#[derive(Parser)]
#[command(name = "reserve-restore")]
#[command(about = "Move valid videos from the reserve directory back into the working directory")]
struct Args {
    /// Directory containing the videos (default: parent of the executable's directory)
    working_directory: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let config = match args.config {
        Some(ref path) => match Config::from_file(path).await {
            Ok(config) => config,
            Err(e) => {
                error!("Error: {:#}", e);
                return;
            }
        },
        None => Config::default(),
    };

    let working_dir = match args.working_directory {
        Some(dir) => dir,
        None => match platform::default_working_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("Error: {}", e);
                return;
            }
        },
    };
    let reserve_dir = config.reserve_dir(&working_dir);

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            info!("Executable directory: {}", dir.display());
        }
    }
    info!("Target directory: {}", working_dir.display());
    info!("Reserve directory: {}", reserve_dir.display());

    let reconciler = Reconciler::new(VideoProcessor::new(config));
    let report = reconciler.run(&reserve_dir, &working_dir).await;
    info!(
        "{} entries examined: {} moved, {} replaced, {} left in reserve",
        report.entries.len(),
        report.count(&ReconcileAction::Moved),
        report.count(&ReconcileAction::Replaced),
        report.count(&ReconcileAction::SkippedInvalidSource)
            + report.count(&ReconcileAction::SkippedValidTarget)
    );
}
