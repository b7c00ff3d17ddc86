//! # Video Shrink - Main Entry Point
//!
//! Punto di ingresso del compressore.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione (file JSON + override da CLI)
//! - Avvio di `BatchCompressor` e gestione dell'exit code
//!
//! ## Exit code:
//! - `1` se non ci sono video sopra soglia
//! - `0` dopo che tutti i file hanno un esito (anche se alcuni sono falliti)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! video-shrink                       # directory padre dell'eseguibile
//! video-shrink /path/to/videos --workers 4 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

use reserve_shrink::{json_output::JsonMessage, platform, BatchCompressor, CompressError, Config};

#[derive(Parser)]
#[command(name = "video-shrink")]
#[command(about = "Shrink oversized MP4 files, keeping originals in a reserve directory")]
struct Args {
    /// Directory containing the videos (default: parent of the executable's directory)
    working_directory: Option<PathBuf>,

    /// Maximum number of videos encoded at once
    #[arg(short, long)]
    workers: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output progress and status as JSON lines
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.json_output |= args.json;
    let json_output = config.json_output;

    let working_dir = match args.working_directory {
        Some(dir) => dir,
        None => platform::default_working_dir()?,
    };
    if !working_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Working directory does not exist: {}",
            working_dir.display()
        ));
    }

    let compressor = BatchCompressor::new(&working_dir, config)?;
    match compressor.run().await {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.downcast_ref::<CompressError>(), Some(CompressError::DiscoveryEmpty)) => {
            if json_output {
                JsonMessage::error(e.to_string()).emit();
            } else {
                println!("No valid video files found.");
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("{:#}", e);
            if json_output {
                JsonMessage::error(format!("{:#}", e)).emit();
            }
            Err(e)
        }
    }
}
