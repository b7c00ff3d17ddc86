//! # Reserve Shrink Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per i due binari (`video-shrink`, `reserve-restore`)
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per ogni fase della pipeline
//! - `platform`: Risoluzione comandi esterni e directory di default
//! - `file_manager`: Discovery, backup in reserve e restore
//! - `video_processor`: ffprobe/ffmpeg, calcolo bitrate, timeout
//! - `optimizer`: Orchestratore batch, task per-file, aggregatore dei contatori
//! - `reconciler`: Riporta la reserve nella directory di lavoro
//! - `progress`: Riepilogo della run e progress bar
//! - `json_output`: Eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use reserve_shrink::{BatchCompressor, Config};
//!
//! let compressor = BatchCompressor::new(&dir, Config::default())?;
//! let summary = compressor.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod platform;
pub mod progress;
pub mod reconciler;
pub mod utils;
pub mod video_processor;

#[cfg(all(test, unix))]
mod test_support;

pub use config::Config;
pub use error::CompressError;
pub use optimizer::BatchCompressor;
pub use progress::{FileOutcome, RunSummary};
pub use reconciler::{ReconcileAction, ReconcileReport, Reconciler};
