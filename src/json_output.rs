//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON (una riga per evento) per
//! chi lancia il compressore da script e vuole distinguere i fallimenti parziali.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio della run (directory, numero file, configurazione)
//! - `file_start`: Inizio elaborazione di un file
//! - `file_complete`: Esito di un file (compressed / still_oversized / failed)
//! - `progress`: Contatori correnti
//! - `complete`: Fine run con contatori finali
//! - `error`: Errore che impedisce la run

use crate::config::Config;
use crate::progress::{FileOutcome, RunSummary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        working_dir: PathBuf,
        reserve_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    FileStart {
        path: PathBuf,
        size: u64,
        index: usize,
        total: usize,
    },

    FileComplete {
        path: PathBuf,
        outcome: String,
        output_size: Option<u64>,
        error: Option<String>,
    },

    Progress {
        completed: usize,
        total: usize,
        succeeded: usize,
        failed: usize,
        still_oversized: usize,
    },

    Complete {
        succeeded: usize,
        failed: usize,
        still_oversized: usize,
        duration_seconds: f64,
    },

    Error { message: String },
}

/// Configurazione riportata nel messaggio `start`
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub threshold_bytes: u64,
    pub target_total_kilobits: f64,
    pub workers: usize,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            threshold_bytes: config.threshold_bytes,
            target_total_kilobits: config.target_total_kilobits,
            workers: config.workers,
        }
    }
}

impl JsonMessage {
    pub fn file_complete(path: PathBuf, outcome: &FileOutcome) -> Self {
        let error = match outcome {
            FileOutcome::Failed { error } => Some(error.clone()),
            _ => None,
        };
        Self::FileComplete {
            path,
            outcome: outcome.label().to_string(),
            output_size: outcome.output_size(),
            error,
        }
    }

    pub fn progress(summary: &RunSummary) -> Self {
        Self::Progress {
            completed: summary.completed(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            still_oversized: summary.still_oversized,
        }
    }

    pub fn complete(summary: &RunSummary, duration_seconds: f64) -> Self {
        Self::Complete {
            succeeded: summary.succeeded,
            failed: summary.failed,
            still_oversized: summary.still_oversized,
            duration_seconds,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to a single line
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {}"}}"#, e)
        })
    }

    /// Emette il messaggio su stdout
    pub fn emit(&self) {
        println!("{}", self.to_line());
    }
}
