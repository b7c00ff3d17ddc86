//! # Progress Tracking Module
//!
//! Aggregatore unico degli esiti: i task per-file inviano eventi su un canale,
//! un solo task possiede `RunSummary` e stampa avanzamento e riepilogo.
//! Gestisce sia output JSON che progress bar tradizionale.

use crate::{
    file_manager::FileManager,
    json_output::JsonMessage,
    progress::{FileOutcome, ProgressManager, RunSummary},
};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Eventi inviati dai task per-file
#[derive(Debug)]
pub enum ProgressEvent {
    Started { path: PathBuf, size: u64, index: usize },
    Encoding { path: PathBuf, percent: f64 },
    Finished { path: PathBuf, outcome: FileOutcome },
}

/// Unico proprietario dei contatori della run
pub struct ProgressTracker {
    summary: RunSummary,
    progress_manager: ProgressManager,
    json_output: bool,
}

impl ProgressTracker {
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden(total_files as u64)
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            summary: RunSummary::new(total_files),
            progress_manager,
            json_output,
        }
    }

    /// Stampa il numero di video trovati e la prima riga di avanzamento
    pub fn announce(&self) {
        if self.json_output {
            JsonMessage::progress(&self.summary).emit();
            return;
        }
        self.progress_manager
            .println(&format!("{} videos found", self.summary.total));
        for line in self.summary.report_lines() {
            self.progress_manager.println(&line);
        }
    }

    /// Avvia il task aggregatore e ritorna il canale per i task per-file
    pub fn spawn(self) -> (UnboundedSender<ProgressEvent>, JoinHandle<RunSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    /// Consuma eventi finché tutti i mittenti sono chiusi
    pub async fn run(mut self, mut rx: UnboundedReceiver<ProgressEvent>) -> RunSummary {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }

        if !self.summary.is_complete() {
            warn!(
                "Only {}/{} files reported an outcome",
                self.summary.completed(),
                self.summary.total
            );
        }
        self.progress_manager.finish("done");
        self.summary
    }

    fn handle(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { path, size, index } => {
                if self.json_output {
                    JsonMessage::FileStart {
                        path,
                        size,
                        index,
                        total: self.summary.total,
                    }
                    .emit();
                } else {
                    debug!(
                        "Processing video {} ({}): {}",
                        index + 1,
                        FileManager::format_size(size),
                        path.display()
                    );
                }
            }
            ProgressEvent::Encoding { path, percent } => {
                let name = path.file_name().unwrap_or_default().to_string_lossy();
                debug!("Processing {}: {:.0}% done", name, percent);
                self.progress_manager
                    .set_message(&format!("{}: {:.0}%", name, percent));
            }
            ProgressEvent::Finished { path, outcome } => self.finish_file(path, outcome),
        }
    }

    fn finish_file(&mut self, path: PathBuf, outcome: FileOutcome) {
        if self.summary.is_complete() {
            error!("Unexpected extra outcome for {}", path.display());
            return;
        }

        self.summary.record(&outcome);
        let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();

        match &outcome {
            FileOutcome::Compressed { output_size } => info!(
                "✅ {} compressed to {}",
                name,
                FileManager::format_size(*output_size)
            ),
            FileOutcome::StillOversized { output_size } => warn!(
                "⚠️ {} compressed to {} but still exceeds target size",
                name,
                FileManager::format_size(*output_size)
            ),
            FileOutcome::Failed { error } => error!("❌ {} failed: {}", name, error),
        }

        self.progress_manager.update(&name);

        if self.json_output {
            JsonMessage::file_complete(path, &outcome).emit();
            JsonMessage::progress(&self.summary).emit();
        } else {
            for line in self.summary.report_lines() {
                self.progress_manager.println(&line);
            }
        }
    }
}
