//! # Batch Compressor Orchestrator
//!
//! Orchestratore principale: discovery, dispatch con pool limitato di worker,
//! attesa di tutti i task e riepilogo finale.
//!
//! ## Gestione concorrenza:
//! - Semaforo con `workers` permessi, acquisito PRIMA del backup del file
//!   successivo (al massimo `workers` file sono in reserve contemporaneamente)
//! - Backup sequenziale nel loop di dispatch, probe/encode nei task
//! - Contatori posseduti solo dall'aggregatore (`ProgressTracker`)
//! - La run termina solo quando tutti i task hanno riportato un esito

use crate::{
    config::Config,
    error::CompressError,
    file_manager::FileManager,
    json_output::{JsonConfig, JsonMessage},
    optimizer::{
        progress_tracker::{ProgressEvent, ProgressTracker},
        task::CompressionTask,
    },
    progress::{FileOutcome, RunSummary},
    video_processor::VideoProcessor,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Orchestratore della compressione di una directory
pub struct BatchCompressor {
    config: Config,
    working_dir: PathBuf,
    reserve_dir: PathBuf,
}

impl BatchCompressor {
    pub fn new(working_dir: &Path, config: Config) -> Result<Self> {
        config.validate()?;
        let reserve_dir = config.reserve_dir(working_dir);

        Ok(Self {
            config,
            working_dir: working_dir.to_path_buf(),
            reserve_dir,
        })
    }

    pub fn reserve_dir(&self) -> &Path {
        &self.reserve_dir
    }

    /// Trova i video da comprimere
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        FileManager::find_oversized_videos(&self.working_dir, self.config.threshold_bytes)
    }

    /// Esegue la compressione di tutti i video sopra soglia.
    ///
    /// Ritorna `CompressError::DiscoveryEmpty` se non c'è nulla da fare.
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();

        let files = self.discover()?;
        if files.is_empty() {
            return Err(CompressError::DiscoveryEmpty.into());
        }

        VideoProcessor::check_dependencies(&self.config).await?;
        self.log_configuration(&files);

        let tracker = ProgressTracker::new(files.len(), self.config.json_output);
        tracker.announce();
        let (tx, aggregator) = tracker.spawn();

        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let task = Arc::new(CompressionTask::new(
            self.config.clone(),
            self.reserve_dir.clone(),
        ));
        let mut handles = Vec::with_capacity(files.len());

        for (index, original) in files.into_iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;

            let size = FileManager::get_file_size(&original).await.unwrap_or(0);
            let _ = tx.send(ProgressEvent::Started {
                path: original.clone(),
                size,
                index,
            });

            let reserve = match task.backup(&original).await {
                Ok(reserve) => reserve,
                Err(err) => {
                    error!("{}", err);
                    let _ = tx.send(ProgressEvent::Finished {
                        path: original,
                        outcome: FileOutcome::Failed {
                            error: err.to_string(),
                        },
                    });
                    continue;
                }
            };

            let task = task.clone();
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;

                let progress_tx = tx.clone();
                let progress_path = original.clone();
                let outcome = task
                    .compress_backed_up(&original, &reserve, move |percent| {
                        let _ = progress_tx.send(ProgressEvent::Encoding {
                            path: progress_path.clone(),
                            percent,
                        });
                    })
                    .await;

                let _ = tx.send(ProgressEvent::Finished {
                    path: original,
                    outcome,
                });
            }));
        }
        drop(tx);

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                error!("Compression task panicked: {}", e);
            }
        }
        let summary = aggregator.await?;

        let elapsed = start_time.elapsed().as_secs_f64();
        if self.config.json_output {
            JsonMessage::complete(&summary, elapsed).emit();
        } else {
            info!("=== Compression finished in {:.1}s ===", elapsed);
        }

        Ok(summary)
    }

    fn log_configuration(&self, files: &[PathBuf]) {
        if self.config.json_output {
            JsonMessage::Start {
                working_dir: self.working_dir.clone(),
                reserve_dir: self.reserve_dir.clone(),
                total_files: files.len(),
                config: JsonConfig::from(&self.config),
            }
            .emit();
            return;
        }

        info!("Working directory: {}", self.working_dir.display());
        info!("Reserve directory: {}", self.reserve_dir.display());
        info!(
            "Threshold: {} | Target budget: {} kbit | Workers: {}",
            FileManager::format_size(self.config.threshold_bytes),
            self.config.target_total_kilobits,
            self.config.workers
        );
    }
}
