//! # Compression Task Module
//!
//! Pipeline di un singolo file: backup → probe → encode → classificazione,
//! con restore della copia di reserve su ogni errore di probe/encode.
//!
//! ## Stati:
//! 1. **Backup**: rename `<dir>/x.mp4` → `<dir>/reserve/x.mp4`. Se fallisce il file
//!    non è stato toccato: nessun restore.
//! 2. **Probe**: durata della copia in reserve. Errore → restore.
//! 3. **Encode**: output scritto sul path originale (ora libero). Errore → restore.
//! 4. **Esito**: `Compressed` se l'output è entro soglia, altrimenti `StillOversized`.
//!    In entrambi i casi la copia in reserve resta dov'è.

use crate::{
    config::Config,
    error::CompressError,
    file_manager::{FileManager, RestoreOutcome},
    progress::FileOutcome,
    video_processor::{BitrateTargets, VideoProcessor},
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Worker per l'elaborazione di singoli file
pub struct CompressionTask {
    config: Config,
    video_processor: VideoProcessor,
    reserve_dir: PathBuf,
}

impl CompressionTask {
    pub fn new(config: Config, reserve_dir: PathBuf) -> Self {
        let video_processor = VideoProcessor::new(config.clone());
        Self {
            config,
            video_processor,
            reserve_dir,
        }
    }

    /// Move the original into the reserve directory
    pub async fn backup(&self, original: &Path) -> Result<PathBuf, CompressError> {
        FileManager::backup_to_reserve(original, &self.reserve_dir).await
    }

    /// Probe and encode a file already moved to `reserve`, restoring it on failure
    pub async fn compress_backed_up<F>(
        &self,
        original: &Path,
        reserve: &Path,
        on_progress: F,
    ) -> FileOutcome
    where
        F: FnMut(f64) + Send,
    {
        match self.probe_and_encode(original, reserve, on_progress).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("{}: {}", original.display(), err);
                let mut message = err.to_string();

                if err.needs_restore() {
                    match FileManager::restore_backup(original, reserve).await {
                        Ok(RestoreOutcome::Restored) => {}
                        Ok(RestoreOutcome::NothingToRestore) => {
                            debug!("Reserve copy already gone for {}", original.display())
                        }
                        Err(restore_err) => {
                            error!(
                                "Failed to restore {} from {}: {}",
                                original.display(),
                                reserve.display(),
                                restore_err
                            );
                            message = format!("{}; restore failed: {}", message, restore_err);
                        }
                    }
                }

                FileOutcome::Failed { error: message }
            }
        }
    }

    async fn probe_and_encode<F>(
        &self,
        original: &Path,
        reserve: &Path,
        on_progress: F,
    ) -> Result<FileOutcome, CompressError>
    where
        F: FnMut(f64) + Send,
    {
        let info = self.video_processor.probe(reserve).await?;
        let targets = BitrateTargets::from_config(info.duration_secs, &self.config);

        info!(
            "🎬 {}: {:.1}s, {} → video {:.2} kbps, audio {:.2} kbps",
            original.file_name().unwrap_or_default().to_string_lossy(),
            info.duration_secs,
            FileManager::format_size(info.size_bytes),
            targets.video_kbps,
            targets.audio_kbps
        );

        self.video_processor
            .encode(reserve, original, &targets, info.duration_secs, on_progress)
            .await?;

        let output_size = FileManager::get_file_size(original).await?;
        debug!(
            "{} reduced by {:.2}%",
            original.display(),
            FileManager::calculate_reduction(info.size_bytes, output_size)
        );

        if output_size <= self.config.threshold_bytes {
            Ok(FileOutcome::Compressed { output_size })
        } else {
            Ok(FileOutcome::StillOversized { output_size })
        }
    }
}
