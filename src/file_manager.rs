//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file: discovery dei video,
//! backup nella directory reserve e restore in caso di errore.
//!
//! ## Responsabilità:
//! - Discovery (non ricorsiva) dei file MP4 sopra soglia
//! - Backup atomico tramite rename nella directory reserve
//! - Restore idempotente della copia di backup
//! - Utilità per dimensioni e percentuali
//!
//! ## Sicurezza operazioni:
//! - Tutti gli spostamenti usano `rename` (atomico sullo stesso volume), mai copy+delete
//! - In ogni istante esattamente uno tra path originale e path reserve contiene il video
//! - Il restore senza copia di reserve è un no-op
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_oversized_videos(&dir, config.threshold_bytes)?;
//! for file in files {
//!     let reserve = FileManager::backup_to_reserve(&file, &reserve_dir).await?;
//!     // ... encode, and on failure:
//!     FileManager::restore_backup(&file, &reserve).await?;
//! }
//! ```

use crate::error::CompressError;
use anyhow::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Recognized container extension, matched case-sensitively
pub const VIDEO_EXTENSION: &str = ".mp4";

/// Result of a restore attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The reserve copy was moved back over the original path
    Restored,
    /// No reserve copy existed
    NothingToRestore,
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub async fn get_file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Find MP4 files directly inside `dir` that are larger than `threshold_bytes`.
    ///
    /// Subdirectories are not searched. Order follows the directory listing.
    pub fn find_oversized_videos(dir: &Path, threshold_bytes: u64) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !Self::is_video(path) {
                continue;
            }

            let size = entry.metadata()?.len();
            if size > threshold_bytes {
                debug!("Candidate {} ({})", path.display(), Self::format_size(size));
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check if a file name ends with the video container extension
    pub fn is_video(path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().ends_with(VIDEO_EXTENSION))
            .unwrap_or(false)
    }

    /// Path a file occupies while it is backed up
    pub fn reserve_path(original: &Path, reserve_dir: &Path) -> std::io::Result<PathBuf> {
        let file_name = original.file_name().ok_or_else(|| {
            std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("{} has no file name", original.display()),
            )
        })?;
        Ok(reserve_dir.join(file_name))
    }

    /// Move `original` into `reserve_dir`, creating the directory if needed
    pub async fn backup_to_reserve(
        original: &Path,
        reserve_dir: &Path,
    ) -> Result<PathBuf, CompressError> {
        let backup = |source: std::io::Error| CompressError::BackupRename {
            path: original.to_path_buf(),
            source,
        };

        let reserve_path = Self::reserve_path(original, reserve_dir).map_err(backup)?;
        fs::create_dir_all(reserve_dir).await.map_err(backup)?;
        fs::rename(original, &reserve_path).await.map_err(backup)?;

        debug!("Backed up {} -> {}", original.display(), reserve_path.display());
        Ok(reserve_path)
    }

    /// Move the reserve copy back over `original`, discarding whatever is there
    pub async fn restore_backup(original: &Path, reserve: &Path) -> std::io::Result<RestoreOutcome> {
        if !fs::try_exists(reserve).await? {
            debug!("No reserve copy at {}, nothing to restore", reserve.display());
            return Ok(RestoreOutcome::NothingToRestore);
        }

        info!("Restoring original file from backup: {}", original.display());
        match fs::remove_file(original).await {
            Ok(()) => debug!("Removed partial output {}", original.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::rename(reserve, original).await?;
        info!("Restoration complete: {}", original.display());

        Ok(RestoreOutcome::Restored)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
