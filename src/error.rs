//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` enum per categorizzare gli esiti falliti di un file
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `DiscoveryEmpty`: Nessun video sopra soglia (unico caso con exit code != 0)
//! - `BackupRename`: Spostamento in reserve fallito (nessun restore necessario)
//! - `Probe`: ffprobe fallito o metadata inutilizzabili (restore)
//! - `Encode`: ffmpeg fallito (restore)
//! - `Timeout`: Tool esterno terminato per timeout (restore)
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, ffprobe)
//! - `Io`: Errori di I/O generici
//!
//! Un file compresso ma ancora sopra soglia NON è un errore: è un esito
//! separato (`FileOutcome::StillOversized`).

use std::path::PathBuf;

/// Custom error types for batch compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("No valid video files found")]
    DiscoveryEmpty,

    #[error("Failed to move {} into reserve: {source}", path.display())]
    BackupRename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ffprobe error: {0}")]
    Probe(String),

    #[error("FFmpeg compression error: {0}")]
    Encode(String),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompressError {
    /// Whether the reserve copy must be moved back after this error
    pub fn needs_restore(&self) -> bool {
        matches!(
            self,
            Self::Probe(_) | Self::Encode(_) | Self::Timeout { .. } | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_failure_does_not_restore() {
        let err = CompressError::BackupRename {
            path: PathBuf::from("/videos/a.mp4"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.needs_restore());
        assert!(err.to_string().contains("/videos/a.mp4"));
    }

    #[test]
    fn test_tool_failures_restore() {
        assert!(CompressError::Probe("bad".into()).needs_restore());
        assert!(CompressError::Encode("crash".into()).needs_restore());
        assert!(CompressError::Timeout { stage: "encode", secs: 5 }.needs_restore());
        assert_eq!(
            CompressError::Timeout { stage: "probe", secs: 60 }.to_string(),
            "probe timed out after 60s"
        );
    }
}
