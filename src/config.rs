//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di compressione
//! - Fornisce validazione dei parametri di input
//! - Supporta il caricamento della configurazione da file JSON
//! - Rende espliciti i due vincoli storici (soglia in byte, budget in kilobit)
//!
//! ## Parametri di configurazione:
//! - `threshold_bytes`: Dimensione oltre la quale un video va compresso (default: 10 MiB)
//! - `target_total_kilobits`: Budget totale dell'output in kilobit (default: 10*1024*8)
//! - `video_bitrate_share` / `audio_bitrate_share`: Quote del budget (0.8 / 0.15)
//! - `workers`: Numero massimo di encoder concorrenti (default: 2)
//! - `probe_timeout_secs` / `encode_timeout_secs`: Limiti per i tool esterni
//! - `reserve_dir_name`: Nome della directory di backup (default: "reserve")
//! - `ffmpeg_bin` / `ffprobe_bin`: Override dei binari esterni
//!
//! ## Nota sulle unità:
//! La soglia è in byte, il budget in kilobit. La quota residua (5%) copre
//! l'overhead del container.
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     workers: 4,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::platform::PlatformCommands;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Files strictly larger than this are compressed.
pub const DEFAULT_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

/// Size budget of a compressed file, in kilobits.
pub const DEFAULT_TARGET_TOTAL_KILOBITS: f64 = (10 * 1024 * 8) as f64;

/// Configuration for batch compression and reserve reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files larger than this many bytes are candidates
    pub threshold_bytes: u64,
    /// Total output budget in kilobits
    pub target_total_kilobits: f64,
    /// Fraction of the budget given to the video stream
    pub video_bitrate_share: f64,
    /// Fraction of the budget given to the audio stream
    pub audio_bitrate_share: f64,
    /// Maximum number of files probed/encoded at once
    pub workers: usize,
    /// Seconds before an ffprobe call is killed
    pub probe_timeout_secs: u64,
    /// Seconds before an ffmpeg encode is killed
    pub encode_timeout_secs: u64,
    /// Name of the backup directory inside the working directory
    pub reserve_dir_name: String,
    /// ffmpeg executable
    pub ffmpeg_bin: PathBuf,
    /// ffprobe executable
    pub ffprobe_bin: PathBuf,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        let platform = PlatformCommands::instance();
        Self {
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            target_total_kilobits: DEFAULT_TARGET_TOTAL_KILOBITS,
            video_bitrate_share: 0.8,
            audio_bitrate_share: 0.15,
            workers: 2,
            probe_timeout_secs: 60,
            encode_timeout_secs: 3600,
            reserve_dir_name: "reserve".to_string(),
            ffmpeg_bin: PathBuf::from(platform.get_command("ffmpeg")),
            ffprobe_bin: PathBuf::from(platform.get_command("ffprobe")),
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.threshold_bytes == 0 {
            return Err(anyhow::anyhow!("Size threshold must be greater than 0 bytes"));
        }

        if !(self.target_total_kilobits.is_finite() && self.target_total_kilobits > 0.0) {
            return Err(anyhow::anyhow!("Target size budget must be a positive number of kilobits"));
        }

        for (name, share) in [
            ("Video", self.video_bitrate_share),
            ("Audio", self.audio_bitrate_share),
        ] {
            if !(share > 0.0 && share <= 1.0) {
                return Err(anyhow::anyhow!("{} bitrate share must be between 0.0 and 1.0", name));
            }
        }

        if self.video_bitrate_share + self.audio_bitrate_share > 1.0 {
            return Err(anyhow::anyhow!("Video and audio shares must not exceed the whole budget"));
        }

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.probe_timeout_secs == 0 || self.encode_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Tool timeouts must be at least one second"));
        }

        // The reserve directory always lives directly inside the working directory
        let mut components = Path::new(&self.reserve_dir_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Reserve directory name must be a single path component: {:?}",
                    self.reserve_dir_name
                ));
            }
        }

        Ok(())
    }

    /// Reserve directory for a given working directory
    pub fn reserve_dir(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(&self.reserve_dir_name)
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.video_bitrate_share = 0.9;
        config.audio_bitrate_share = 0.2;
        assert!(config.validate().is_err());

        config.video_bitrate_share = 0.8;
        config.audio_bitrate_share = 0.15;
        config.threshold_bytes = 0;
        assert!(config.validate().is_err());

        config.threshold_bytes = DEFAULT_THRESHOLD_BYTES;
        config.encode_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reserve_dir_name_validation() {
        let mut config = Config::default();

        config.reserve_dir_name = String::new();
        assert!(config.validate().is_err());

        config.reserve_dir_name = "nested/reserve".to_string();
        assert!(config.validate().is_err());

        config.reserve_dir_name = "..".to_string();
        assert!(config.validate().is_err());

        config.reserve_dir_name = "backup".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.reserve_dir(Path::new("/videos")), PathBuf::from("/videos/backup"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.threshold_bytes, 10 * 1024 * 1024);
        assert_eq!(config.target_total_kilobits, 81920.0);
        assert_eq!(config.video_bitrate_share, 0.8);
        assert_eq!(config.audio_bitrate_share, 0.15);
        assert_eq!(config.workers, 2);
        assert_eq!(config.reserve_dir_name, "reserve");
        assert!(!config.json_output);
    }

    #[tokio::test]
    async fn test_config_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            workers: 6,
            encode_timeout_secs: 120,
            reserve_dir_name: "backup".to_string(),
            ffmpeg_bin: PathBuf::from("/opt/ffmpeg/bin/ffmpeg"),
            ..Default::default()
        };

        let content = serde_json::to_string_pretty(&original_config).unwrap();
        tokio::fs::write(&config_path, content).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.workers, 6);
        assert_eq!(loaded_config.encode_timeout_secs, 120);
        assert_eq!(loaded_config.reserve_dir_name, "backup");
        assert_eq!(loaded_config.ffmpeg_bin, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(loaded_config.threshold_bytes, DEFAULT_THRESHOLD_BYTES);
    }

    #[tokio::test]
    async fn test_partial_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "workers": 3 }"#).await.unwrap();

        let loaded_config = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded_config.workers, 3);
        assert_eq!(loaded_config.reserve_dir_name, "reserve");
    }

    #[tokio::test]
    async fn test_missing_config_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.workers, Config::default().workers);
    }
}
