//! # Reserve Reconciler Module
//!
//! Riporta i file dalla directory reserve nella directory di lavoro.
//!
//! ## Regole per ogni voce della reserve (in ordine di listing):
//! 1. Directory → saltata (nessuna ricorsione)
//! 2. Sorgente non valida (nessuno stream video) → saltata, resta in reserve
//! 3. Nessun file omonimo nel target → spostata
//! 4. File omonimo nel target non valido → sovrascritto (rename atomico)
//! 5. File omonimo nel target valido → saltata, entrambi i file intatti
//!
//! Elaborazione strettamente sequenziale: ogni verifica ffprobe termina prima
//! di passare al file successivo. Gli errori sono loggati, mai propagati.

use crate::video_processor::VideoProcessor;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Decision taken for one reserve entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    Moved,
    Replaced,
    SkippedInvalidSource,
    SkippedValidTarget,
    SkippedDirectory,
    Failed(String),
}

/// Per-entry record of a reconcile run
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub entries: Vec<(String, ReconcileAction)>,
}

impl ReconcileReport {
    pub fn action_for(&self, name: &str) -> Option<&ReconcileAction> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, action)| action)
    }

    pub fn count(&self, action: &ReconcileAction) -> usize {
        self.entries.iter().filter(|(_, a)| a == action).count()
    }
}

/// Moves reserve copies back into the working directory
pub struct Reconciler {
    video_processor: VideoProcessor,
}

impl Reconciler {
    pub fn new(video_processor: VideoProcessor) -> Self {
        Self { video_processor }
    }

    /// Move every valid file of `source_dir` into `target_dir`
    pub async fn run(&self, source_dir: &Path, target_dir: &Path) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let source_dir = source_dir.canonicalize().unwrap_or_else(|_| source_dir.to_path_buf());
        let target_dir = target_dir.canonicalize().unwrap_or_else(|_| target_dir.to_path_buf());

        info!(
            "Moving all files from {} to {}",
            source_dir.display(),
            target_dir.display()
        );

        if !target_dir.exists() {
            info!("Creating target directory: {}", target_dir.display());
            if let Err(e) = fs::create_dir_all(&target_dir).await {
                error!("Error: {}", e);
                return report;
            }
        }

        let entries: Vec<PathBuf> = match WalkDir::new(&source_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(entries) => entries.into_iter().map(|e| e.into_path()).collect(),
            Err(e) => {
                error!("Error: {}", e);
                return report;
            }
        };

        for source_path in entries {
            let Some(file_name) = source_path.file_name() else {
                continue;
            };
            // Raw name for the move, lossy form only for logs and the report
            let dest_path = target_dir.join(file_name);
            let name = file_name.to_string_lossy().to_string();

            let action = match self.reconcile_entry(&source_path, &dest_path).await {
                Ok(action) => action,
                Err(e) => {
                    error!("Error while moving {}: {}", name, e);
                    ReconcileAction::Failed(e.to_string())
                }
            };

            match &action {
                ReconcileAction::Moved => info!("Moved: {}.", name),
                ReconcileAction::Replaced => info!("Replaced invalid MP4 file: {}", name),
                ReconcileAction::SkippedInvalidSource => {
                    info!("Skipping invalid source file: {}", name)
                }
                ReconcileAction::SkippedValidTarget => info!(
                    "Skipping {}: Valid MP4 already exists in target directory",
                    name
                ),
                ReconcileAction::SkippedDirectory => info!("Skipping directory: {}", name),
                ReconcileAction::Failed(_) => {}
            }

            report.entries.push((name, action));
        }

        info!("Operation completed successfully");
        report
    }

    async fn reconcile_entry(
        &self,
        source_path: &Path,
        dest_path: &Path,
    ) -> std::io::Result<ReconcileAction> {
        let metadata = fs::metadata(source_path).await?;
        if !metadata.is_file() {
            return Ok(ReconcileAction::SkippedDirectory);
        }

        if !self.video_processor.has_video_stream(source_path).await {
            return Ok(ReconcileAction::SkippedInvalidSource);
        }

        if fs::try_exists(dest_path).await? {
            if self.video_processor.has_video_stream(dest_path).await {
                return Ok(ReconcileAction::SkippedValidTarget);
            }
            debug!("Target {} failed validation, replacing", dest_path.display());
            fs::rename(source_path, dest_path).await?;
            return Ok(ReconcileAction::Replaced);
        }

        fs::rename(source_path, dest_path).await?;
        Ok(ReconcileAction::Moved)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::{write_script, FAKE_FFPROBE};
    use tempfile::TempDir;

    struct Layout {
        _root: TempDir,
        target: PathBuf,
        reserve: PathBuf,
        reconciler: Reconciler,
    }

    fn layout() -> Layout {
        let root = TempDir::new().unwrap();
        let target = root.path().join("work");
        let reserve = target.join("reserve");
        let tools = root.path().join("tools");
        std::fs::create_dir_all(&reserve).unwrap();
        std::fs::create_dir_all(&tools).unwrap();

        let config = Config {
            ffprobe_bin: write_script(&tools, "ffprobe", FAKE_FFPROBE),
            ..Default::default()
        };
        Layout {
            _root: root,
            target,
            reserve,
            reconciler: Reconciler::new(VideoProcessor::new(config)),
        }
    }

    #[tokio::test]
    async fn test_valid_file_without_target_is_moved() {
        let l = layout();
        std::fs::write(l.reserve.join("a.mp4"), "VIDEO 10").unwrap();

        let report = l.reconciler.run(&l.reserve, &l.target).await;

        assert_eq!(report.action_for("a.mp4"), Some(&ReconcileAction::Moved));
        assert_eq!(std::fs::read(l.target.join("a.mp4")).unwrap(), b"VIDEO 10");
        assert!(!l.reserve.join("a.mp4").exists());
    }

    #[tokio::test]
    async fn test_invalid_target_is_replaced() {
        let l = layout();
        std::fs::write(l.reserve.join("b.mp4"), "VIDEO 10 original").unwrap();
        std::fs::write(l.target.join("b.mp4"), "truncated").unwrap();

        let report = l.reconciler.run(&l.reserve, &l.target).await;

        assert_eq!(report.action_for("b.mp4"), Some(&ReconcileAction::Replaced));
        assert_eq!(
            std::fs::read(l.target.join("b.mp4")).unwrap(),
            b"VIDEO 10 original"
        );
        assert!(!l.reserve.join("b.mp4").exists());
    }

    #[tokio::test]
    async fn test_valid_target_is_left_alone() {
        let l = layout();
        std::fs::write(l.reserve.join("b.mp4"), "VIDEO 10 original").unwrap();
        std::fs::write(l.target.join("b.mp4"), "VIDEO 10 compressed").unwrap();

        let report = l.reconciler.run(&l.reserve, &l.target).await;

        assert_eq!(
            report.action_for("b.mp4"),
            Some(&ReconcileAction::SkippedValidTarget)
        );
        assert_eq!(
            std::fs::read(l.target.join("b.mp4")).unwrap(),
            b"VIDEO 10 compressed"
        );
        assert_eq!(
            std::fs::read(l.reserve.join("b.mp4")).unwrap(),
            b"VIDEO 10 original"
        );
    }

    #[tokio::test]
    async fn test_invalid_source_and_directories_are_skipped() {
        let l = layout();
        std::fs::write(l.reserve.join("broken.mp4"), "garbage").unwrap();
        std::fs::create_dir(l.reserve.join("nested")).unwrap();
        std::fs::write(l.reserve.join("nested").join("c.mp4"), "VIDEO 10").unwrap();

        let report = l.reconciler.run(&l.reserve, &l.target).await;

        assert_eq!(
            report.action_for("broken.mp4"),
            Some(&ReconcileAction::SkippedInvalidSource)
        );
        assert_eq!(
            report.action_for("nested"),
            Some(&ReconcileAction::SkippedDirectory)
        );
        assert!(l.reserve.join("broken.mp4").exists());
        assert!(l.reserve.join("nested").join("c.mp4").exists());
        assert!(!l.target.join("c.mp4").exists());
        assert_eq!(report.count(&ReconcileAction::Moved), 0);
    }

    #[tokio::test]
    async fn test_missing_prober_fails_closed() {
        let root = TempDir::new().unwrap();
        let reserve = root.path().join("reserve");
        std::fs::create_dir_all(&reserve).unwrap();
        std::fs::write(reserve.join("a.mp4"), "VIDEO 10").unwrap();

        let config = Config {
            ffprobe_bin: root.path().join("missing-ffprobe"),
            ..Default::default()
        };
        let reconciler = Reconciler::new(VideoProcessor::new(config));
        let report = reconciler.run(&reserve, root.path()).await;

        assert_eq!(
            report.action_for("a.mp4"),
            Some(&ReconcileAction::SkippedInvalidSource)
        );
        assert!(reserve.join("a.mp4").exists());
    }

    #[tokio::test]
    async fn test_non_utf8_name_is_moved_verbatim() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let l = layout();
        let latin1 = OsStr::from_bytes(b"caf\xe9.mp4");
        let other = OsStr::from_bytes(b"caf\xff.mp4");
        std::fs::write(l.reserve.join(latin1), "VIDEO 10 first").unwrap();
        std::fs::write(l.reserve.join(other), "VIDEO 10 second").unwrap();

        let report = l.reconciler.run(&l.reserve, &l.target).await;

        assert_eq!(report.count(&ReconcileAction::Moved), 2);
        assert_eq!(
            std::fs::read(l.target.join(latin1)).unwrap(),
            b"VIDEO 10 first"
        );
        assert_eq!(
            std::fs::read(l.target.join(other)).unwrap(),
            b"VIDEO 10 second"
        );
        assert!(!l.target.join("caf\u{FFFD}.mp4").exists());
    }

    #[tokio::test]
    async fn test_missing_source_directory_is_logged() {
        let l = layout();
        let report = l.reconciler.run(&l.target.join("absent"), &l.target).await;
        assert!(report.entries.is_empty());
    }

    #[tokio::test]
    async fn test_target_directory_is_created() {
        let l = layout();
        std::fs::write(l.reserve.join("a.mp4"), "VIDEO 10").unwrap();
        let fresh = l.target.join("fresh");

        let report = l.reconciler.run(&l.reserve, &fresh).await;

        assert_eq!(report.action_for("a.mp4"), Some(&ReconcileAction::Moved));
        assert!(fresh.join("a.mp4").exists());
    }
}
