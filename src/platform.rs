//! # Platform-specific utilities
//!
//! Questo modulo centralizza la risoluzione cross-platform dei comandi
//! esterni (ffmpeg, ffprobe) e la verifica della loro disponibilità.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        let which_command = if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("ffprobe", "ffprobe.exe");
            "where"
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("ffprobe", "ffprobe");
            "which"
        };

        Self {
            commands,
            which_command,
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Check if a program is available.
    ///
    /// Paths with a directory part are checked on disk, bare names through `which`/`where`.
    pub async fn is_command_available(&self, program: &Path) -> bool {
        if program.components().count() > 1 {
            debug!("Checking tool path on disk: {}", program.display());
            return program.is_file();
        }

        let result = tokio::process::Command::new(self.which_command)
            .arg(program)
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

/// Working directory used when none is given: the parent of the
/// directory holding the executable (tools live in `<videos>/bin/`).
pub fn default_working_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} has no grandparent directory", exe.display()),
            )
        })
}
