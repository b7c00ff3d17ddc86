//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il riepilogo di una run e la progress bar.
//!
//! ## Responsabilità:
//! - `RunSummary`: contatori {succeeded, failed, still_oversized} della run corrente
//! - Formattazione delle righe di avanzamento e del riepilogo finale
//! - Progress bar visuale con `indicatif` per feedback real-time
//!
//! ## Righe stampate:
//! ```text
//! Compressing... 2/5 Completed.
//! ```
//! oppure, quando tutti i file hanno un esito:
//! ```text
//! Completed
//! 3 videos compressed successfully
//! 1 videos failed
//! 1 videos still exceeds target size
//! ```
//!
//! Nessuna persistenza: il riepilogo vive solo per la durata del processo.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal result of one file's pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Output is at or under the size threshold
    Compressed { output_size: u64 },
    /// Encode finished but the output is still above the threshold
    StillOversized { output_size: u64 },
    /// Backup, probe or encode failed
    Failed { error: String },
}

impl FileOutcome {
    /// Short label used in JSON output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Compressed { .. } => "compressed",
            Self::StillOversized { .. } => "still_oversized",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn output_size(&self) -> Option<u64> {
        match self {
            Self::Compressed { output_size } | Self::StillOversized { output_size } => {
                Some(*output_size)
            }
            Self::Failed { .. } => None,
        }
    }
}

/// Counters for the current run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub still_oversized: usize,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Compressed { .. } => self.succeeded += 1,
            FileOutcome::StillOversized { .. } => self.still_oversized += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn completed(&self) -> usize {
        self.succeeded + self.failed + self.still_oversized
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.total
    }

    /// Running "N/total" line
    pub fn format_progress(&self) -> String {
        format!("Compressing... {}/{} Completed.", self.completed(), self.total)
    }

    /// Final summary lines
    pub fn format_final(&self) -> Vec<String> {
        vec![
            "Completed".to_string(),
            format!("{} videos compressed successfully", self.succeeded),
            format!("{} videos failed", self.failed),
            format!("{} videos still exceeds target size", self.still_oversized),
        ]
    }

    /// Lines to print after an outcome: final form once every file has one
    pub fn report_lines(&self) -> Vec<String> {
        if self.is_complete() {
            self.format_final()
        } else {
            vec![self.format_progress()]
        }
    }
}

/// Manages progress reporting for batch compression
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that draws nothing (JSON mode)
    pub fn hidden(total_files: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_files);
        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Set a custom message without incrementing
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Print a line above the bar
    pub fn println(&self, line: &str) {
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> FileOutcome {
        FileOutcome::Failed {
            error: "boom".to_string(),
        }
    }

    #[test]
    fn test_record_outcomes() {
        let mut summary = RunSummary::new(3);
        summary.record(&FileOutcome::Compressed { output_size: 10 });
        summary.record(&FileOutcome::StillOversized { output_size: 20 });
        summary.record(&failed());

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.still_oversized, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_progress_form_until_complete() {
        let mut summary = RunSummary::new(2);
        assert_eq!(summary.report_lines(), vec!["Compressing... 0/2 Completed."]);

        summary.record(&failed());
        assert_eq!(summary.report_lines(), vec!["Compressing... 1/2 Completed."]);

        summary.record(&FileOutcome::Compressed { output_size: 1 });
        assert_eq!(
            summary.report_lines(),
            vec![
                "Completed",
                "1 videos compressed successfully",
                "1 videos failed",
                "0 videos still exceeds target size",
            ]
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(FileOutcome::Compressed { output_size: 1 }.label(), "compressed");
        assert_eq!(FileOutcome::StillOversized { output_size: 1 }.output_size(), Some(1));
        assert_eq!(failed().label(), "failed");
        assert_eq!(failed().output_size(), None);
    }

    #[test]
    fn test_hidden_manager_tracks_position() {
        let progress = ProgressManager::hidden(2);
        progress.update("a.mp4");
        progress.set_message("b.mp4: 50%");
        progress.finish("done");
    }
}
