//! # Optimizer Module
//!
//! Modulo per la compressione in batch di una directory di video.

pub mod batch;
pub mod progress_tracker;
pub mod task;

pub use batch::BatchCompressor;
pub use progress_tracker::{ProgressEvent, ProgressTracker};
pub use task::CompressionTask;
