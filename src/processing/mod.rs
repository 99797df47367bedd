//! The per-source processing loop and its output seams.
//!
//! One processing thread pulls frames from the shared capture buffer,
//! drives the [`Magnificator`], and publishes results through lossy
//! single-slot channels. Reconfiguration happens through a shared
//! control handle; a depth or ROI change drains the queues and resets
//! all algorithm state.
//!
//! [`Magnificator`]: crate::magnify::Magnificator

mod publisher;
mod recorder;
mod sink;
mod thread;

pub use publisher::{Publisher, Slot};
pub use recorder::{combine_frames, NullRecorder, VideoRecorder};
pub use sink::{BreathSink, CsvLogger, FileSink, NoopSink, RecordingSink};
pub use thread::{ProcessingControl, ProcessingThread, RecordRequest};

/// Rolling statistics published by the processing thread.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    /// Average processing rate over the last statistics window.
    pub average_fps: f32,
    /// Total frames processed since the thread started.
    pub frames_processed: u64,
}
