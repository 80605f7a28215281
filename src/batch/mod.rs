//! Parallel batch-processing engine
//!
//! A fixed pool of worker threads pulls jobs from a bounded queue fed by a
//! single producer. Outcomes are folded into a mutex-guarded statistics
//! aggregate and a progress reporter.
//!
//! # Architecture
//!
//! ```text
//!                   ┌──────────────────────┐
//!                   │      JobSource       │
//!                   │  (producer thread)   │
//!                   └──────────┬───────────┘
//!                              │ publish (blocks when full)
//!                              ▼
//!                   ┌──────────────────────┐
//!                   │      JobQueue        │◄──── CancellationToken
//!                   │ (crossbeam bounded)  │      (wakes blocked ops)
//!                   └──────────┬───────────┘
//!                              │ consume
//!       ┌──────────────────────┼──────────────────────┐
//!       │                      │                      │
//! ┌─────▼─────┐          ┌─────▼─────┐          ┌─────▼─────┐
//! │ Worker 1  │          │ Worker 2  │   ...    │ Worker N  │
//! │ process() │          │ process() │          │ process() │
//! └─────┬─────┘          └─────┬─────┘          └─────┬─────┘
//!       └──────────────────────┼──────────────────────┘
//!                              ▼
//!            ┌──────────────────────────────────┐
//!            │ StatsAggregator + ProgressReporter│
//!            └──────────────────────────────────┘
//! ```

pub mod cancel;
pub mod coordinator;
pub mod queue;
pub mod source;
pub mod stats;
pub mod status;
pub mod worker;

pub use cancel::{CancelGuard, CancellationToken};
pub use coordinator::{BatchConfig, BatchCoordinator, BatchReport, QUEUE_RATIO};
pub use queue::{JobConsumer, JobPublisher, JobQueue, Publish};
pub use source::JobSource;
pub use stats::{ProcessStats, StatsAggregator};
pub use status::{StatusBoard, WorkerStatus};
pub use worker::Worker;

use crate::error::ProcessResult;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single unit of work: one file to convert
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    path: PathBuf,
}

impl Job {
    /// Create a job for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Full path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name only, for diagnostics
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<PathBuf> for Job {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Byte sizes before and after a successful conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionSizes {
    pub original: u64,
    pub compressed: u64,
}

impl ConversionSizes {
    pub fn new(original: u64, compressed: u64) -> Self {
        Self {
            original,
            compressed,
        }
    }

    /// Compressed size as a percentage of the original
    pub fn ratio_percent(&self) -> f64 {
        if self.original == 0 {
            return 0.0;
        }
        self.compressed as f64 / self.original as f64 * 100.0
    }
}

/// Processes one job; may block on I/O and codec work
///
/// Implemented for any `Fn(&Job) -> ProcessResult<ConversionSizes>` closure.
pub trait JobProcessor: Send + Sync {
    fn process(&self, job: &Job) -> ProcessResult<ConversionSizes>;
}

impl<F> JobProcessor for F
where
    F: Fn(&Job) -> ProcessResult<ConversionSizes> + Send + Sync,
{
    fn process(&self, job: &Job) -> ProcessResult<ConversionSizes> {
        self(job)
    }
}

/// Events emitted by the engine for the reporting layer
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Batch is about to start
    Started { total: usize, workers: usize },

    /// A job converted successfully
    JobConverted {
        worker: usize,
        job: Job,
        sizes: ConversionSizes,
    },

    /// A job failed; `percent` is the running completion percentage
    JobFailed {
        worker: usize,
        job: Job,
        detail: String,
        percent: f64,
    },

    /// All workers have finished
    Finished { stats: ProcessStats },
}

/// Port receiving engine events
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: BatchEvent);
}

/// Default sink: structured log lines through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: BatchEvent) {
        match event {
            BatchEvent::Started { total, workers } => {
                tracing::info!(files = total, workers = workers, "Starting batch processing");
            }
            BatchEvent::JobConverted { worker, job, sizes } => {
                tracing::debug!(
                    worker = worker,
                    file = %job,
                    original = sizes.original,
                    compressed = sizes.compressed,
                    "File converted"
                );
            }
            BatchEvent::JobFailed {
                worker,
                job,
                detail,
                percent,
            } => {
                tracing::error!(
                    "Worker {}: Error processing {}: {} ({:.1}% complete)",
                    worker,
                    job.display_name(),
                    detail,
                    percent
                );
            }
            BatchEvent::Finished { stats } => {
                tracing::info!(
                    processed = stats.processed_files,
                    successful = stats.successful_files,
                    failed = stats.failed_files,
                    "Batch completed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_display_name() {
        let job = Job::new("/photos/2024/beach.jpg");
        assert_eq!(job.display_name(), "beach.jpg");
        assert_eq!(job.to_string(), "/photos/2024/beach.jpg");
    }

    #[test]
    fn test_ratio_percent() {
        assert_eq!(ConversionSizes::new(1000, 400).ratio_percent(), 40.0);
        assert_eq!(ConversionSizes::new(0, 0).ratio_percent(), 0.0);
    }

    #[test]
    fn test_closure_processor() {
        let processor = |job: &Job| {
            if job.display_name().ends_with(".png") {
                Ok(ConversionSizes::new(10, 5))
            } else {
                Err(crate::error::ProcessError::other("unsupported"))
            }
        };

        assert!(processor.process(&Job::new("a.png")).is_ok());
        assert!(processor.process(&Job::new("a.gif")).is_err());
    }
}
