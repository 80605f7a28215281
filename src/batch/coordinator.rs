//! Batch coordinator - orchestrates a parallel conversion run
//!
//! The coordinator is responsible for:
//! - Sizing the job queue and spawning workers
//! - Running the producer that feeds the queue
//! - Waiting for every worker to drain the queue
//! - Finishing the progress display and returning final statistics
//!
//! The cancellation token is always fired when `run` returns, on every path.

use crate::batch::cancel::CancellationToken;
use crate::batch::queue::JobQueue;
use crate::batch::source::JobSource;
use crate::batch::stats::{ProcessStats, StatsAggregator};
use crate::batch::status::StatusBoard;
use crate::batch::worker::{Worker, WorkerContext};
use crate::batch::{BatchEvent, EventSink, Job, JobProcessor, TracingSink};
use crate::error::{Result, WorkerError};
use crate::progress::{HiddenDisplay, ProgressDisplay, ProgressReporter};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default queue slots per worker
pub const QUEUE_RATIO: usize = 3;

/// Label shown in front of the progress bar
const PROGRESS_LABEL: &str = "Converting images";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of worker threads
    pub worker_count: usize,

    /// Queue capacity override; defaults to `worker_count × QUEUE_RATIO`
    pub queue_size: Option<usize>,
}

impl BatchConfig {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            queue_size: None,
        }
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = Some(queue_size);
        self
    }

    /// Configured queue size before capping at the job count
    pub fn configured_queue_size(&self) -> usize {
        self.queue_size
            .unwrap_or(self.worker_count * QUEUE_RATIO)
    }
}

/// Result of a completed batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Final counters
    pub stats: ProcessStats,

    /// Time taken for the batch
    pub duration: Duration,

    /// Whether cancellation left jobs unprocessed
    pub cancelled: bool,
}

/// Coordinates one parallel batch run
pub struct BatchCoordinator {
    config: BatchConfig,
    processor: Arc<dyn JobProcessor>,
    events: Arc<dyn EventSink>,
    display: Box<dyn ProgressDisplay>,
    status: StatusBoard,
    cancel: CancellationToken,
}

impl BatchCoordinator {
    /// Create a coordinator with a tracing event sink and no progress output
    pub fn new(config: BatchConfig, processor: Arc<dyn JobProcessor>) -> Self {
        let status = StatusBoard::new(config.worker_count);

        Self {
            config,
            processor,
            events: Arc::new(TracingSink),
            display: Box::new(HiddenDisplay),
            status,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the event sink
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replace the progress display
    pub fn with_display(mut self, display: Box<dyn ProgressDisplay>) -> Self {
        self.display = display;
        self
    }

    /// Get a clone of the cancellation token (for signal handlers)
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the per-worker status board (for diagnostics)
    pub fn status_board(&self) -> StatusBoard {
        self.status.clone()
    }

    /// Process every job and block until all have been attempted
    pub fn run(self, jobs: Vec<Job>) -> Result<BatchReport> {
        let _cancel_on_exit = self.cancel.guard();
        let start = Instant::now();
        let total = jobs.len();

        if total == 0 {
            warn!("No files found to process");
            return Ok(BatchReport {
                stats: ProcessStats::default(),
                duration: start.elapsed(),
                cancelled: false,
            });
        }

        let capacity = JobQueue::capacity_for(self.config.configured_queue_size(), total);
        let queue = JobQueue::new(capacity, self.cancel.clone());
        let queue_stats = queue.stats();
        let (publisher, consumer) = queue.split();

        let stats = Arc::new(StatsAggregator::new(total as u64));
        let progress = Arc::new(ProgressReporter::new(
            total as u64,
            PROGRESS_LABEL,
            self.display,
        ));

        self.events.on_event(BatchEvent::Started {
            total,
            workers: self.config.worker_count,
        });
        debug!(capacity = capacity, "Job queue sized");

        let ctx = WorkerContext {
            processor: Arc::clone(&self.processor),
            stats: Arc::clone(&stats),
            progress: Arc::clone(&progress),
            events: Arc::clone(&self.events),
            status: self.status.clone(),
            cancel: self.cancel.clone(),
        };

        // Spawn workers; on failure the guard cancels the ones already running
        let mut workers = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            match Worker::spawn(id, consumer.clone(), ctx.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    self.cancel.cancel();
                    join_workers(workers);
                    return Err(e.into());
                }
            }
        }
        drop(consumer);
        debug!(count = workers.len(), "Workers spawned");

        let source = JobSource::new(jobs);
        let producer = match thread::Builder::new()
            .name("convert-producer".into())
            .spawn(move || source.publish_all(publisher))
        {
            Ok(handle) => handle,
            Err(e) => {
                self.cancel.cancel();
                join_workers(workers);
                return Err(WorkerError::ProducerFailed {
                    reason: e.to_string(),
                }
                .into());
            }
        };

        // Barrier: workers may still be draining after the producer is done
        join_workers(workers);

        let published = producer.join().unwrap_or_else(|_| {
            warn!("Producer thread panicked");
            0
        });

        // A stop signal that arrives after the last job does not count
        let stats = stats.snapshot();
        let cancelled =
            self.cancel.is_cancelled() && stats.processed_files < stats.total_files;
        if cancelled {
            progress.abandon();
        } else {
            progress.complete();
        }

        debug!(
            published = published,
            dequeued = queue_stats.dequeued(),
            "Queue drained"
        );
        self.events.on_event(BatchEvent::Finished {
            stats: stats.clone(),
        });

        Ok(BatchReport {
            stats,
            duration: start.elapsed(),
            cancelled,
        })
    }
}

/// Join all worker threads
fn join_workers(workers: Vec<Worker>) {
    for worker in workers {
        let id = worker.id();
        let handled = worker.handled();
        match worker.join() {
            Ok(()) => debug!(worker = id, handled = handled, "Worker joined"),
            Err(e) => warn!(error = %e, "Worker failed to join cleanly"),
        }
    }
}
