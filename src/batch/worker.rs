//! Worker thread logic for parallel conversion
//!
//! Each worker:
//! - Pulls jobs from the bounded queue
//! - Runs the per-item processor on its own thread
//! - Folds the outcome into the shared statistics
//! - Advances the progress reporter by one unit

use crate::batch::cancel::CancellationToken;
use crate::batch::queue::JobConsumer;
use crate::batch::stats::StatsAggregator;
use crate::batch::status::StatusBoard;
use crate::batch::{BatchEvent, EventSink, Job, JobProcessor};
use crate::error::{JobOutcome, ProcessError, WorkerError};
use crate::progress::ProgressReporter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// Shared handles every worker needs
#[derive(Clone)]
pub struct WorkerContext {
    pub processor: Arc<dyn JobProcessor>,
    pub stats: Arc<StatsAggregator>,
    pub progress: Arc<ProgressReporter>,
    pub events: Arc<dyn EventSink>,
    pub status: StatusBoard,
    pub cancel: CancellationToken,
}

/// A worker thread that processes jobs
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Jobs handled by this worker
    handled: Arc<AtomicU64>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(id: usize, queue: JobConsumer, ctx: WorkerContext) -> Result<Self, WorkerError> {
        let handled = Arc::new(AtomicU64::new(0));
        let handled_clone = Arc::clone(&handled);

        let handle = thread::Builder::new()
            .name(format!("convert-{}", id))
            .spawn(move || worker_loop(id, queue, ctx, handled_clone))
            .map_err(|e| WorkerError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            handled,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of jobs this worker has finished
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|payload| WorkerError::Panicked {
                id: self.id,
                message: panic_message(payload.as_ref()),
            }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(id: usize, queue: JobConsumer, ctx: WorkerContext, handled: Arc<AtomicU64>) {
    debug!(worker = id, "Worker starting");

    while let Some(job) = queue.consume() {
        if ctx.cancel.is_cancelled() {
            debug!(worker = id, file = %job, "Cancelled before processing");
            break;
        }

        ctx.status.begin(id, &job);
        let outcome = run_job(ctx.processor.as_ref(), job);
        ctx.status.end(id);

        let percent = ctx.stats.record_outcome(outcome.sizes());
        report(id, outcome, percent, ctx.events.as_ref());

        ctx.progress.increment(1);
        handled.fetch_add(1, Ordering::Relaxed);
    }

    debug!(
        worker = id,
        handled = handled.load(Ordering::Relaxed),
        "Worker shutting down"
    );
}

/// Run the processor on one job, turning a panic into a failure
fn run_job(processor: &dyn JobProcessor, job: Job) -> JobOutcome {
    trace!(file = %job, "Processing");

    let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(&job)))
        .unwrap_or_else(|payload| Err(ProcessError::Panicked(panic_message(payload.as_ref()))));

    match result {
        Ok(sizes) => JobOutcome::Converted { job, sizes },
        Err(error) => JobOutcome::Failed { job, error },
    }
}

fn report(id: usize, outcome: JobOutcome, percent: f64, events: &dyn EventSink) {
    // Users count workers from 1
    let worker = id + 1;

    let event = match outcome {
        JobOutcome::Converted { job, sizes } => BatchEvent::JobConverted { worker, job, sizes },
        JobOutcome::Failed { job, error } => BatchEvent::JobFailed {
            worker,
            job,
            detail: error.to_string(),
            percent,
        },
    };

    events.on_event(event);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Worker thread panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::queue::JobQueue;
    use crate::batch::{ConversionSizes, TracingSink};
    use crate::error::ProcessResult;

    fn context(processor: Arc<dyn JobProcessor>, total: u64, workers: usize) -> WorkerContext {
        WorkerContext {
            processor,
            stats: Arc::new(StatsAggregator::new(total)),
            progress: Arc::new(ProgressReporter::hidden(total)),
            events: Arc::new(TracingSink),
            status: StatusBoard::new(workers),
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn test_worker_drains_queue() {
        let processor: Arc<dyn JobProcessor> = Arc::new(|_: &Job| -> ProcessResult<ConversionSizes> {
            Ok(ConversionSizes::new(10, 4))
        });
        let ctx = context(processor, 3, 1);
        let queue = JobQueue::new(3, ctx.cancel.clone());
        let (publisher, consumer) = queue.split();

        for n in 0..3 {
            publisher.publish(Job::new(format!("/{}.png", n)));
        }
        publisher.close();

        let worker = Worker::spawn(0, consumer, ctx.clone()).unwrap();
        worker.join().unwrap();

        let stats = ctx.stats.snapshot();
        assert_eq!(stats.successful_files, 3);
        assert_eq!(stats.total_original_bytes, 30);
        assert_eq!(ctx.progress.state().current, 3);
        assert_eq!(ctx.status.busy_count(), 0);
    }

    #[test]
    fn test_panicking_processor_counts_as_failure() {
        let processor: Arc<dyn JobProcessor> = Arc::new(|job: &Job| -> ProcessResult<ConversionSizes> {
            if job.display_name() == "bad.png" {
                panic!("codec exploded");
            }
            Ok(ConversionSizes::new(1, 1))
        });
        let ctx = context(processor, 2, 1);
        let queue = JobQueue::new(2, ctx.cancel.clone());
        let (publisher, consumer) = queue.split();

        publisher.publish(Job::new("/bad.png"));
        publisher.publish(Job::new("/good.png"));
        publisher.close();

        let worker = Worker::spawn(0, consumer, ctx.clone()).unwrap();
        assert_eq!(worker.id(), 0);
        worker.join().unwrap();

        let stats = ctx.stats.snapshot();
        assert_eq!(stats.processed_files, 2);
        assert_eq!(stats.failed_files, 1);
        assert_eq!(stats.successful_files, 1);
    }

    #[test]
    fn test_run_job_outcomes() {
        let ok = |_: &Job| -> ProcessResult<ConversionSizes> { Ok(ConversionSizes::new(5, 2)) };
        let outcome = run_job(&ok, Job::new("/a.png"));
        assert!(outcome.is_success());

        let failing =
            |_: &Job| -> ProcessResult<ConversionSizes> { Err(ProcessError::other("decode error")) };
        match run_job(&failing, Job::new("/b.png")) {
            JobOutcome::Failed { error, .. } => assert_eq!(error.to_string(), "decode error"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
