//! Bounded job queue with backpressure and cancellation
//!
//! One producer publishes into a crossbeam bounded channel; N workers
//! consume from it. A full queue blocks the producer, an empty queue blocks
//! the workers, and both wake up immediately when the cancellation token
//! fires.

use crate::batch::cancel::CancellationToken;
use crate::batch::Job;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the job queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total jobs enqueued
    pub enqueued: AtomicU64,

    /// Total jobs dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}

/// Result of publishing a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// Job is in the queue
    Sent,

    /// Cancellation fired; the job was not enqueued
    Cancelled,

    /// Every consumer is gone
    Disconnected,
}

/// Bounded job queue, split into a publisher and consumers
pub struct JobQueue {
    publisher: JobPublisher,
    consumer: JobConsumer,
    capacity: usize,
    stats: Arc<QueueStats>,
}

impl JobQueue {
    /// Create a queue with the given capacity (at least 1)
    pub fn new(capacity: usize, cancel: CancellationToken) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        let stats = Arc::new(QueueStats::default());

        Self {
            publisher: JobPublisher {
                sender,
                cancel: cancel.clone(),
                stats: Arc::clone(&stats),
            },
            consumer: JobConsumer {
                receiver,
                cancel,
                stats: Arc::clone(&stats),
            },
            capacity,
            stats,
        }
    }

    /// Capacity for a batch: the configured size, capped at the job count
    pub fn capacity_for(configured: usize, total_jobs: usize) -> usize {
        configured.min(total_jobs).max(1)
    }

    /// Get queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Split into the single publisher and a cloneable consumer
    pub fn split(self) -> (JobPublisher, JobConsumer) {
        (self.publisher, self.consumer)
    }
}

/// Producer side of the queue
///
/// Not `Clone`: dropping (or [`close`](Self::close)-ing) the one publisher
/// is what tells consumers that no more jobs will arrive.
pub struct JobPublisher {
    sender: Sender<Job>,
    cancel: CancellationToken,
    stats: Arc<QueueStats>,
}

impl JobPublisher {
    /// Publish a job, blocking while the queue is full
    pub fn publish(&self, job: Job) -> Publish {
        if self.cancel.is_cancelled() {
            return Publish::Cancelled;
        }

        select! {
            send(self.sender, job) -> res => match res {
                Ok(()) => {
                    self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                    Publish::Sent
                }
                Err(_) => Publish::Disconnected,
            },
            recv(self.cancel.wait_channel()) -> _ => Publish::Cancelled,
        }
    }

    /// Close the input side
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer side of the queue (clone for each worker)
#[derive(Clone)]
pub struct JobConsumer {
    receiver: Receiver<Job>,
    cancel: CancellationToken,
    stats: Arc<QueueStats>,
}

impl JobConsumer {
    /// Receive a job, blocking while the queue is empty
    ///
    /// Returns `None` once the publisher is closed and the queue is
    /// drained, or once cancellation fires.
    pub fn consume(&self) -> Option<Job> {
        if self.cancel.is_cancelled() {
            return None;
        }

        select! {
            recv(self.receiver) -> msg => match msg {
                Ok(job) => {
                    self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                    Some(job)
                }
                Err(_) => None,
            },
            recv(self.cancel.wait_channel()) -> _ => None,
        }
    }

    /// Try to receive a job without blocking
    pub fn try_consume(&self) -> Option<Job> {
        match self.receiver.try_recv() {
            Ok(job) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(job)
            }
            Err(_) => None,
        }
    }

    /// Current number of queued jobs
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
