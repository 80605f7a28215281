//! Per-worker status for diagnostics
//!
//! Each worker owns one slot on the [`StatusBoard`] and is its only writer.
//! Readers (a debugger, a watchdog, tests) take snapshots.

use crate::batch::Job;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a single worker is doing right now
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub busy: bool,
    pub current_job: Option<Job>,
    pub started_at: Option<Instant>,
}

impl WorkerStatus {
    /// Time spent on the current job
    pub fn busy_for(&self) -> Option<Duration> {
        self.started_at.map(|start| start.elapsed())
    }
}

/// Status slots for every worker in a pool
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    slots: Arc<Vec<RwLock<WorkerStatus>>>,
}

impl StatusBoard {
    pub fn new(workers: usize) -> Self {
        Self {
            slots: Arc::new((0..workers).map(|_| RwLock::default()).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Mark worker `id` busy with `job`
    pub(crate) fn begin(&self, id: usize, job: &Job) {
        if let Some(slot) = self.slots.get(id) {
            let mut status = slot.write();
            status.busy = true;
            status.current_job = Some(job.clone());
            status.started_at = Some(Instant::now());
        }
    }

    /// Mark worker `id` idle
    pub(crate) fn end(&self, id: usize) {
        if let Some(slot) = self.slots.get(id) {
            *slot.write() = WorkerStatus::default();
        }
    }

    /// Snapshot of one worker
    pub fn get(&self, id: usize) -> Option<WorkerStatus> {
        self.slots.get(id).map(|slot| slot.read().clone())
    }

    /// Snapshot of every worker
    pub fn snapshot(&self) -> Vec<WorkerStatus> {
        self.slots.iter().map(|slot| slot.read().clone()).collect()
    }

    /// Number of workers currently processing a job
    pub fn busy_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.read().busy).count()
    }
}
