//! Batch statistics aggregation
//!
//! All counters live in a single [`ProcessStats`] behind one mutex, so a
//! worker's update of `processed_files`, the success/failure split and the
//! byte totals is one critical section and can never be observed half-done.

use crate::batch::ConversionSizes;
use parking_lot::Mutex;

/// Aggregate counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub total_files: u64,
    pub processed_files: u64,
    pub successful_files: u64,
    pub failed_files: u64,
    pub total_original_bytes: u64,
    pub total_compressed_bytes: u64,
}

impl ProcessStats {
    pub fn new(total_files: u64) -> Self {
        Self {
            total_files,
            ..Default::default()
        }
    }

    /// Completion percentage (`processed / total × 100`)
    pub fn percent_complete(&self) -> f64 {
        if self.total_files == 0 {
            return 100.0;
        }
        self.processed_files as f64 / self.total_files as f64 * 100.0
    }

    /// Compressed bytes as a percentage of original bytes
    pub fn compression_ratio(&self) -> f64 {
        if self.total_original_bytes == 0 {
            return 0.0;
        }
        self.total_compressed_bytes as f64 / self.total_original_bytes as f64 * 100.0
    }

    /// Bytes saved, if the output is smaller than the input
    pub fn space_saved(&self) -> Option<u64> {
        self.total_original_bytes
            .checked_sub(self.total_compressed_bytes)
            .filter(|saved| *saved > 0)
    }

    /// Check the counter invariants
    pub fn is_consistent(&self) -> bool {
        self.processed_files == self.successful_files + self.failed_files
            && self.processed_files <= self.total_files
    }
}

/// Mutex-guarded statistics shared by all workers
#[derive(Debug)]
pub struct StatsAggregator {
    inner: Mutex<ProcessStats>,
}

impl StatsAggregator {
    pub fn new(total_files: u64) -> Self {
        Self {
            inner: Mutex::new(ProcessStats::new(total_files)),
        }
    }

    /// Record one finished job
    ///
    /// `sizes` is `Some` for a successful conversion. Returns the running
    /// completion percentage as seen inside the critical section.
    pub fn record_outcome(&self, sizes: Option<ConversionSizes>) -> f64 {
        let mut stats = self.inner.lock();
        stats.processed_files += 1;

        match sizes {
            Some(sizes) => {
                stats.successful_files += 1;
                stats.total_original_bytes += sizes.original;
                stats.total_compressed_bytes += sizes.compressed;
            }
            None => stats.failed_files += 1,
        }

        debug_assert!(stats.is_consistent());
        stats.percent_complete()
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> ProcessStats {
        self.inner.lock().clone()
    }

    /// Take the counters once no other owner remains
    pub fn into_inner(self) -> ProcessStats {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_record_outcome() {
        let stats = StatsAggregator::new(4);

        assert_eq!(stats.record_outcome(Some(ConversionSizes::new(1000, 400))), 25.0);
        assert_eq!(stats.record_outcome(None), 50.0);

        let snap = stats.snapshot();
        assert_eq!(snap.processed_files, 2);
        assert_eq!(snap.successful_files, 1);
        assert_eq!(snap.failed_files, 1);
        assert_eq!(snap.total_original_bytes, 1000);
        assert_eq!(snap.total_compressed_bytes, 400);
        assert!(snap.is_consistent());
    }

    #[test]
    fn test_ratio_and_savings() {
        let mut stats = ProcessStats::new(1);
        assert_eq!(stats.compression_ratio(), 0.0);
        assert_eq!(stats.space_saved(), None);

        stats.total_original_bytes = 2000;
        stats.total_compressed_bytes = 500;
        assert_eq!(stats.compression_ratio(), 25.0);
        assert_eq!(stats.space_saved(), Some(1500));

        stats.total_compressed_bytes = 2500;
        assert_eq!(stats.space_saved(), None);
    }

    #[test]
    fn test_concurrent_updates_not_lost() {
        let threads = 8;
        let per_thread = 1000;
        let stats = Arc::new(StatsAggregator::new((threads * per_thread) as u64));

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        if (t + i) % 2 == 0 {
                            stats.record_outcome(Some(ConversionSizes::new(3, 1)));
                        } else {
                            stats.record_outcome(None);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snap = Arc::try_unwrap(stats).unwrap().into_inner();
        assert_eq!(snap.processed_files, 8000);
        assert_eq!(snap.successful_files, 4000);
        assert_eq!(snap.failed_files, 4000);
        assert_eq!(snap.total_original_bytes, 12000);
        assert_eq!(snap.total_compressed_bytes, 4000);
        assert_eq!(snap.percent_complete(), 100.0);
    }
}
