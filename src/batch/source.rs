//! Job source: feeds a pre-computed job list into the queue

use crate::batch::queue::{JobPublisher, Publish};
use crate::batch::Job;
use tracing::debug;

/// Ordered, finite list of jobs to publish
#[derive(Debug, Clone, Default)]
pub struct JobSource {
    jobs: Vec<Job>,
}

impl JobSource {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    /// Publish every job in order, then close the queue
    ///
    /// Stops early on cancellation. Consumes the publisher so the queue's
    /// input side is closed exactly once on every path. Returns the number
    /// of jobs actually enqueued.
    pub fn publish_all(self, publisher: JobPublisher) -> usize {
        let mut published = 0;

        for job in self.jobs {
            match publisher.publish(job) {
                Publish::Sent => published += 1,
                Publish::Cancelled => {
                    debug!(published = published, "Job source cancelled");
                    break;
                }
                Publish::Disconnected => {
                    debug!(published = published, "All consumers gone");
                    break;
                }
            }
        }

        publisher.close();
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::cancel::CancellationToken;
    use crate::batch::queue::JobQueue;

    fn jobs(n: usize) -> Vec<Job> {
        (0..n).map(|i| Job::new(format!("/src/{}.jpg", i))).collect()
    }

    #[test]
    fn test_publish_all_in_order_and_close() {
        let queue = JobQueue::new(8, CancellationToken::new());
        let (publisher, consumer) = queue.split();

        let published = JobSource::new(jobs(5)).publish_all(publisher);
        assert_eq!(published, 5);

        let drained: Vec<Job> = std::iter::from_fn(|| consumer.consume()).collect();
        assert_eq!(drained, jobs(5));
    }

    #[test]
    fn test_cancelled_source_publishes_nothing() {
        let cancel = CancellationToken::new();
        let queue = JobQueue::new(8, cancel.clone());
        let (publisher, consumer) = queue.split();

        cancel.cancel();
        let published = JobSource::new(jobs(5)).publish_all(publisher);

        assert_eq!(published, 0);
        assert!(consumer.try_consume().is_none());
    }

    #[test]
    fn test_disconnected_consumers_stop_source() {
        let queue = JobQueue::new(2, CancellationToken::new());
        let (publisher, consumer) = queue.split();
        drop(consumer);

        assert_eq!(JobSource::new(jobs(5)).publish_all(publisher), 0);
    }
}
