//! Benchmarks for avifconv
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_queue_operations(c: &mut Criterion) {
    use avifconv::batch::{CancellationToken, Job, JobQueue};

    c.bench_function("queue_publish_consume", |b| {
        let queue = JobQueue::new(10000, CancellationToken::new());
        let (publisher, consumer) = queue.split();

        b.iter(|| {
            publisher.publish(Job::new("/test/path.png"));
            let received = consumer.try_consume();
            black_box(received);
        })
    });
}

fn benchmark_stats_recording(c: &mut Criterion) {
    use avifconv::batch::{ConversionSizes, StatsAggregator};

    c.bench_function("stats_record_outcome", |b| {
        let stats = StatsAggregator::new(u64::MAX);

        b.iter(|| {
            let percent = stats.record_outcome(Some(ConversionSizes::new(4096, 1024)));
            black_box(percent);
        })
    });
}

fn benchmark_batch_run(c: &mut Criterion) {
    use avifconv::batch::{BatchConfig, BatchCoordinator, ConversionSizes, Job, JobProcessor};
    use avifconv::error::ProcessResult;
    use std::sync::Arc;

    c.bench_function("batch_1000_noop_jobs", |b| {
        b.iter(|| {
            let processor: Arc<dyn JobProcessor> =
                Arc::new(|_: &Job| -> ProcessResult<ConversionSizes> { Ok(ConversionSizes::new(2, 1)) });
            let jobs: Vec<Job> = (0..1000).map(|i| Job::new(format!("/b/{}.png", i))).collect();
            let report = BatchCoordinator::new(BatchConfig::new(4), processor)
                .run(jobs)
                .unwrap();
            black_box(report);
        })
    });
}

criterion_group!(
    benches,
    benchmark_queue_operations,
    benchmark_stats_recording,
    benchmark_batch_run
);
criterion_main!(benches);
