//! avifconv - Parallel batch image converter
//!
//! Converts JPEG, PNG and WebP images to AVIF using a fixed pool of worker
//! threads. Each converted file replaces its source.
//!
//! # Features
//!
//! - **Bounded Work Queue**: A single producer feeds a crossbeam bounded
//!   channel; backpressure keeps memory flat on very large trees.
//!
//! - **Parallel Encoding**: N worker threads each run the per-file
//!   processor. A failing or panicking file is counted and the batch
//!   carries on.
//!
//! - **Cooperative Cancellation**: Ctrl-C fires a cancellation token that
//!   wakes every blocked queue operation; in-flight files finish.
//!
//! - **Live Progress**: A mutex-guarded progress reporter drives an
//!   indicatif bar on a terminal or a plain line elsewhere.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     collect_images (walkdir)                    │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ Vec<Job>
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       BatchCoordinator                          │
//! │            ┌──────────────────────────┐                         │
//! │            │     Job Queue            │                         │
//! │            │  (crossbeam bounded)     │                         │
//! │            └────────────┬─────────────┘                         │
//! │       ┌─────────────────┼──────────────────────┐                │
//! │  ┌────▼────┐  ┌─────────▼┐  ┌─────────┐   ┌────▼────┐           │
//! │  │Worker 1 │  │Worker 2  │  │Worker 3 │...│Worker N │           │
//! │  │  AVIF   │  │  AVIF    │  │  AVIF   │   │  AVIF   │           │
//! │  └────┬────┘  └────┬─────┘  └────┬────┘   └────┬────┘           │
//! │       └────────────┼─────────────┼─────────────┘                │
//! │                    ▼             ▼                              │
//! │        ┌─────────────────┐ ┌──────────────────┐                 │
//! │        │ StatsAggregator │ │ ProgressReporter │                 │
//! │        └─────────────────┘ └──────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Convert a directory tree with 8 workers
//! avifconv ./photos -w 8
//!
//! # Smaller files, slower encode
//! avifconv ./photos --quality 60 --speed 2
//!
//! # Single file
//! avifconv holiday.jpg
//! ```

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod progress;

pub use batch::{
    BatchConfig, BatchCoordinator, BatchEvent, BatchReport, CancellationToken, ConversionSizes,
    EventSink, Job, JobProcessor, ProcessStats,
};
pub use config::{CliArgs, ConvertConfig};
pub use convert::{collect_images, AvifConverter, EncodingOptions};
pub use error::{ConvertError, ProcessError, Result};
