//! Error types for avifconv
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI errors
//! - Worker thread errors
//! - Per-file conversion failures
//!
//! Per-file failures ([`ProcessError`]) never abort a batch. They are
//! counted by the statistics aggregator and reported as events. Only
//! errors that prevent a batch from starting surface as [`ConvertError`].

use crate::batch::{ConversionSizes, Job};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the avifconv application
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Directory scan failed
    #[error("Failed to scan '{path}': {reason}")]
    Scan { path: PathBuf, reason: String },

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No input path on the command line
    #[error("No input path specified")]
    MissingInput,

    /// Input path does not exist or cannot be read
    #[error("Invalid input path '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Quality outside 0-100
    #[error("Invalid quality {value}: must be in range 0-100")]
    InvalidQuality { value: u8 },

    /// Alpha quality outside 0-100
    #[error("Invalid alpha quality {value}: must be in range 0-100")]
    InvalidAlphaQuality { value: u8 },

    /// Speed outside 0-10
    #[error("Invalid encoding speed {value}: must be in range 0-10")]
    InvalidSpeed { value: u8 },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked outside of job processing
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Worker thread could not be spawned
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },

    /// Producer thread could not be spawned
    #[error("Failed to start job producer: {reason}")]
    ProducerFailed { reason: String },
}

/// Failure converting a single file
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to get file info: {0}")]
    Stat(#[source] std::io::Error),

    #[error("error opening file: {0}")]
    Open(#[source] std::io::Error),

    #[error("error decoding image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("error creating temporary file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("error encoding to AVIF: {0}")]
    Encode(#[source] ravif::Error),

    #[error("error writing AVIF data: {0}")]
    Write(#[source] std::io::Error),

    /// Another file already claimed the output name
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("error deleting original file: {0}")]
    RemoveOriginal(#[source] std::io::Error),

    #[error("error renaming file: {0}")]
    Rename(#[source] std::io::Error),

    /// The processor panicked while handling the job
    #[error("processing panicked: {0}")]
    Panicked(String),

    /// Failure reported by a custom processor
    #[error("{0}")]
    Other(String),
}

impl ProcessError {
    /// Build a failure from a free-form message
    pub fn other(message: impl Into<String>) -> Self {
        ProcessError::Other(message.into())
    }
}

/// Result type alias for ConvertError
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Result type alias for per-file processing
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Represents the outcome of processing a single job
#[derive(Debug)]
pub enum JobOutcome {
    /// File converted
    Converted { job: Job, sizes: ConversionSizes },

    /// Conversion failed; the batch carries on
    Failed { job: Job, error: ProcessError },
}

impl JobOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Converted { .. })
    }

    /// Returns the job associated with this outcome
    pub fn job(&self) -> &Job {
        match self {
            JobOutcome::Converted { job, .. } => job,
            JobOutcome::Failed { job, .. } => job,
        }
    }

    /// Byte sizes for a successful conversion
    pub fn sizes(&self) -> Option<ConversionSizes> {
        match self {
            JobOutcome::Converted { sizes, .. } => Some(*sizes),
            JobOutcome::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::InvalidQuality { value: 120 };
        let top: ConvertError = config_err.into();
        assert!(matches!(top, ConvertError::Config(_)));
        assert_eq!(
            top.to_string(),
            "Configuration error: Invalid quality 120: must be in range 0-100"
        );
    }

    #[test]
    fn test_process_error_detail() {
        let err = ProcessError::other("decode error");
        assert_eq!(err.to_string(), "decode error");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(
            ProcessError::Stat(io).to_string(),
            "failed to get file info: gone"
        );
    }

    #[test]
    fn test_job_outcome() {
        let ok = JobOutcome::Converted {
            job: Job::new("/a.png"),
            sizes: ConversionSizes::new(1000, 400),
        };
        assert!(ok.is_success());
        assert_eq!(ok.sizes(), Some(ConversionSizes::new(1000, 400)));

        let failed = JobOutcome::Failed {
            job: Job::new("/b.png"),
            error: ProcessError::other("boom"),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.job().path().to_str(), Some("/b.png"));
        assert!(failed.sizes().is_none());
    }
}
