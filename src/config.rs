//! Configuration types for avifconv
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::batch::BatchConfig;
use crate::convert::avif::{DEFAULT_ALPHA_QUALITY, DEFAULT_QUALITY, DEFAULT_SPEED};
use crate::convert::EncodingOptions;
use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 1;

/// Highest accepted quality
const MAX_QUALITY: u8 = 100;

/// Highest accepted encoder speed
const MAX_SPEED: u8 = 10;

/// Batch image converter to AVIF
#[derive(Parser, Debug, Clone)]
#[command(
    name = "avifconv",
    version,
    about = "Convert JPEG, PNG and WebP images to AVIF in parallel",
    long_about = "Converts a single image, or every JPEG/PNG/WebP image found recursively\n\
                  under a directory, to AVIF. Each converted file replaces its source.",
    after_help = "EXAMPLES:\n    \
        avifconv ./photos\n    \
        avifconv ./photos -w 8 --quality 70 --speed 4\n    \
        avifconv holiday.jpg"
)]
pub struct CliArgs {
    /// Image file or directory to convert
    #[arg(value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Number of worker threads
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// AVIF quality (0-100)
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_name = "NUM")]
    pub quality: u8,

    /// Alpha channel quality (0-100)
    #[arg(long = "quality-alpha", default_value_t = DEFAULT_ALPHA_QUALITY, value_name = "NUM")]
    pub quality_alpha: u8,

    /// Encoding speed (0-10, lower is slower but better)
    #[arg(long, default_value_t = DEFAULT_SPEED, value_name = "NUM")]
    pub speed: u8,

    /// Job queue size (defaults to 3 slots per worker)
    #[arg(long, value_name = "NUM")]
    pub queue_size: Option<usize>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // Encoding is CPU bound
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// File or directory to convert
    pub input: PathBuf,

    /// Whether the input is a directory
    pub is_directory: bool,

    /// Number of worker threads
    pub worker_count: usize,

    /// Job queue capacity override
    pub queue_size: Option<usize>,

    /// AVIF quality
    pub quality: u8,

    /// Alpha channel quality
    pub alpha_quality: u8,

    /// Encoder speed
    pub speed: u8,

    /// Show progress indicator
    pub show_progress: bool,
}

impl ConvertConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let input = args.input.ok_or(ConfigError::MissingInput)?;

        let metadata = std::fs::metadata(&input).map_err(|e| ConfigError::InvalidInput {
            path: input.clone(),
            reason: e.to_string(),
        })?;

        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if let Some(size) = args.queue_size {
            if size < MIN_QUEUE_SIZE {
                return Err(ConfigError::InvalidQueueSize {
                    size,
                    min: MIN_QUEUE_SIZE,
                });
            }
        }

        if args.quality > MAX_QUALITY {
            return Err(ConfigError::InvalidQuality {
                value: args.quality,
            });
        }

        if args.quality_alpha > MAX_QUALITY {
            return Err(ConfigError::InvalidAlphaQuality {
                value: args.quality_alpha,
            });
        }

        if args.speed > MAX_SPEED {
            return Err(ConfigError::InvalidSpeed { value: args.speed });
        }

        Ok(Self {
            input,
            is_directory: metadata.is_dir(),
            worker_count: args.workers,
            queue_size: args.queue_size,
            quality: args.quality,
            alpha_quality: args.quality_alpha,
            speed: args.speed,
            show_progress: !args.quiet,
        })
    }

    /// Engine settings for a directory run
    pub fn batch_config(&self) -> BatchConfig {
        let config = BatchConfig::new(self.worker_count);
        match self.queue_size {
            Some(size) => config.with_queue_size(size),
            None => config,
        }
    }

    /// Encoder settings
    pub fn encoding(&self) -> EncodingOptions {
        EncodingOptions {
            quality: self.quality,
            alpha_quality: self.alpha_quality,
            speed: self.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["avifconv"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse(&["photos"]);
        assert_eq!(args.input, Some(PathBuf::from("photos")));
        assert_eq!(args.quality, 80);
        assert_eq!(args.quality_alpha, 80);
        assert_eq!(args.speed, 6);
        assert_eq!(args.workers, num_cpus::get());
        assert_eq!(args.queue_size, None);
        assert!(!args.quiet);
        assert!(!args.verbose);
    }

    #[test]
    fn test_cli_rejects_out_of_type_values() {
        assert!(CliArgs::try_parse_from(["avifconv", "--quality", "300", "x"]).is_err());
        assert!(CliArgs::try_parse_from(["avifconv", "-w", "-1", "x"]).is_err());
    }

    #[test]
    fn test_from_args_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let config =
            ConvertConfig::from_args(parse(&[path, "-w", "4", "--quality", "60", "--quality-alpha", "40", "-q"]))
                .unwrap();

        assert!(config.is_directory);
        assert_eq!(config.worker_count, 4);
        assert!(!config.show_progress);
        assert_eq!(
            config.encoding(),
            EncodingOptions {
                quality: 60,
                alpha_quality: 40,
                speed: 6,
            }
        );
        assert_eq!(config.batch_config().configured_queue_size(), 12);
    }

    #[test]
    fn test_from_args_queue_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let config = ConvertConfig::from_args(parse(&[path, "--queue-size", "5"])).unwrap();
        assert_eq!(config.batch_config().configured_queue_size(), 5);
    }

    #[test]
    fn test_from_args_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, b"x").unwrap();

        let config = ConvertConfig::from_args(parse(&[file.to_str().unwrap()])).unwrap();
        assert!(!config.is_directory);
    }

    #[test]
    fn test_from_args_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        assert!(matches!(
            ConvertConfig::from_args(parse(&[])),
            Err(ConfigError::MissingInput)
        ));

        let missing = dir.path().join("missing");
        assert!(matches!(
            ConvertConfig::from_args(parse(&[missing.to_str().unwrap()])),
            Err(ConfigError::InvalidInput { .. })
        ));

        assert!(matches!(
            ConvertConfig::from_args(parse(&[path, "-w", "0"])),
            Err(ConfigError::InvalidWorkerCount { count: 0, max: 512 })
        ));

        assert!(matches!(
            ConvertConfig::from_args(parse(&[path, "-w", "513"])),
            Err(ConfigError::InvalidWorkerCount { .. })
        ));

        assert!(matches!(
            ConvertConfig::from_args(parse(&[path, "--queue-size", "0"])),
            Err(ConfigError::InvalidQueueSize { size: 0, min: 1 })
        ));

        assert!(matches!(
            ConvertConfig::from_args(parse(&[path, "--quality", "101"])),
            Err(ConfigError::InvalidQuality { value: 101 })
        ));

        assert!(matches!(
            ConvertConfig::from_args(parse(&[path, "--quality-alpha", "101"])),
            Err(ConfigError::InvalidAlphaQuality { value: 101 })
        ));

        assert!(matches!(
            ConvertConfig::from_args(parse(&[path, "--quality-alpha", "0"])),
            Ok(ConvertConfig { alpha_quality: 0, .. })
        ));

        assert!(matches!(
            ConvertConfig::from_args(parse(&[path, "--speed", "11"])),
            Err(ConfigError::InvalidSpeed { value: 11 })
        ));
    }
}
