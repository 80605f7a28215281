//! avifconv - Parallel batch image converter
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use avifconv::batch::{BatchCoordinator, JobProcessor, TracingSink};
use avifconv::config::{CliArgs, ConvertConfig};
use avifconv::convert::{collect_images, AvifConverter};
use avifconv::error::ConvertError;
use avifconv::progress::{
    print_header, print_summary, HiddenDisplay, LineDisplay, SuspendingSink, TerminalDisplay,
};
use clap::Parser;
use console::Term;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = ConvertConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.input.display().to_string(),
            config.worker_count,
            &config.encoding(),
        );
    }

    if config.is_directory {
        run_directory(&config)
    } else {
        run_single(&config)
    }
}

/// Convert every supported image under a directory
fn run_directory(config: &ConvertConfig) -> Result<()> {
    info!(
        "Processing directory: {} (workers: {}, quality: {}, alpha quality: {}, speed: {})",
        config.input.display(),
        config.worker_count,
        config.quality,
        config.alpha_quality,
        config.speed
    );

    let jobs = collect_images(&config.input).context("Failed to collect images")?;
    let total = jobs.len() as u64;

    let processor: Arc<dyn JobProcessor> = Arc::new(AvifConverter::new(config.encoding()));
    let coordinator = attach_display(
        BatchCoordinator::new(config.batch_config(), processor),
        config.show_progress,
        total,
    );

    // Setup signal handler for graceful shutdown
    let cancel = coordinator.cancellation();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing in-flight files...");
        cancel.cancel();
    })
    .context("Failed to set signal handler")?;

    let report = coordinator.run(jobs).context("Batch failed")?;

    if total > 0 {
        print_summary(&report.stats, report.duration, report.cancelled);
    }

    if report.stats.failed_files > 0 {
        info!(errors = report.stats.failed_files, "Batch completed with errors");
    }

    if report.cancelled {
        warn!(
            processed = report.stats.processed_files,
            total = report.stats.total_files,
            "Batch was interrupted before completion"
        );
        return Err(ConvertError::Interrupted.into());
    }

    Ok(())
}

/// Convert one file; failure is fatal
fn run_single(config: &ConvertConfig) -> Result<()> {
    let converter = AvifConverter::new(config.encoding());
    let start = Instant::now();

    let sizes = converter
        .convert(&config.input)
        .with_context(|| format!("Failed to convert {}", config.input.display()))?;

    info!(
        "Successfully converted to AVIF: {}",
        AvifConverter::output_path(&config.input).display()
    );
    info!(
        "Compression ratio: {:.1}% ({} KB → {} KB) in {:?}",
        sizes.ratio_percent(),
        sizes.original / 1024,
        sizes.compressed / 1024,
        start.elapsed()
    );

    Ok(())
}

/// Pick a progress display for the current stderr
fn attach_display(
    coordinator: BatchCoordinator,
    show_progress: bool,
    total: u64,
) -> BatchCoordinator {
    if !show_progress {
        coordinator.with_display(Box::new(HiddenDisplay))
    } else if Term::stderr().is_term() {
        // Failure lines are logged while the bar is live
        let display = TerminalDisplay::new(total);
        coordinator
            .with_events(Arc::new(SuspendingSink::new(display.bar(), TracingSink)))
            .with_display(Box::new(display))
    } else {
        coordinator.with_display(Box::new(LineDisplay::stderr()))
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("avifconv=debug,warn")
    } else {
        EnvFilter::new("avifconv=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
