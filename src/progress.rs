//! Progress reporting for batch conversion
//!
//! [`ProgressReporter`] owns the [`ProgressState`] behind a mutex; workers
//! only ever call [`ProgressReporter::increment`]. Drawing is delegated to a
//! [`ProgressDisplay`]: an indicatif bar on a terminal, a plain `\r` line
//! on any writer, or nothing at all.

use crate::batch::{BatchEvent, EventSink, ProcessStats};
use crate::convert::EncodingOptions;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::trace;

/// Width of the bar in cells
pub const BAR_WIDTH: usize = 50;

/// Snapshot of progress for one batch
#[derive(Debug, Clone)]
pub struct ProgressState {
    pub current: u64,
    pub total: u64,
    pub started_at: Instant,
    pub completed: bool,
}

impl ProgressState {
    pub fn new(total: u64) -> Self {
        Self {
            current: 0,
            total,
            started_at: Instant::now(),
            completed: false,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    /// Number of filled cells in a bar of `width`
    pub fn filled(&self, width: usize) -> usize {
        if self.total == 0 {
            return width;
        }
        (width as u128 * self.current as u128 / self.total as u128) as usize
    }

    /// `elapsed × remaining / current`, zero before the first unit
    pub fn eta(&self) -> Duration {
        self.eta_after(self.started_at.elapsed())
    }

    fn eta_after(&self, elapsed: Duration) -> Duration {
        if self.current == 0 {
            return Duration::ZERO;
        }
        let remaining = self.total.saturating_sub(self.current);
        elapsed.mul_f64(remaining as f64 / self.current as f64)
    }
}

/// Output sink for a progress line
pub trait ProgressDisplay: Send {
    /// Draw the current state
    fn render(&mut self, label: &str, state: &ProgressState) -> io::Result<()>;

    /// Terminate the line after the final render
    fn finish(&mut self, state: &ProgressState) -> io::Result<()>;
}

/// Thread-safe progress reporter
pub struct ProgressReporter {
    label: String,
    inner: Mutex<ReporterInner>,
}

struct ReporterInner {
    state: ProgressState,
    display: Box<dyn ProgressDisplay>,
}

impl ReporterInner {
    fn render(&mut self, label: &str) {
        if self.state.completed {
            return;
        }
        // The conversion outcome must not depend on the terminal
        if let Err(e) = self.display.render(label, &self.state) {
            trace!(error = %e, "Progress render failed");
        }
    }
}

impl ProgressReporter {
    pub fn new(total: u64, label: impl Into<String>, display: Box<dyn ProgressDisplay>) -> Self {
        Self {
            label: label.into(),
            inner: Mutex::new(ReporterInner {
                state: ProgressState::new(total),
                display,
            }),
        }
    }

    /// Reporter that tracks state but draws nothing
    pub fn hidden(total: u64) -> Self {
        Self::new(total, "", Box::new(HiddenDisplay))
    }

    /// Advance by `amount`, clamped to the total
    pub fn increment(&self, amount: u64) {
        let mut inner = self.inner.lock();
        let state = &mut inner.state;
        state.current = state.current.saturating_add(amount).min(state.total);
        inner.render(&self.label);
    }

    /// Move to `value`, clamped to the total; never moves backwards
    pub fn set(&self, value: u64) {
        let mut inner = self.inner.lock();
        let state = &mut inner.state;
        state.current = value.min(state.total).max(state.current);
        inner.render(&self.label);
    }

    /// Fill the bar and end the line; later calls do nothing
    pub fn complete(&self) {
        self.finish_with(true);
    }

    /// End the line at the current position (cancelled batch)
    pub fn abandon(&self) {
        self.finish_with(false);
    }

    fn finish_with(&self, fill: bool) {
        let mut inner = self.inner.lock();
        if inner.state.completed {
            return;
        }

        if fill {
            inner.state.current = inner.state.total;
        }
        inner.render(&self.label);
        inner.state.completed = true;

        let ReporterInner { state, display } = &mut *inner;
        if let Err(e) = display.finish(state) {
            trace!(error = %e, "Progress finish failed");
        }
    }

    /// Copy of the current state
    pub fn state(&self) -> ProgressState {
        self.inner.lock().state.clone()
    }
}

/// Draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct HiddenDisplay;

impl ProgressDisplay for HiddenDisplay {
    fn render(&mut self, _label: &str, _state: &ProgressState) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, _state: &ProgressState) -> io::Result<()> {
        Ok(())
    }
}

/// Plain single-line display: `\rLabel [████░░░░] 40% 4/10 ETA: 3s `
pub struct LineDisplay<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> LineDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl LineDisplay<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ProgressDisplay for LineDisplay<W> {
    fn render(&mut self, label: &str, state: &ProgressState) -> io::Result<()> {
        let filled = state.filled(BAR_WIDTH);
        write!(
            self.out,
            "\r{} [{}{}] {:3.0}% {}/{} ETA: {} ",
            label,
            "█".repeat(filled),
            "░".repeat(BAR_WIDTH - filled),
            state.percent(),
            state.current,
            state.total,
            format_duration(state.eta()),
        )?;
        self.out.flush()
    }

    fn finish(&mut self, _state: &ProgressState) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Terminal display backed by an indicatif bar
///
/// The ETA shown is the reporter's own estimate, passed in as the bar's
/// prefix, not indicatif's rate estimator.
pub struct TerminalDisplay {
    bar: ProgressBar,
}

impl TerminalDisplay {
    pub fn new(total: u64) -> Self {
        Self::with_draw_target(total, ProgressDrawTarget::stderr())
    }

    fn with_draw_target(total: u64, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total), target);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:50.cyan/blue}] {percent:>3}% {pos}/{len} ETA: {prefix}")
        {
            bar.set_style(style.progress_chars("█░"));
        }
        bar.set_prefix(format_duration(Duration::ZERO));

        Self { bar }
    }

    /// Handle to the underlying bar (for suspending it around log output)
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl ProgressDisplay for TerminalDisplay {
    fn render(&mut self, label: &str, state: &ProgressState) -> io::Result<()> {
        if self.bar.message() != label {
            self.bar.set_message(label.to_string());
        }
        self.bar.set_prefix(format_duration(state.eta()));
        self.bar.set_position(state.current);
        Ok(())
    }

    fn finish(&mut self, state: &ProgressState) -> io::Result<()> {
        self.bar.set_prefix(format_duration(state.eta()));
        self.bar.set_position(state.current);
        self.bar.abandon();
        Ok(())
    }
}

/// Event sink that clears the terminal bar while the inner sink writes
///
/// Keeps failure log lines from tearing the live bar.
pub struct SuspendingSink<S> {
    bar: ProgressBar,
    inner: S,
}

impl<S: EventSink> SuspendingSink<S> {
    pub fn new(bar: ProgressBar, inner: S) -> Self {
        Self { bar, inner }
    }
}

impl<S: EventSink> EventSink for SuspendingSink<S> {
    fn on_event(&self, event: BatchEvent) {
        self.bar.suspend(|| self.inner.on_event(event));
    }
}

/// Format a duration as `0s`, `42s`, `3m07s` or `1h02m03s`
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        return "0s".to_string();
    }

    let secs = d.as_secs_f64().round() as u64;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Summary rows as `(label, value)` pairs
pub fn summary_rows(stats: &ProcessStats) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        (
            "Processed files:",
            format!(
                "{}/{}",
                format_number(stats.successful_files),
                format_number(stats.total_files)
            ),
        ),
        ("Failed files:", format_number(stats.failed_files)),
        (
            "Original size:",
            format_size(stats.total_original_bytes, BINARY),
        ),
        (
            "Compressed size:",
            format_size(stats.total_compressed_bytes, BINARY),
        ),
        (
            "Compression ratio:",
            format!("{:.1}%", stats.compression_ratio()),
        ),
    ];

    if let Some(saved) = stats.space_saved() {
        rows.push(("Space saved:", format_size(saved, BINARY)));
    }

    rows
}

/// Print a summary of the batch results
pub fn print_summary(stats: &ProcessStats, duration: Duration, cancelled: bool) {
    let title = if cancelled {
        style("Processing Interrupted").yellow().bold()
    } else {
        style("Processing Summary").green().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    for (label, value) in summary_rows(stats) {
        if label == "Failed files:" && stats.failed_files > 0 {
            println!("  {} {}", style(label).yellow().bold(), value);
        } else {
            println!("  {} {}", style(label).bold(), value);
        }
    }
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        duration.as_secs_f64()
    );
    println!();
}

/// Print a header at the start of a run
pub fn print_header(input: &str, workers: usize, encoding: &EncodingOptions) {
    println!();
    println!(
        "{} {}",
        style("avifconv").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Input:").bold(), input);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!(
        "  {} {} (alpha {})",
        style("Quality:").bold(),
        encoding.quality,
        encoding.alpha_quality
    );
    println!("  {} {}", style("Speed:").bold(), encoding.speed);
    println!();
}
