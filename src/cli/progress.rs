//! Progress bar utilities for CLI output
//!
//! Console helpers and the batch progress bar used by `embed`.
//!
//! Key features:
//! - Progress bars that suspend cleanly when logging
//! - Consistent visual styling across all operations

use crate::core::embed::{BatchProgress, BatchReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

// ============================================================================
// Styles - Consistent visual appearance
// ============================================================================

/// Get the spinner style for single-item operations
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷")
}

/// Get the progress bar style for batch embedding
fn progress_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

/// Get the style for completed progress bars
fn completed_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  ✓ [{bar:40.green/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━━")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a section divider
pub fn print_divider() {
    println!();
    println!("{}", "─".repeat(60));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

// ============================================================================
// Spinner for single operations
// ============================================================================

/// Spinner shown while one cover is normalized, embedded and reconciled
pub struct Spinner {
    spinner: ProgressBar,
}

impl Spinner {
    pub fn new(msg: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(msg.to_string());
        Self { spinner }
    }

    /// Run `f` with the spinner hidden, for prompts and log output
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.spinner.suspend(f)
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.spinner
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

// ============================================================================
// Batch embedding progress
// ============================================================================

/// Progress bar for a batch of covers
pub struct EmbedProgress {
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl EmbedProgress {
    pub fn new(total: u64) -> Self {
        let progress_bar = ProgressBar::new(total);
        progress_bar.set_style(progress_bar_style());
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar.set_message("Starting...");

        Self {
            progress_bar,
            start_time: Instant::now(),
        }
    }

    /// Move the bar to the cover about to be processed
    pub fn update(&self, progress: &BatchProgress<'_>) {
        self.progress_bar.set_position(progress.current as u64);
        let name: String = progress
            .cover
            .file_name()
            .map(|n| n.to_string_lossy().chars().take(30).collect())
            .unwrap_or_default();
        self.progress_bar.set_message(name);
    }

    /// Run `f` with the bar hidden, for prompts and log output
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.progress_bar.suspend(f)
    }

    /// Get the underlying progress bar, e.g. to hide it while prompting
    pub fn bar(&self) -> &ProgressBar {
        &self.progress_bar
    }

    /// Finish the bar with the batch tally
    pub fn finish(&self, report: &BatchReport) {
        let elapsed = format_duration(self.start_time.elapsed());
        if report.interrupted {
            self.progress_bar
                .abandon_with_message(format!("Interrupted after {}", elapsed));
            return;
        }

        self.progress_bar.set_position(report.processed() as u64);
        self.progress_bar.set_style(completed_style());
        self.progress_bar.finish_with_message(format!(
            "{} committed, {} cancelled, {} failed in {}",
            report.committed.len(),
            report.cancelled.len(),
            report.failed.len(),
            elapsed
        ));
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_embed_progress_tracks_position() {
        let progress = EmbedProgress::new(3);
        progress.update(&BatchProgress {
            current: 2,
            total: 3,
            cover: Path::new("covers/Hero #3.png"),
        });
        assert_eq!(progress.progress_bar.position(), 2);

        let report = BatchReport::default();
        progress.finish(&report);
        assert!(progress.progress_bar.is_finished());
    }
}
