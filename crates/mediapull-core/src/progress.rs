//! Byte-level progress for a download batch.
//!
//! The tracker owns an atomic byte counter (the source of truth) and an
//! `indicatif` bar that renders it. The bar redraws on every `advance` and
//! on a steady tick so elapsed time keeps moving between completions; the
//! tick thread runs until `finish`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Steady redraw interval.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

const BAR_TEMPLATE: &str = concat!(
    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} ",
    "{bytes}/{total_bytes} ({percent}%) {binary_bytes_per_sec} ETA {eta}"
);

/// Snapshot of batch progress.
///
/// Consumers can compute rate = bytes_done / elapsed_secs and
/// ETA = (total_bytes - bytes_done) / rate.
#[derive(Debug, Clone)]
pub struct ProgressStats {
    /// Bytes of completed downloads.
    pub bytes_done: u64,
    /// Sum of expected sizes across the batch.
    pub total_bytes: u64,
    /// Elapsed time since the tracker was created (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 or already done).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}

pub struct ProgressTracker {
    bar: ProgressBar,
    total: u64,
    done: AtomicU64,
    started: Instant,
}

impl ProgressTracker {
    /// Tracker with a fixed `total`. When `visible` is false nothing is
    /// drawn, but counting and line printing still work.
    pub fn new(total: u64, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(total), target);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        if visible {
            bar.enable_steady_tick(TICK_INTERVAL);
        }
        Self {
            bar,
            total,
            done: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record one completed download of `bytes`. Safe to call from any worker.
    pub fn advance(&self, bytes: u64) {
        let prev = self.done.fetch_add(bytes, Ordering::AcqRel);
        debug_assert!(prev + bytes <= self.total, "advanced past total");
        self.bar.inc(bytes);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn bytes_done(&self) -> u64 {
        self.done.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            bytes_done: self.bytes_done(),
            total_bytes: self.total,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }

    /// Print a line to stdout above the bar, then redraw the bar.
    pub fn println(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }

    /// Print a line to stderr above the bar, then redraw the bar.
    pub fn eprintln(&self, line: &str) {
        self.bar.suspend(|| eprintln!("{}", line));
    }

    /// Stop the steady tick and leave the final state on screen.
    pub fn finish(&self) {
        self.bar.disable_steady_tick();
        self.bar.abandon();
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}
