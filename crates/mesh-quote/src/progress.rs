//! Progress reporting for long-running ingestion and analysis.
//!
//! Progress is advisory: callbacks observe a fraction in `0.0..=1.0` and a
//! stage message, but cannot influence the result. A pipeline run is split
//! into stages, each owning a slice of the overall range, so a caller sees a
//! single monotonic fraction across parse, analysis and cache storage.
//!
//! # Example
//!
//! ```
//! use mesh_quote::progress::{Progress, ProgressCallback, ProgressReporter};
//!
//! let callback: ProgressCallback = Box::new(|progress: &Progress| {
//!     println!("{}% {}", progress.percent(), progress.message);
//! });
//!
//! let reporter = ProgressReporter::new(Some(&callback));
//! let parse = reporter.stage(0.0, 0.5);
//! parse.report(0.5, "parsing");
//! parse.finish("parsed");
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information passed to callbacks.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Overall completion in `0.0..=1.0`.
    pub fraction: f64,

    /// Human-readable message describing the current stage.
    pub message: String,

    /// Elapsed time since the reporter was created.
    pub elapsed: Duration,
}

impl Progress {
    /// Get progress as a percentage (0 to 100).
    #[inline]
    pub fn percent(&self) -> u32 {
        (self.fraction * 100.0).round() as u32
    }

    /// Check if the operation is complete.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.fraction >= 1.0
    }
}

/// Callback function for progress reporting.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

/// Forwards stage-local progress to an optional callback.
///
/// Reported fractions never decrease, even when stages report out of order.
pub struct ProgressReporter<'a> {
    callback: Option<&'a ProgressCallback>,
    start_time: Instant,
    // f64 bits of the highest fraction reported so far
    high_water: AtomicU64,
}

impl<'a> ProgressReporter<'a> {
    /// Create a reporter; `None` turns every report into a no-op.
    pub fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            start_time: Instant::now(),
            high_water: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// A reporter with no callback attached.
    pub fn silent() -> ProgressReporter<'static> {
        ProgressReporter::new(None)
    }

    /// Whether a callback is attached.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }

    /// Create a stage covering `[start, start + span]` of the overall range.
    pub fn stage(&self, start: f64, span: f64) -> StageProgress<'_, 'a> {
        StageProgress {
            reporter: self,
            start: start.clamp(0.0, 1.0),
            span: span.clamp(0.0, 1.0 - start.clamp(0.0, 1.0)),
        }
    }

    /// Report an overall fraction.
    pub fn report(&self, fraction: f64, message: &str) {
        let Some(callback) = self.callback else {
            return;
        };
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let previous = f64::from_bits(self.high_water.load(Ordering::Relaxed));
        let fraction = fraction.max(previous);
        self.high_water.store(fraction.to_bits(), Ordering::Relaxed);

        callback(&Progress {
            fraction,
            message: message.to_string(),
            elapsed: self.start_time.elapsed(),
        });
    }

    /// Highest fraction reported so far.
    pub fn current(&self) -> f64 {
        f64::from_bits(self.high_water.load(Ordering::Relaxed))
    }
}

/// A slice of the overall progress range owned by one pipeline stage.
pub struct StageProgress<'r, 'a> {
    reporter: &'r ProgressReporter<'a>,
    start: f64,
    span: f64,
}

impl StageProgress<'_, '_> {
    /// Report stage-local completion in `0.0..=1.0`.
    #[inline]
    pub fn report(&self, local: f64, message: &str) {
        if self.reporter.is_active() {
            let local = if local.is_finite() {
                local.clamp(0.0, 1.0)
            } else {
                0.0
            };
            self.reporter.report(self.start + self.span * local, message);
        }
    }

    /// Report `current / total` as stage-local completion.
    #[inline]
    pub fn report_count(&self, current: usize, total: usize, message: &str) {
        if total > 0 {
            self.report(current as f64 / total as f64, message);
        }
    }

    /// Mark the stage complete.
    pub fn finish(&self, message: &str) {
        self.report(1.0, message);
    }
}
