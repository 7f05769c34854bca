//! Baseline-driven window classification.
//!
//! Windows are walked in time order. Each window's exact median is compared
//! against an approximate median of everything observed before it (the
//! baseline pool), and then the window's own values join the pool:
//!
//! ```text
//! seed (samples <= start) ──▶ pool ──estimate──▶ window 1 ──append──▶ pool
//!                                 ──estimate──▶ window 2 ──append──▶ pool ...
//! ```

use std::time::Duration;

use chrono::DateTime;
use tracing::{debug, trace};

use outlier_types::{Sample, StatusLabel, StatusTimeline, WindowResult};

use crate::stats::{approximate_median, mean, median, round_to_resolution};
use crate::window::{Window, WindowAggregator};

/// The pool must hold more than this many values before an estimate is made.
pub const MIN_BASELINE_SIZE: usize = 5;

/// Historical values a window is compared against.
///
/// Grows monotonically during one classification walk and is rebuilt for
/// every query. Never holds NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselinePool {
    values: Vec<f64>,
}

impl BaselinePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool from historical values, dropping NaN.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut pool = Self::new();
        pool.extend(values);
        pool
    }

    /// Append one value; NaN is ignored.
    pub fn push(&mut self, value: f64) {
        if !value.is_nan() {
            self.values.push(value);
        }
    }

    /// Append values; NaN is ignored.
    pub fn extend(&mut self, values: impl IntoIterator<Item = f64>) {
        self.values
            .extend(values.into_iter().filter(|value| !value.is_nan()));
    }

    /// Number of values in the pool.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The pooled values, in their current order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Approximate median of the pool, if it is large enough.
    ///
    /// The estimator reorders the pool in place.
    pub fn estimate(&mut self) -> Option<f64> {
        if self.values.len() > MIN_BASELINE_SIZE {
            approximate_median(&mut self.values)
        } else {
            None
        }
    }
}

/// Rule deciding when a window is labelled `high`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LabelPolicy {
    /// `high` when the window median is strictly above the estimate.
    #[default]
    Strict,
    /// `high` only when the window median exceeds the estimate by more than
    /// the given tolerance (in the sample unit, e.g. seconds).
    ToleranceBand(f64),
}

impl LabelPolicy {
    /// Policy from an optional tolerance setting.
    pub fn from_tolerance(tolerance: Option<f64>) -> Self {
        match tolerance {
            Some(t) if t > 0.0 => LabelPolicy::ToleranceBand(t),
            _ => LabelPolicy::Strict,
        }
    }

    /// Label a window from its median and the baseline estimate.
    pub fn label(&self, median: Option<f64>, estimate: Option<f64>) -> StatusLabel {
        let (Some(median), Some(estimate)) = (median, estimate) else {
            return StatusLabel::Unknown;
        };

        let threshold = match self {
            LabelPolicy::Strict => estimate,
            LabelPolicy::ToleranceBand(tolerance) => estimate + tolerance,
        };

        if median > threshold {
            StatusLabel::High
        } else {
            StatusLabel::Ok
        }
    }
}

/// Classifies windows against a growing baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Classifier {
    policy: LabelPolicy,
}

impl Classifier {
    /// Create a classifier with the given labelling policy.
    pub fn new(policy: LabelPolicy) -> Self {
        Self { policy }
    }

    /// The labelling policy.
    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    /// Classify every window in time order, growing `pool` as it goes.
    pub fn classify(&self, windows: WindowAggregator, pool: &mut BaselinePool) -> StatusTimeline {
        windows
            .into_windows()
            .map(|window| self.classify_window(window, pool))
            .collect()
    }

    /// Classify a single window against `pool`, then add its values to it.
    ///
    /// Empty windows leave the pool untouched.
    pub fn classify_window(&self, window: Window, pool: &mut BaselinePool) -> WindowResult {
        // Keys outside chrono's range are reported at the Unix epoch.
        let time = DateTime::from_timestamp_millis(window.time_ms).unwrap_or_else(|| {
            debug!(time_ms = window.time_ms, "window key out of range");
            DateTime::default()
        });

        if window.is_empty() {
            return WindowResult::empty(time);
        }

        let avg = mean(&window.values);
        let window_median = median(&window.values);

        // Estimate from history strictly before this window.
        let estimate = pool.estimate();
        pool.extend(window.values);

        let avg = rounded(Some(avg));
        let window_median = rounded(window_median);
        let estimate = rounded(estimate);
        let label = self.policy.label(window_median, estimate);

        trace!(
            time_ms = window.time_ms,
            pool = pool.len(),
            %label,
            "window classified"
        );

        WindowResult {
            time,
            label,
            approximate_median: estimate,
            avg,
            median: window_median,
        }
    }

    /// Classify a raw series.
    ///
    /// Samples are sorted by time. Usable samples at or before `start_ms`
    /// seed the baseline; later samples are bucketed into `step` windows.
    pub fn classify_samples(&self, samples: &[Sample], start_ms: i64, step: Duration) -> StatusTimeline {
        let mut sorted = samples.to_vec();
        sorted.sort_by_key(|sample| sample.timestamp_ms);

        let mut pool = BaselinePool::new();
        let mut windows = WindowAggregator::new(step);

        for sample in sorted {
            if sample.timestamp_ms > start_ms {
                windows.add_sample(sample.timestamp_ms, sample.value);
            } else {
                pool.push(sample.value);
            }
        }

        self.classify(windows, &mut pool)
    }
}

impl WindowAggregator {
    /// Classify the collected windows with the strict labelling policy.
    pub fn aggregate(self, pool: &mut BaselinePool) -> StatusTimeline {
        Classifier::default().classify(self, pool)
    }
}

fn rounded(value: Option<f64>) -> Option<f64> {
    value.map(round_to_resolution).filter(|v| !v.is_nan())
}
