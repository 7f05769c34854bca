//! Bucketing of raw samples into fixed-size time windows.

use std::collections::BTreeMap;
use std::time::Duration;

/// Values collected for one time window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Window {
    /// Rounded timestamp keying the window, in Unix milliseconds.
    pub time_ms: i64,
    /// Usable values in insertion order.
    pub values: Vec<f64>,
}

impl Window {
    fn new(time_ms: i64) -> Self {
        Self {
            time_ms,
            values: Vec::new(),
        }
    }

    /// Whether the window received any usable value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Buckets `(timestamp, value)` samples into step-sized windows.
///
/// Windows are created lazily the first time a sample rounds to their key and
/// are only ever appended to. Iteration is in ascending time order.
///
/// Classification lives in [`crate::classifier`], including
/// [`WindowAggregator::aggregate`].
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    step_ms: i64,
    windows: BTreeMap<i64, Window>,
}

impl WindowAggregator {
    /// Create an aggregator with the given window size.
    ///
    /// A zero step leaves timestamps unrounded.
    pub fn new(step: Duration) -> Self {
        Self {
            step_ms: i64::try_from(step.as_millis()).unwrap_or(i64::MAX),
            windows: BTreeMap::new(),
        }
    }

    /// The window size in milliseconds.
    pub fn step_ms(&self) -> i64 {
        self.step_ms
    }

    /// Add a sample to the window its timestamp rounds to.
    ///
    /// NaN values are dropped, but the window is still created so the time
    /// slot shows up as "no data" in the timeline.
    pub fn add_sample(&mut self, timestamp_ms: i64, value: f64) {
        let key = round_to_step(timestamp_ms, self.step_ms);
        let window = self.windows.entry(key).or_insert_with(|| Window::new(key));

        if !value.is_nan() {
            window.values.push(value);
        }
    }

    /// Look up the window keyed by an already rounded timestamp.
    pub fn get(&self, time_ms: i64) -> Option<&Window> {
        self.windows.get(&time_ms)
    }

    /// Iterate windows in time order.
    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    /// Consume the aggregator, yielding windows in time order.
    pub fn into_windows(self) -> impl Iterator<Item = Window> {
        self.windows.into_values()
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no sample has been added yet.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Round a timestamp to the nearest multiple of `step_ms`, halves rounding up.
pub fn round_to_step(timestamp_ms: i64, step_ms: i64) -> i64 {
    if step_ms <= 0 {
        return timestamp_ms;
    }
    timestamp_ms
        .saturating_add(step_ms / 2)
        .div_euclid(step_ms)
        .saturating_mul(step_ms)
}
