//! Summary statistics over window values.
//!
//! - [`approximate_median`]: near-linear baseline estimate
//! - [`median`]: exact median of a window's own values
//! - [`mean`]: arithmetic mean
//! - [`round_to_resolution`]: fixed 0.0001 reporting resolution

mod approximate_median;

pub use approximate_median::{approximate_median, nth_root};

/// Reporting resolution: 4 decimal places, i.e. 0.1 ms for latencies in
/// seconds.
pub const RESOLUTION: f64 = 10_000.0;

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Exact median. For an even count, the mean of the two central values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[middle])
    } else {
        Some((sorted[middle - 1] + sorted[middle]) / 2.0)
    }
}

/// Round to 4 decimal places (half away from zero).
pub fn round_to_resolution(value: f64) -> f64 {
    (value * RESOLUTION).round() / RESOLUTION
}
