//! Raw telemetry results: samples, range series and instant vectors.

use std::collections::BTreeMap;

/// Label set attached to a series, e.g. `source_workload -> "reviews-v3"`.
pub type Labels = BTreeMap<String, String>;

/// A single timestamped measurement.
///
/// Latencies are expressed in seconds, timestamps in milliseconds since the
/// Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: i64,
    /// Measured value.
    pub value: f64,
}

impl Sample {
    /// Create a new sample.
    pub const fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }

    /// NaN readings carry no signal and never enter a window or baseline.
    pub fn is_usable(&self) -> bool {
        !self.value.is_nan()
    }
}

/// A labelled series of samples, one entry of a range query result.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    /// Labels identifying the series.
    pub labels: Labels,
    /// Samples, in whatever order the backend returned them.
    pub samples: Vec<Sample>,
}

impl Series {
    /// Create a series from labels and samples.
    pub fn new(labels: Labels, samples: Vec<Sample>) -> Self {
        Self { labels, samples }
    }

    /// Look up a label value.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// A labelled single value, one entry of an instant query result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstantSample {
    /// Labels identifying the series.
    pub labels: Labels,
    /// The evaluated sample.
    pub sample: Sample,
}

impl InstantSample {
    /// Create an instant sample.
    pub fn new(labels: Labels, sample: Sample) -> Self {
        Self { labels, sample }
    }

    /// Look up a label value.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_sample_is_not_usable() {
        assert!(Sample::new(0, 1.5).is_usable());
        assert!(!Sample::new(0, f64::NAN).is_usable());
        // Infinities are kept; only NaN is discarded.
        assert!(Sample::new(0, f64::INFINITY).is_usable());
    }

    #[test]
    fn label_lookup() {
        let mut labels = Labels::new();
        labels.insert("source_app".to_string(), "reviews".to_string());
        let series = Series::new(labels.clone(), vec![]);
        assert_eq!(series.label("source_app"), Some("reviews"));
        assert_eq!(series.label("destination_app"), None);

        let instant = InstantSample::new(labels, Sample::new(1, 0.0));
        assert_eq!(instant.label("source_app"), Some("reviews"));
    }
}
