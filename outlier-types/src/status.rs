//! Classified status windows.

use core::fmt;

use chrono::{DateTime, Utc};

/// Status label attached to a classified window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StatusLabel {
    /// The window's median did not exceed the baseline estimate.
    Ok,
    /// The window's median exceeded the baseline estimate.
    High,
    /// No data in the window, or not enough history to compare against.
    #[default]
    Unknown,
}

impl StatusLabel {
    /// Returns the wire name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Ok => "ok",
            StatusLabel::High => "high",
            StatusLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The finalized result of one time window.
///
/// Statistics are rounded to 4 decimal places and are `None` when the window
/// had no usable values (or, for `approximate_median`, when the baseline was
/// too small to estimate from).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WindowResult {
    /// Start of the window (the rounded timestamp).
    #[cfg_attr(feature = "serde", serde(rename = "date"))]
    pub time: DateTime<Utc>,
    /// Classification of the window.
    #[cfg_attr(feature = "serde", serde(rename = "status"))]
    pub label: StatusLabel,
    /// Baseline estimate the window was compared against.
    pub approximate_median: Option<f64>,
    /// Arithmetic mean of the window's values.
    pub avg: Option<f64>,
    /// Exact median of the window's values.
    pub median: Option<f64>,
}

impl WindowResult {
    /// A result for a window without usable values.
    pub fn empty(time: DateTime<Utc>) -> Self {
        Self {
            time,
            label: StatusLabel::Unknown,
            approximate_median: None,
            avg: None,
            median: None,
        }
    }

    /// Whether the window carried any usable values.
    pub fn has_data(&self) -> bool {
        self.median.is_some()
    }
}

/// Ordered sequence of window results.
pub type StatusTimeline = Vec<WindowResult>;
