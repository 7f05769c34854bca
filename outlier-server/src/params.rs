//! Query string parameters of the status endpoint.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use outlier_engine::{LabelPolicy, StatusQuery};

use crate::config::QueryDefaults;

/// Rejected request parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    /// The workload path segment is empty.
    #[error("Workload name cannot be empty")]
    EmptyName,

    /// A parameter could not be parsed.
    #[error("invalid {name} parameter {value:?}: {reason}")]
    Invalid {
        /// Parameter name.
        name: &'static str,
        /// Raw value as received.
        value: String,
        /// What was expected.
        reason: &'static str,
    },

    /// `start` is after `end`.
    #[error("start must not be after end")]
    InvertedRange,

    /// The default lookback reaches outside the representable time range.
    #[error("lookback of {0} minutes is out of range")]
    LookbackOutOfRange(u64),
}

/// Parsed `start`, `end`, `historical` and `statusStep` parameters.
///
/// Absent, empty and zero values mean "use the default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusParams {
    /// Start of the reported range.
    pub start: Option<DateTime<Utc>>,
    /// End of the reported range.
    pub end: Option<DateTime<Utc>>,
    /// History before `start`, in minutes.
    pub historical_minutes: Option<u64>,
    /// Window size, in minutes.
    pub step_minutes: Option<u64>,
}

impl StatusParams {
    /// Parse a raw query string. Unknown parameters are ignored.
    pub fn parse(query: Option<&str>) -> Result<Self, ParamError> {
        let mut params = Self::default();

        let Some(query) = query else {
            return Ok(params);
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "start" => params.start = Some(parse_time("start", &value)?),
                "end" => params.end = Some(parse_time("end", &value)?),
                "historical" => params.historical_minutes = parse_minutes("historical", &value)?,
                "statusStep" => params.step_minutes = parse_minutes("statusStep", &value)?,
                _ => {}
            }
        }

        Ok(params)
    }

    /// Resolve into a status query, filling gaps from `defaults`.
    ///
    /// `end` falls back to `now` and `start` to `end` minus the default
    /// lookback.
    pub fn into_query(
        self,
        workload: &str,
        defaults: &QueryDefaults,
        policy: LabelPolicy,
        now: DateTime<Utc>,
    ) -> Result<StatusQuery, ParamError> {
        let end = self.end.unwrap_or(now);
        let start = match self.start {
            Some(start) => start,
            None => lookback_start(end, defaults.lookback_minutes)?,
        };

        if start > end {
            return Err(ParamError::InvertedRange);
        }

        let historical = self.historical_minutes.unwrap_or(defaults.historical_minutes);
        let step = self.step_minutes.unwrap_or(defaults.step_minutes);

        Ok(StatusQuery::new(workload)
            .with_range(start, end)
            .with_historical(minutes(historical))
            .with_step(minutes(step))
            .with_policy(policy))
    }
}

/// Validate the workload path segment.
pub fn workload_name(segment: &str) -> Result<&str, ParamError> {
    if segment.trim().is_empty() {
        Err(ParamError::EmptyName)
    } else {
        Ok(segment)
    }
}

fn parse_time(name: &'static str, value: &str) -> Result<DateTime<Utc>, ParamError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ParamError::Invalid {
            name,
            value: value.to_string(),
            reason: "expected an RFC 3339 timestamp",
        })
}

fn parse_minutes(name: &'static str, value: &str) -> Result<Option<u64>, ParamError> {
    let minutes: u64 = value.parse().map_err(|_| ParamError::Invalid {
        name,
        value: value.to_string(),
        reason: "expected a whole number of minutes",
    })?;
    Ok((minutes > 0).then_some(minutes))
}

fn lookback_start(end: DateTime<Utc>, minutes: u64) -> Result<DateTime<Utc>, ParamError> {
    i64::try_from(minutes)
        .ok()
        .and_then(TimeDelta::try_minutes)
        .and_then(|lookback| end.checked_sub_signed(lookback))
        .ok_or(ParamError::LookbackOutOfRange(minutes))
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}
