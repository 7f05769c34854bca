//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when fetching telemetry from an adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The backend rejected or failed to evaluate the query.
    #[error("Query failed ({error_type}): {message}")]
    Query {
        /// Backend error class (e.g. `bad_data`, `timeout`).
        error_type: String,
        /// Backend error message.
        message: String,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

#[cfg(feature = "prometheus")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_message() {
        let err = AdapterError::Query {
            error_type: "bad_data".to_string(),
            message: "parse error at char 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Query failed (bad_data): parse error at char 3"
        );
        assert_eq!(AdapterError::Timeout.to_string(), "Request timed out");
    }
}
