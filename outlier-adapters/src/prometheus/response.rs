//! Decoding of Prometheus HTTP API query responses.
//!
//! ```text
//! {"status":"success","data":{"resultType":"matrix","result":[
//!     {"metric":{"source_workload":"..."},"values":[[1539917345.608,"0.0123"]]}
//! ]}}
//! ```

use serde::Deserialize;

use outlier_types::{InstantSample, Labels, Sample, Series};

use crate::AdapterError;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum QueryData {
    Vector(Vec<VectorEntry>),
    Matrix(Vec<MatrixEntry>),
    Scalar(serde_json::Value),
    #[serde(rename = "string")]
    Text(serde_json::Value),
}

impl QueryData {
    fn kind(&self) -> &'static str {
        match self {
            QueryData::Vector(_) => "vector",
            QueryData::Matrix(_) => "matrix",
            QueryData::Scalar(_) => "scalar",
            QueryData::Text(_) => "string",
        }
    }
}

#[derive(Debug, Deserialize)]
struct VectorEntry {
    #[serde(default)]
    metric: Labels,
    value: RawSample,
}

#[derive(Debug, Deserialize)]
struct MatrixEntry {
    #[serde(default)]
    metric: Labels,
    #[serde(default)]
    values: Vec<RawSample>,
}

/// `[<unix seconds>, "<value>"]`
#[derive(Debug, Deserialize)]
struct RawSample(f64, String);

impl RawSample {
    fn decode(self) -> Result<Sample, AdapterError> {
        let RawSample(seconds, raw) = self;
        let value = raw
            .parse::<f64>()
            .map_err(|e| AdapterError::Parse(format!("invalid sample value '{}': {}", raw, e)))?;
        Ok(Sample::new((seconds * 1000.0).round() as i64, value))
    }
}

fn decode(body: &str) -> Result<QueryData, AdapterError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| AdapterError::Parse(e.to_string()))?;

    if response.status != "success" {
        return Err(AdapterError::Query {
            error_type: response.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: response.error.unwrap_or_default(),
        });
    }

    response
        .data
        .ok_or_else(|| AdapterError::Parse("response has no data".to_string()))
}

/// Decode an instant query response into instant samples.
pub fn decode_vector(body: &str) -> Result<Vec<InstantSample>, AdapterError> {
    match decode(body)? {
        QueryData::Vector(entries) => entries
            .into_iter()
            .map(|entry| Ok(InstantSample::new(entry.metric, entry.value.decode()?)))
            .collect(),
        other => Err(AdapterError::Parse(format!(
            "expected vector result, got {}",
            other.kind()
        ))),
    }
}

/// Decode a range query response into series.
pub fn decode_matrix(body: &str) -> Result<Vec<Series>, AdapterError> {
    match decode(body)? {
        QueryData::Matrix(entries) => entries
            .into_iter()
            .map(|entry| {
                let samples = entry
                    .values
                    .into_iter()
                    .map(RawSample::decode)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Series::new(entry.metric, samples))
            })
            .collect(),
        other => Err(AdapterError::Parse(format!(
            "expected matrix result, got {}",
            other.kind()
        ))),
    }
}
