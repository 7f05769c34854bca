//! PromQL builders for Istio telemetry.
//!
//! Control-plane workloads (`mixer`, `telemetry`, `policy`) are excluded from
//! every query so they never show up as graph nodes or edges.

/// Label set identifying one call edge.
const EDGE_LABELS: &str =
    "request_protocol, source_workload, source_app, destination_workload, destination_app";

/// Which end of a call the queried workload is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The workload issued the calls (downstream edges).
    Source,
    /// The workload received the calls (upstream edges, aggregate status).
    Destination,
}

impl Direction {
    /// Prefix of the matching Istio workload label.
    pub fn label_prefix(&self) -> &'static str {
        match self {
            Direction::Source => "source",
            Direction::Destination => "destination",
        }
    }
}

/// Request rate per `(source, destination)` pair over `rate_window`.
pub fn request_totals(rate_window: &str) -> String {
    format!(
        r#"sum(rate(istio_requests_total{{reporter="destination", source_app!="istio-ingressgateway", source_app!="telemetry", destination_app!="telemetry", source_app!="policy", destination_app!="policy", source_app!="mixer", destination_app!="mixer"}}[{rate_window}])) by (source_workload, destination_workload, source_app, destination_app)"#
    )
}

/// Latency quantile of calls where `workload` is on the `direction` end,
/// grouped by `group_by`.
pub fn request_duration(
    quantile: f64,
    direction: Direction,
    workload: &str,
    rate_window: &str,
    group_by: &str,
) -> String {
    format!(
        r#"histogram_quantile({quantile}, sum(rate(istio_request_duration_seconds_bucket{{reporter="destination", {prefix}_workload="{workload}", destination_app!="mixer", destination_app!="telemetry", destination_app!="policy"}}[{rate_window}])) by (le, {group_by}))"#,
        prefix = direction.label_prefix(),
        workload = escape_label_value(workload),
    )
}

/// Latency per destination of calls made by `workload`.
pub fn downstream_durations(quantile: f64, workload: &str, rate_window: &str) -> String {
    request_duration(quantile, Direction::Source, workload, rate_window, EDGE_LABELS)
}

/// Latency per source of calls received by `workload`.
pub fn upstream_durations(quantile: f64, workload: &str, rate_window: &str) -> String {
    request_duration(
        quantile,
        Direction::Destination,
        workload,
        rate_window,
        EDGE_LABELS,
    )
}

/// Latency of all calls received by `workload`.
pub fn workload_durations(quantile: f64, workload: &str, rate_window: &str) -> String {
    request_duration(
        quantile,
        Direction::Destination,
        workload,
        rate_window,
        "request_protocol",
    )
}

/// Escape a label value for use inside a PromQL string literal.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
