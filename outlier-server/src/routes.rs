//! Request routing.
//!
//! | Path | Response |
//! |------|----------|
//! | `/ping`, `/health`, `/healthz` | `ok` |
//! | `/api/v1/workloads` | call graph, workloads sorted by identity |
//! | `/api/v1/workloads/{name}/status` | workload with classified timelines |
//! | anything else | file from the web dist directory, or a redirect to `/` |

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Response, StatusCode, Uri};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use outlier_adapters::TelemetrySource;
use outlier_engine::{get_workload_status, get_workloads, LabelPolicy};
use outlier_types::WorkloadNode;

use crate::config::{QueryDefaults, Settings};
use crate::params::{workload_name, StatusParams};

const WORKLOADS_PATH: &str = "/api/v1/workloads";

/// Shared state of the request handlers.
pub struct AppState {
    /// Where telemetry is read from.
    pub source: Arc<dyn TelemetrySource>,
    /// Directory static files are served from.
    pub web_dist: PathBuf,
    /// Fallbacks for status query parameters.
    pub defaults: QueryDefaults,
    /// Labelling rule for status windows.
    pub policy: LabelPolicy,
}

impl AppState {
    /// State for the given source, configured from `settings`.
    pub fn new(source: Arc<dyn TelemetrySource>, settings: &Settings) -> Self {
        Self {
            source,
            web_dist: settings.web_dist_path.clone(),
            defaults: settings.defaults,
            policy: settings.label_policy(),
        }
    }
}

#[derive(Serialize)]
struct WorkloadsResponse {
    workloads: Vec<WorkloadNode>,
}

/// Route a request to its handler.
pub async fn handle_request(method: &Method, uri: &Uri, state: &AppState) -> Response<Full<Bytes>> {
    let path = uri.path();
    debug!(%method, path, "request");

    if method != Method::GET {
        let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET"));
        return response;
    }

    match path {
        "/ping" | "/health" | "/healthz" => text(StatusCode::OK, "ok"),
        WORKLOADS_PATH => workloads(state).await,
        _ => match status_route(path) {
            Some(name) => workload_status(name, uri.query(), state).await,
            None => static_file(path, &state.web_dist).await,
        },
    }
}

/// Workload name of a `/api/v1/workloads/{name}/status` path.
fn status_route(path: &str) -> Option<&str> {
    path.strip_prefix(WORKLOADS_PATH)?
        .strip_prefix('/')?
        .strip_suffix("/status")
        .filter(|name| !name.contains('/'))
}

async fn workloads(state: &AppState) -> Response<Full<Bytes>> {
    match get_workloads(state.source.as_ref()).await {
        Ok(graph) => json_response(
            StatusCode::OK,
            &WorkloadsResponse {
                workloads: graph.into_workloads(),
            },
        ),
        Err(e) => {
            error!(error = %e, "failed to fetch workloads");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn workload_status(name: &str, query: Option<&str>, state: &AppState) -> Response<Full<Bytes>> {
    let query = match workload_name(name)
        .and_then(|name| StatusParams::parse(query).map(|params| (name, params)))
        .and_then(|(name, params)| params.into_query(name, &state.defaults, state.policy, Utc::now()))
    {
        Ok(query) => query,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    match get_workload_status(state.source.as_ref(), &query).await.into_result() {
        Ok(workload) => json_response(StatusCode::OK, &workload),
        Err(e) => {
            error!(workload = name, error = %e, "failed to fetch workload status");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn static_file(path: &str, root: &Path) -> Response<Full<Bytes>> {
    let Some(relative) = relative_file(path) else {
        return text(StatusCode::BAD_REQUEST, "Bad Request");
    };

    let file = root.join(&relative);
    match tokio::fs::read(&file).await {
        Ok(contents) => {
            let mut response = Response::new(Full::new(Bytes::from(contents)));
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type(&file)));
            response
        }
        // Nothing to redirect to.
        Err(_) if path == "/" => text(StatusCode::NOT_FOUND, "Not Found"),
        Err(_) => redirect("/"),
    }
}

/// Map a request path to a file below the dist root. `None` if the path
/// tries to leave it.
fn relative_file(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let relative = Path::new(if trimmed.is_empty() { "index.html" } else { trimmed });

    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| relative.to_path_buf())
}

fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn text(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn redirect(location: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_static(location));
    response
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use outlier_adapters::{AdapterError, InstantSample, Labels, Sample, Series};
    use serde_json::Value;

    #[derive(Default)]
    struct FakeSource {
        totals: Vec<InstantSample>,
        latencies: Vec<Series>,
        unavailable: bool,
    }

    impl FakeSource {
        fn result<T: Clone>(&self, value: &[T]) -> Result<Vec<T>, AdapterError> {
            if self.unavailable {
                Err(AdapterError::Connection("connection refused".to_string()))
            } else {
                Ok(value.to_vec())
            }
        }
    }

    #[async_trait]
    impl TelemetrySource for FakeSource {
        async fn request_totals(&self) -> Result<Vec<InstantSample>, AdapterError> {
            self.result(&self.totals)
        }

        async fn downstream_latencies(&self, _: &str, _: i64, _: i64) -> Result<Vec<Series>, AdapterError> {
            self.result(&self.latencies)
        }

        async fn upstream_latencies(&self, _: &str, _: i64, _: i64) -> Result<Vec<Series>, AdapterError> {
            self.result(&[])
        }

        async fn workload_latencies(&self, _: &str, _: i64, _: i64) -> Result<Vec<Series>, AdapterError> {
            self.result(&self.latencies)
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn state(source: FakeSource, web_dist: &Path) -> AppState {
        let settings = Settings {
            web_dist_path: web_dist.to_path_buf(),
            ..Settings::default()
        };
        AppState::new(Arc::new(source), &settings)
    }

    async fn get(state: &AppState, uri: &str) -> Response<Full<Bytes>> {
        handle_request(&Method::GET, &uri.parse().unwrap(), state).await
    }

    async fn body(response: Response<Full<Bytes>>) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn json_body(response: Response<Full<Bytes>>) -> Value {
        serde_json::from_slice(&body(response).await).unwrap()
    }

    #[tokio::test]
    async fn ping() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(FakeSource::default(), dir.path());

        for path in ["/ping", "/health", "/healthz"] {
            let response = get(&state, path).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body(response).await, b"ok");
        }
    }

    #[tokio::test]
    async fn non_get_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(FakeSource::default(), dir.path());

        let response = handle_request(&Method::POST, &"/ping".parse().unwrap(), &state).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn workloads_are_listed_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let edge = |src: &str, dst: &str| {
            InstantSample::new(
                labels(&[("source_workload", src), ("destination_workload", dst)]),
                Sample::new(0, 1.0),
            )
        };
        let source = FakeSource {
            totals: vec![edge("reviews-v3", "ratings-v1"), edge("productpage-v1", "reviews-v3")],
            ..Default::default()
        };
        let state = state(source, dir.path());

        let response = get(&state, "/api/v1/workloads").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let names: Vec<&str> = json["workloads"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["productpage-v1", "ratings-v1", "reviews-v3"]);
        assert_eq!(json["workloads"][2]["sources"][0]["name"], "productpage-v1");
        assert!(json["workloads"][2].get("statuses").is_none());
    }

    #[tokio::test]
    async fn workloads_fetch_failure_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            FakeSource {
                unavailable: true,
                ..Default::default()
            },
            dir.path(),
        );

        let response = get(&state, "/api/v1/workloads").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Connection failed: connection refused");
    }

    #[tokio::test]
    async fn workload_status_timeline() {
        let dir = tempfile::tempdir().unwrap();
        // 15:00:00Z; history up to start, one slow window after it.
        let start_ms = 1_540_652_400_000;
        let mut samples: Vec<Sample> = (0..10)
            .map(|k| Sample::new(start_ms - k * 60_000, 0.010))
            .collect();
        samples.push(Sample::new(start_ms + 300_000, 0.030));
        let source = FakeSource {
            latencies: vec![Series::new(
                labels(&[("destination_workload", "ratings-v1"), ("destination_app", "ratings")]),
                samples,
            )],
            ..Default::default()
        };
        let state = state(source, dir.path());

        let response = get(
            &state,
            "/api/v1/workloads/reviews-v3/status?start=2018-10-27T15:00:00Z&end=2018-10-27T16:00:00Z",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["name"], "reviews-v3");
        assert_eq!(json["sources"], serde_json::json!([]));

        let destination = &json["destinations"][0];
        assert_eq!(destination["name"], "ratings-v1");
        assert_eq!(destination["app"], "ratings");
        let window = &destination["statuses"][0];
        assert_eq!(window["date"], "2018-10-27T15:05:00Z");
        assert_eq!(window["status"], "high");
        assert_eq!(window["median"], 0.03);
        assert_eq!(window["avg"], 0.03);
        assert_eq!(window["approximateMedian"], 0.01);

        assert_eq!(json["statuses"][0]["status"], "high");
    }

    #[tokio::test]
    async fn workload_status_bad_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(FakeSource::default(), dir.path());

        let response = get(&state, "/api/v1/workloads/reviews-v3/status?historical=abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("historical"));

        let response = get(&state, "/api/v1/workloads//status").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Workload name cannot be empty");
    }

    #[tokio::test]
    async fn workload_status_failure_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            FakeSource {
                unavailable: true,
                ..Default::default()
            },
            dir.path(),
        );

        let response = get(&state, "/api/v1/workloads/reviews-v3/status").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("3 of 3 status queries failed"));
    }

    #[tokio::test]
    async fn static_files_and_redirects() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::create_dir(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static").join("app.js"), "console.log(1)").unwrap();
        let state = state(FakeSource::default(), dir.path());

        let response = get(&state, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body(response).await, b"<html></html>");

        let response = get(&state, "/static/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");

        let response = get(&state, "/workloads/reviews-v3").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let response = get(&state, "/static").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    }

    #[tokio::test]
    async fn missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(FakeSource::default(), dir.path());

        assert_eq!(get(&state, "/").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn parent_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(FakeSource::default(), dir.path());

        let response = get(&state, "/static/../../etc/passwd").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn status_route_matching() {
        assert_eq!(status_route("/api/v1/workloads/reviews-v3/status"), Some("reviews-v3"));
        assert_eq!(status_route("/api/v1/workloads//status"), Some(""));
        assert_eq!(status_route("/api/v1/workloads/a/b/status"), None);
        assert_eq!(status_route("/api/v1/workloads/reviews-v3"), None);
        assert_eq!(status_route("/api/v1/workloadsx/a/status"), None);
    }

    #[test]
    fn relative_file_mapping() {
        assert_eq!(relative_file("/"), Some(PathBuf::from("index.html")));
        assert_eq!(relative_file("/static/app.js"), Some(PathBuf::from("static/app.js")));
        assert_eq!(relative_file("/a/../b"), None);
        assert_eq!(relative_file("/static/.."), None);
    }
}
