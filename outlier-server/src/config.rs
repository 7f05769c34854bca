//! Server settings.
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. `OUTLIER_*` environment variables, `__` separating nested keys
//!    (e.g. `OUTLIER_DEFAULTS__STEP_MINUTES=1`)
//!
//! Command line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use outlier_engine::LabelPolicy;

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "OUTLIER";

/// Top-level server settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Prometheus HTTP API endpoint.
    pub prometheus_url: String,
    /// Directory holding the web UI build.
    pub web_dist_path: PathBuf,
    /// Timeout of a single Prometheus request.
    pub request_timeout_secs: u64,
    /// Margin a window median must exceed the baseline by before it is
    /// labelled `high`. Unset means any excess counts.
    pub high_tolerance: Option<f64>,
    /// Defaults for status query parameters.
    pub defaults: QueryDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            prometheus_url: "http://localhost:9090".to_string(),
            web_dist_path: PathBuf::from("./web-dist"),
            request_timeout_secs: 10,
            high_tolerance: None,
            defaults: QueryDefaults::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, environment())
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(env)
            .build()
            .context("failed to read settings")?;

        config
            .try_deserialize()
            .context("failed to parse settings")
    }

    /// Timeout of a single Prometheus request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Labelling rule for status windows.
    pub fn label_policy(&self) -> LabelPolicy {
        LabelPolicy::from_tolerance(self.high_tolerance)
    }
}

/// Fallbacks for status query parameters, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    /// Width of the reported range when `start` is not given.
    pub lookback_minutes: u64,
    /// History fetched before `start` when `historical` is not given.
    pub historical_minutes: u64,
    /// Window size when `statusStep` is not given.
    pub step_minutes: u64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            lookback_minutes: 60,
            historical_minutes: 15,
            step_minutes: 5,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Environment {
        environment().source(Some(config::Map::new()))
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_sources() {
        let settings = Settings::load_from(None, no_env()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.listen_addr, "0.0.0.0:8080");
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.label_policy(), LabelPolicy::Strict);
        assert_eq!(settings.defaults.historical_minutes, 15);
    }

    #[test]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
prometheus_url = "http://prometheus.istio-system:9090"
high_tolerance = 0.5

[defaults]
step_minutes = 1
"#,
        );

        let settings = Settings::load_from(Some(file.path()), no_env()).unwrap();
        assert_eq!(settings.prometheus_url, "http://prometheus.istio-system:9090");
        assert_eq!(settings.label_policy(), LabelPolicy::ToleranceBand(0.5));
        assert_eq!(settings.defaults.step_minutes, 1);
        assert_eq!(settings.defaults.lookback_minutes, 60);
        assert_eq!(settings.listen_addr, "0.0.0.0:8080");
    }

    #[test]
    fn environment_overrides_file() {
        let file = toml_file("request_timeout_secs = 30\nlisten_addr = \"127.0.0.1:9000\"\n");

        let mut vars = config::Map::new();
        vars.insert("OUTLIER_REQUEST_TIMEOUT_SECS".to_string(), "3".to_string());
        vars.insert("OUTLIER_DEFAULTS__HISTORICAL_MINUTES".to_string(), "30".to_string());
        vars.insert("UNRELATED_VAR".to_string(), "x".to_string());

        let settings =
            Settings::load_from(Some(file.path()), environment().source(Some(vars))).unwrap();
        assert_eq!(settings.request_timeout_secs, 3);
        assert_eq!(settings.defaults.historical_minutes, 30);
        assert_eq!(settings.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load_from(Some(&path), no_env()).is_err());
    }

    #[test]
    fn malformed_value_is_an_error() {
        let file = toml_file("request_timeout_secs = \"soon\"\n");
        assert!(Settings::load_from(Some(file.path()), no_env()).is_err());
    }
}
