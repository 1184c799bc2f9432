//! Shared configuration for the `pytransform` client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a
//! `pytransform.toml` file, then `PYTRANSFORM_*` environment variables, then
//! command-line flags. The same [`Config`] drives the worker launch, the HTTP
//! client bounds and telemetry.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_LANGUAGE, DEFAULT_LOG_FILTER,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVICE_HOST, DEFAULT_SERVICE_PATH,
    DEFAULT_SERVICE_PORT, DEFAULT_STARTUP_TIMEOUT_MS, DEFAULT_WORKER_DIR_NAME,
    DEFAULT_WORKER_ENTRY, default_language, default_log_filter, default_log_filter_string,
    default_log_format, default_service_endpoint, default_worker_dir, default_worker_entry,
    default_worker_program,
};
pub use endpoint::{EndpointParseError, ServiceEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration for the client and the worker it supervises.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "PYTRANSFORM",
    discovery(
        app_name = "pytransform",
        env_var = "PYTRANSFORM_CONFIG_PATH",
        config_file_name = "pytransform.toml",
        dotfile_name = ".pytransform.toml",
        project_file_name = "pytransform.toml",
        config_cli_long = "config-path",
        config_cli_visible = true,
    )
)]
pub struct Config {
    /// URL of the worker's transformation route.
    #[ortho_config(default = default_service_endpoint())]
    pub service_url: ServiceEndpoint,
    /// Directory containing the worker entry point and its dependencies.
    #[ortho_config(default = default_worker_dir())]
    pub worker_dir: Utf8PathBuf,
    /// Interpreter or executable used to launch the worker.
    #[ortho_config(default = default_worker_program())]
    pub worker_program: String,
    /// Entry point, relative to `worker_dir`, passed to `worker_program`.
    #[ortho_config(default = default_worker_entry())]
    pub worker_entry: String,
    /// Connection bound in milliseconds.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,
    /// Request/response bound in milliseconds.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,
    /// Bound on waiting for a freshly spawned worker, in milliseconds.
    #[ortho_config(default = DEFAULT_STARTUP_TIMEOUT_MS)]
    pub startup_timeout_ms: u64,
    /// Starts the worker as soon as an interactive session opens.
    #[ortho_config(default = false)]
    pub auto_start: bool,
    /// Language identifier accepted by the transform commands.
    #[ortho_config(default = default_language())]
    pub language: String,
    /// Tracing filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Tracing output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: default_service_endpoint(),
            worker_dir: default_worker_dir(),
            worker_program: default_worker_program(),
            worker_entry: default_worker_entry(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
            auto_start: false,
            language: default_language(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Worker endpoint.
    #[must_use]
    pub const fn service_url(&self) -> &ServiceEndpoint {
        &self.service_url
    }

    /// Worker directory.
    #[must_use]
    pub fn worker_dir(&self) -> &camino::Utf8Path {
        self.worker_dir.as_path()
    }

    /// Worker executable.
    #[must_use]
    pub fn worker_program(&self) -> &str {
        &self.worker_program
    }

    /// Worker entry point, relative to [`Self::worker_dir`].
    #[must_use]
    pub fn worker_entry(&self) -> &str {
        &self.worker_entry
    }

    /// Connection bound.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Request/response bound.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Startup readiness bound.
    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    /// Whether interactive sessions launch the worker eagerly.
    #[must_use]
    pub const fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Language identifier accepted by the transform commands.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Tracing output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_worker_dir_ends_with_bundle_name() {
        let config = Config::default();
        assert!(config.worker_dir().ends_with(DEFAULT_WORKER_DIR_NAME));
    }

    #[test]
    fn timeouts_convert_from_milliseconds() {
        let config = Config {
            connect_timeout_ms: 250,
            request_timeout_ms: 1_500,
            startup_timeout_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Duration::from_millis(1_500));
        assert_eq!(config.startup_timeout(), Duration::ZERO);
    }

    #[test]
    fn default_program_matches_platform() {
        let program = default_worker_program();
        if cfg!(windows) {
            assert_eq!(program, "python");
        } else {
            assert_eq!(program, "python3");
        }
    }
}
