use std::env;

use camino::Utf8PathBuf;

use crate::endpoint::ServiceEndpoint;
use crate::logging::LogFormat;

/// Host the worker binds to when launched locally.
pub const DEFAULT_SERVICE_HOST: &str = "localhost";

/// Port the worker listens on when launched locally.
pub const DEFAULT_SERVICE_PORT: u16 = 5000;

/// Route accepting transformation requests.
pub const DEFAULT_SERVICE_PATH: &str = "/process_code";

/// Directory, next to the executable, holding the worker sources.
pub const DEFAULT_WORKER_DIR_NAME: &str = "python-server";

/// Script launched inside the worker directory.
pub const DEFAULT_WORKER_ENTRY: &str = "app.py";

/// Bound on establishing a connection to the worker.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Bound on a full request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Bound on waiting for a freshly spawned worker to accept connections.
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 10_000;

/// Language identifier of the documents the worker understands.
pub const DEFAULT_LANGUAGE: &str = "python";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Endpoint of a worker started with its own defaults.
#[must_use]
pub fn default_service_endpoint() -> ServiceEndpoint {
    ServiceEndpoint::http(
        DEFAULT_SERVICE_HOST,
        DEFAULT_SERVICE_PORT,
        DEFAULT_SERVICE_PATH,
    )
}

/// Interpreter used to launch the worker entry point.
#[must_use]
pub fn default_worker_program() -> String {
    if cfg!(windows) {
        String::from("python")
    } else {
        String::from("python3")
    }
}

/// Script launched inside the worker directory.
#[must_use]
pub fn default_worker_entry() -> String {
    DEFAULT_WORKER_ENTRY.to_owned()
}

/// Language identifier of the documents the worker understands.
#[must_use]
pub fn default_language() -> String {
    DEFAULT_LANGUAGE.to_owned()
}

/// Resolves the worker directory bundled next to the running executable.
///
/// Falls back to a path relative to the current directory when the
/// executable location cannot be expressed as UTF-8.
#[must_use]
pub fn default_worker_dir() -> Utf8PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(std::path::Path::to_path_buf))
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .map_or_else(
            || Utf8PathBuf::from(DEFAULT_WORKER_DIR_NAME),
            |dir| dir.join(DEFAULT_WORKER_DIR_NAME),
        )
}
