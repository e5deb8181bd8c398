use crate::logging::LogFormat;
use crate::mode::RunMode;

/// Default HTTP port for the development web container.
pub const DEFAULT_PORT: u16 = 8080;

/// Default TCP port handed to the database server.
pub const DEFAULT_DB_PORT: u16 = 9092;

/// Default number of web container worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Registry key of the platform request handler.
pub const DEFAULT_HANDLER: &str = "ronin.RoninHandler";

/// Platform source directory appended to the module path in dev-tree runs.
pub const DEFAULT_PLATFORM_SOURCE: &str = "../ronin/src";

/// Host the administrative console connects to.
pub const DEFAULT_CONSOLE_HOST: &str = "localhost";

/// Client program used for the administrative console.
pub const DEFAULT_SSH_COMMAND: &str = "ssh";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default deployment mode.
#[must_use]
pub const fn default_mode() -> RunMode {
    RunMode::Dev
}

/// Owned handler key.
#[must_use]
pub fn default_handler() -> String {
    DEFAULT_HANDLER.to_owned()
}

/// Owned platform source directory.
#[must_use]
pub fn default_platform_source() -> String {
    DEFAULT_PLATFORM_SOURCE.to_owned()
}

/// Owned console host.
#[must_use]
pub fn default_console_host() -> String {
    DEFAULT_CONSOLE_HOST.to_owned()
}

/// Owned console client program.
#[must_use]
pub fn default_ssh_command() -> String {
    DEFAULT_SSH_COMMAND.to_owned()
}

/// Serde default for boolean switches that start enabled.
#[must_use]
pub const fn enabled() -> bool {
    true
}

/// Serde default for the HTTP port.
#[must_use]
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Serde default for the database port.
#[must_use]
pub const fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

/// Serde default for the worker count.
#[must_use]
pub const fn default_workers() -> usize {
    DEFAULT_WORKERS
}
