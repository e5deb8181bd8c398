//! Layered configuration for the Ronin development tooling.
//!
//! Values are merged from built-in defaults, a `.ronin.toml` file (or the
//! file named by `--config-path`), `RONIN_*` environment variables and the
//! configuration flags accepted ahead of the CLI command.

mod defaults;
mod logging;
mod mode;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CONSOLE_HOST, DEFAULT_DB_PORT, DEFAULT_HANDLER, DEFAULT_LOG_FILTER,
    DEFAULT_PLATFORM_SOURCE, DEFAULT_PORT, DEFAULT_SSH_COMMAND, DEFAULT_WORKERS,
    default_log_filter, default_log_format, default_mode,
};
pub use logging::{LogFormat, LogFormatParseError, LogSettings};
pub use mode::{RunMode, RunModeParseError};

/// Resolved configuration shared by the orchestrator and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RONIN")]
pub struct Config {
    /// Deployment mode; selects the database location.
    #[serde(default = "defaults::default_mode")]
    #[ortho_config(default = defaults::default_mode())]
    pub mode: RunMode,
    /// Flag handed to the dynamically constructed request handler.
    #[serde(default = "defaults::enabled")]
    #[ortho_config(default = true)]
    pub dev_mode: bool,
    /// Resolve the resource root as the parent of the web root instead of
    /// `<web root>/WEB-INF`.
    #[serde(default = "defaults::enabled")]
    #[ortho_config(default = true)]
    pub dev_layout: bool,
    /// Run against the platform's own source tree.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub dev_tree: bool,
    /// Platform source directory appended to the module path in dev-tree runs.
    #[serde(default = "defaults::default_platform_source")]
    #[ortho_config(default = defaults::default_platform_source())]
    pub platform_source: String,
    /// Registry key of the request handler constructed on first request.
    #[serde(default = "defaults::default_handler")]
    #[ortho_config(default = defaults::default_handler())]
    pub handler: String,
    /// HTTP port of the web container.
    #[serde(default = "defaults::default_port")]
    #[ortho_config(default = defaults::DEFAULT_PORT)]
    pub port: u16,
    /// Number of web container worker threads.
    #[serde(default = "defaults::default_workers")]
    #[ortho_config(default = defaults::DEFAULT_WORKERS)]
    pub workers: usize,
    /// Port handed to the database server command.
    #[serde(default = "defaults::default_db_port")]
    #[ortho_config(default = defaults::DEFAULT_DB_PORT)]
    pub db_port: u16,
    /// Database server command line; empty when no server process is needed.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub db_command: String,
    /// Command that receives schema DDL on stdin when seeding.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub db_init_command: String,
    /// External test runner command line.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub test_command: String,
    /// Host the administrative console connects to.
    #[serde(default = "defaults::default_console_host")]
    #[ortho_config(default = defaults::default_console_host())]
    pub console_host: String,
    /// Client program used for the administrative console.
    #[serde(default = "defaults::default_ssh_command")]
    #[ortho_config(default = defaults::default_ssh_command())]
    pub ssh_command: String,
    /// Tracing filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: defaults::default_mode(),
            dev_mode: true,
            dev_layout: true,
            dev_tree: false,
            platform_source: defaults::default_platform_source(),
            handler: defaults::default_handler(),
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
            db_port: DEFAULT_DB_PORT,
            db_command: String::new(),
            db_init_command: String::new(),
            test_command: String::new(),
            console_host: defaults::default_console_host(),
            ssh_command: defaults::default_ssh_command(),
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Filter, format and mode handed to telemetry.
    #[must_use]
    pub fn log_settings(&self) -> LogSettings {
        LogSettings::new(self.log_filter.as_str(), self.log_format, self.mode)
    }

    /// Deployment mode.
    #[must_use]
    pub const fn mode(&self) -> RunMode {
        self.mode
    }

    /// Returns a copy of the configuration running in `mode`.
    #[must_use]
    pub fn with_mode(&self, mode: RunMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Database server command split into program and arguments.
    #[must_use]
    pub fn db_command_line(&self) -> Vec<String> {
        split_command(&self.db_command)
    }

    /// Schema seeding command split into program and arguments.
    #[must_use]
    pub fn db_init_command_line(&self) -> Vec<String> {
        split_command(&self.db_init_command)
    }

    /// Test runner command split into program and arguments.
    #[must_use]
    pub fn test_command_line(&self) -> Vec<String> {
        split_command(&self.test_command)
    }
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}
