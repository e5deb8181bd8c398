//! Error types surfaced by the `ronin` CLI.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use ronin_modules::{BootstrapError, HandlerError};
use thiserror::Error;

use crate::shutdown::ShutdownError;
use crate::telemetry::TelemetryError;

/// Failures reported by the database, web container, test runner and remote
/// shell collaborators.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// A required command line is empty in the configuration.
    #[error("no {setting} is configured; set it in .ronin.toml or RONIN_{}", .setting.to_uppercase())]
    NotConfigured {
        /// Configuration key that is missing.
        setting: &'static str,
    },
    /// An external program could not be started.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// An external program exited unsuccessfully where success is required.
    #[error("'{program}' exited with status {status:?}")]
    CommandFailed {
        /// Program that failed.
        program: String,
        /// Exit status, when the program was not killed by a signal.
        status: Option<i32>,
    },
    /// A file or directory operation failed.
    #[error("failed to {action} {}: {source}", .path.display())]
    Filesystem {
        /// What was being attempted.
        action: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The HTTP listener could not be bound.
    #[error("failed to listen on port {port}: {message}")]
    Bind {
        /// Requested port.
        port: u16,
        /// Error reported by the HTTP server.
        message: String,
    },
    /// The worker pool could not be created.
    #[error("failed to start web container workers: {0}")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the module system: {0}")]
    Bootstrap(#[from] BootstrapError),
    #[error("failed to register request handlers: {0}")]
    Handlers(#[from] HandlerError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("failed to wait for shutdown: {0}")]
    Shutdown(#[from] ShutdownError),
    #[error("failed to write command output: {0}")]
    Output(#[source] io::Error),
}
