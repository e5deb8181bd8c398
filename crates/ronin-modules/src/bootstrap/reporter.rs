//! Structured reporting of bootstrap and handler lifecycle events.

use std::path::Path;
use std::sync::Arc;

use crate::handler::HandlerError;

use super::BootstrapError;

const REPORTER_TARGET: &str = "ronin_modules::bootstrap";

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait BootstrapReporter: Send + Sync {
    /// Invoked inside the exclusive section before initialisation begins.
    fn bootstrap_starting(&self, root: &Path);

    /// Invoked after the module system has been published.
    fn bootstrap_succeeded(&self, root: &Path, path_entries: usize);

    /// Invoked when initialisation fails.
    fn bootstrap_failed(&self, root: &Path, error: &BootstrapError);

    /// Invoked after the request handler has been constructed and initialised.
    fn handler_ready(&self, handler: &str);

    /// Invoked when handler construction or initialisation fails.
    fn handler_failed(&self, handler: &str, error: &HandlerError);
}

impl<T> BootstrapReporter for Arc<T>
where
    T: BootstrapReporter,
{
    fn bootstrap_starting(&self, root: &Path) {
        (**self).bootstrap_starting(root);
    }

    fn bootstrap_succeeded(&self, root: &Path, path_entries: usize) {
        (**self).bootstrap_succeeded(root, path_entries);
    }

    fn bootstrap_failed(&self, root: &Path, error: &BootstrapError) {
        (**self).bootstrap_failed(root, error);
    }

    fn handler_ready(&self, handler: &str) {
        (**self).handler_ready(handler);
    }

    fn handler_failed(&self, handler: &str, error: &HandlerError) {
        (**self).handler_failed(handler, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredReporter;

impl StructuredReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BootstrapReporter for StructuredReporter {
    fn bootstrap_starting(&self, root: &Path) {
        tracing::debug!(
            target: REPORTER_TARGET,
            event = "bootstrap_starting",
            root = %root.display(),
            "initialising module system"
        );
    }

    fn bootstrap_succeeded(&self, root: &Path, path_entries: usize) {
        tracing::info!(
            target: REPORTER_TARGET,
            event = "bootstrap_succeeded",
            root = %root.display(),
            path_entries,
            "module system ready"
        );
    }

    fn bootstrap_failed(&self, root: &Path, error: &BootstrapError) {
        tracing::error!(
            target: REPORTER_TARGET,
            event = "bootstrap_failed",
            root = %root.display(),
            error = %error,
            "module system initialisation failed"
        );
    }

    fn handler_ready(&self, handler: &str) {
        tracing::info!(
            target: REPORTER_TARGET,
            event = "handler_ready",
            handler,
            "request handler constructed"
        );
    }

    fn handler_failed(&self, handler: &str, error: &HandlerError) {
        tracing::error!(
            target: REPORTER_TARGET,
            event = "handler_failed",
            handler,
            error = %error,
            "request handler construction failed"
        );
    }
}
