//! Diagnostic logging for `ronin` runs.
//!
//! Logs go to stderr so they never mix with command output such as the
//! verification report. Every event emitted while a command runs sits inside
//! a `ronin_command` span carrying the command keyword and the run mode.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Span, Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use ronin_config::{LogFormat, LogSettings, RunMode};

const TELEMETRY_TARGET: &str = "ronin_dev::telemetry";

static INSTALLED: OnceCell<RunMode> = OnceCell::new();

/// Proof that the global subscriber is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    mode: RunMode,
}

impl TelemetryHandle {
    /// Mode the subscriber was installed for.
    #[must_use]
    pub const fn mode(self) -> RunMode {
        self.mode
    }

    /// Opens the span that wraps one command.
    #[must_use]
    pub fn command_span(self, command: &'static str) -> Span {
        tracing::info_span!("ronin_command", command, mode = %self.mode)
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured `log_filter` does not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another subscriber already owns the process.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// A process runs one command, so the first settings win; later calls hand
/// back a handle for the mode that was installed.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter does not parse or another
/// subscriber was installed first.
pub fn initialise(settings: &LogSettings) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            install_subscriber(settings)?;
            tracing::debug!(
                target: TELEMETRY_TARGET,
                event = "telemetry_installed",
                mode = %settings.mode(),
                format = %settings.format(),
                filter = settings.filter(),
                "telemetry installed"
            );
            Ok(settings.mode())
        })
        .map(|&mode| TelemetryHandle { mode })
}

fn parse_filter(settings: &LogSettings) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(settings.filter()).map_err(|error| TelemetryError::Filter(error.to_string()))
}

fn install_subscriber(settings: &LogSettings) -> Result<(), TelemetryError> {
    let filter = parse_filter(settings)?;
    let ansi = !settings.format().is_structured() && io::stderr().is_terminal();

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.format() {
        LogFormat::Json => Box::new(
            builder
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .finish(),
        ),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ronin=notalevel")]
    #[case("ronin_dev=verbose")]
    fn rejects_malformed_filters(#[case] filter: &str) {
        let settings = LogSettings::new(filter, LogFormat::Compact, RunMode::Dev);
        let error = parse_filter(&settings).expect_err("filter must be rejected");
        assert!(matches!(error, TelemetryError::Filter(_)), "got {error:?}");
    }

    #[test]
    fn accepts_per_crate_directives() {
        let settings = LogSettings::new(
            "info,ronin_modules::noise=warn",
            LogFormat::Json,
            RunMode::Test,
        );
        assert!(parse_filter(&settings).is_ok());
    }

    #[test]
    fn handle_reports_its_mode() {
        let handle = TelemetryHandle {
            mode: RunMode::Test,
        };
        assert_eq!(handle.mode(), RunMode::Test);
    }
}
