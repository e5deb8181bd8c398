//! Keeps `serve` alive until the developer stops it.
//!
//! Ctrl-C, a closed terminal, `kill` and Ctrl-\ all stop the application the
//! same way: `serve` returns from [`ShutdownSignal::wait`] and tears down the
//! web container before the database.

use std::io;

use ronin_config::RunMode;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use signal_hook::low_level::signal_name;
use thiserror::Error;
use tracing::info;

const SHUTDOWN_TARGET: &str = "ronin_dev::shutdown";

const STOP_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

/// Blocks a running application until it should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the application should stop.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the listener cannot be installed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The signal handlers could not be registered.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Waits for one of the terminal's stop signals.
#[derive(Debug, Clone, Copy)]
pub struct SystemShutdownSignal {
    mode: RunMode,
}

impl SystemShutdownSignal {
    /// Listener for an application running in `mode`.
    #[must_use]
    pub const fn new(mode: RunMode) -> Self {
        Self { mode }
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(STOP_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(
                target: SHUTDOWN_TARGET,
                event = "shutdown_signal",
                signal = describe(signal),
                mode = %self.mode,
                "stopping the Ronin app in {} mode",
                self.mode
            );
        }
        Ok(())
    }
}

fn describe(signal: i32) -> &'static str {
    signal_name(signal).unwrap_or("unknown signal")
}
