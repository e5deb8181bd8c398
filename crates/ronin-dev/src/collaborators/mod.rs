//! External services the orchestrator drives.
//!
//! Each collaborator sits behind a small trait so the orchestrator can be
//! exercised with doubles; the implementations here are deliberately thin
//! wrappers over files, processes and an HTTP listener.

mod database;
mod shell;
mod test_runner;
mod web;

use std::path::Path;
use std::sync::Arc;

use ronin_config::Config;
use ronin_modules::DeferredHandler;

use crate::errors::CollaboratorError;
use crate::shutdown::{ShutdownSignal, SystemShutdownSignal};

pub use self::database::{FileDatabase, METADATA_MARKER, SEED_FILE};
pub use self::shell::{ConsoleSession, SshShell};
pub use self::test_runner::{CommandTestRunner, SuiteKind, TestSuite};
pub use self::web::{TinyHttpContainer, WEB_ROOT_DIR};

/// The application database.
pub trait Database: Send {
    /// Starts the database, seeding it first if it has never been seeded.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] when seeding or the server fails.
    fn start(&mut self) -> Result<(), CollaboratorError>;

    /// Drops all data and seeds the database from the project schema.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] when the storage cannot be rebuilt.
    fn reset(&mut self) -> Result<(), CollaboratorError>;

    /// Stops anything [`Database::start`] launched.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] when the server cannot be stopped.
    fn stop(&mut self) -> Result<(), CollaboratorError>;
}

/// HTTP front end that forwards every request to a deferred handler.
pub trait WebContainer: Send {
    /// Starts listening on `port`, serving `web_root` through `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] when the listener cannot be bound.
    fn start(
        &mut self,
        port: u16,
        web_root: &Path,
        handler: Arc<DeferredHandler>,
    ) -> Result<(), CollaboratorError>;

    /// Stops accepting requests and waits for the listener to exit.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] when the listener thread failed.
    fn stop(&mut self) -> Result<(), CollaboratorError>;
}

/// External test runner.
pub trait TestRunner: Send {
    /// Runs `suite`, returning `true` when every test passed.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] when the runner cannot be launched.
    fn run(&mut self, suite: &TestSuite) -> Result<bool, CollaboratorError>;
}

/// Remote administrative shell of a running application.
pub trait RemoteShell: Send {
    /// Runs an interactive session, returning `true` on a clean exit.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] when the client cannot be launched.
    fn open(&mut self, session: &ConsoleSession) -> Result<bool, CollaboratorError>;
}

/// Everything the orchestrator needs from the outside world.
pub struct Collaborators {
    /// Application database.
    pub database: Box<dyn Database>,
    /// HTTP front end.
    pub web: Box<dyn WebContainer>,
    /// External test runner.
    pub tests: Box<dyn TestRunner>,
    /// Administrative console client.
    pub shell: Box<dyn RemoteShell>,
    /// Blocks `serve` until the process is asked to stop.
    pub shutdown: Box<dyn ShutdownSignal>,
}

impl Collaborators {
    /// Real collaborators for a project rooted at `root`.
    #[must_use]
    pub fn system(config: &Config, root: &Path) -> Self {
        Self {
            database: Box::new(FileDatabase::new(root, config)),
            web: Box::new(TinyHttpContainer::new(config.workers)),
            tests: Box::new(CommandTestRunner::new(config)),
            shell: Box::new(SshShell::new(config)),
            shutdown: Box::new(SystemShutdownSignal::new(config.mode())),
        }
    }
}

/// Maps a failure to start `program` into [`CollaboratorError::Launch`].
fn launch_error(program: &str) -> impl FnOnce(std::io::Error) -> CollaboratorError + '_ {
    move |source| CollaboratorError::Launch {
        program: program.to_owned(),
        source,
    }
}
