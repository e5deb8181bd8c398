//! Command dispatch: maps each CLI command onto the module system and the
//! collaborators.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use ronin_config::Config;
use ronin_modules::{
    AuxiliaryLoaders, BootstrapRequest, Bootstrapper, DeferredHandler, HandlerRegistry,
    HandlerSettings, ModulePathOptions, SourceModuleSystemFactory, StructuredReporter, Verifier,
};
use tracing::info;

use crate::cli::{Command, TestFlags};
use crate::collaborators::{Collaborators, ConsoleSession, SuiteKind, TestSuite, WEB_ROOT_DIR};
use crate::errors::AppError;

const ORCHESTRATOR_TARGET: &str = "ronin_dev::orchestrator";

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    const fn from_success(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => Self::SUCCESS,
            Outcome::Failure => Self::FAILURE,
        }
    }
}

pub(crate) struct Orchestrator {
    config: Config,
    collaborators: Collaborators,
    bootstrapper: Arc<Bootstrapper>,
    registry: Arc<HandlerRegistry>,
}

impl Orchestrator {
    pub(crate) fn new(
        config: Config,
        collaborators: Collaborators,
        registry: HandlerRegistry,
    ) -> Self {
        let bootstrapper = Bootstrapper::new(
            SourceModuleSystemFactory::default(),
            Arc::new(StructuredReporter::new()),
        );
        Self {
            config,
            collaborators,
            bootstrapper: Arc::new(bootstrapper),
            registry: Arc::new(registry),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_bootstrapper(mut self, bootstrapper: Arc<Bootstrapper>) -> Self {
        self.bootstrapper = bootstrapper;
        self
    }

    #[cfg(test)]
    pub(crate) fn bootstrapper(&self) -> &Bootstrapper {
        &self.bootstrapper
    }

    pub(crate) fn execute<W: Write>(
        &mut self,
        command: &Command,
        stdout: &mut W,
    ) -> Result<Outcome, AppError> {
        info!(
            target: ORCHESTRATOR_TARGET,
            event = "command_starting",
            command = command.keyword(),
            mode = %self.config.mode(),
            "running {}",
            command.keyword()
        );
        match command {
            Command::Serve {
                port,
                no_db,
                project,
            } => self.serve(port.unwrap_or(self.config.port), *no_db, &project.root),
            Command::ResetDb { .. } => self.reset_db(),
            Command::Verify { project } => self.verify(&project.root, stdout),
            Command::Test { flags, project } => self.test(*flags, &project.root),
            Command::UiTest {
                port,
                flags,
                project,
            } => self.ui_test(port.unwrap_or(self.config.port), *flags, &project.root),
            Command::Console { port, user } => self.console(*port, user),
        }
    }

    fn path_options(&self, root: &Path) -> ModulePathOptions {
        let dev_tree = self
            .config
            .dev_tree
            .then(|| root.join(&self.config.platform_source));
        ModulePathOptions::default().with_dev_tree(dev_tree)
    }

    fn loaders(&self) -> AuxiliaryLoaders {
        AuxiliaryLoaders::for_dev_tree(self.config.dev_tree)
    }

    fn deferred_handler(&self, root: &Path) -> Arc<DeferredHandler> {
        let settings = HandlerSettings {
            handler: self.config.handler.clone(),
            dev_mode: self.config.dev_mode,
            dev_layout: self.config.dev_layout,
            path: self.path_options(root),
            loaders: self.loaders(),
        };
        Arc::new(DeferredHandler::new(
            Arc::clone(&self.bootstrapper),
            Arc::clone(&self.registry),
            settings,
        ))
    }

    fn serve(&mut self, port: u16, no_db: bool, root: &Path) -> Result<Outcome, AppError> {
        if !no_db {
            self.collaborators.database.start()?;
        }
        let handler = self.deferred_handler(root);
        if let Err(error) = self
            .collaborators
            .web
            .start(port, &root.join(WEB_ROOT_DIR), handler)
        {
            if !no_db {
                self.stop_database_quietly();
            }
            return Err(error.into());
        }
        info!(
            target: "ronin_dev::serve",
            event = "listening",
            port,
            "Your Ronin app is listening at http://localhost:{port}"
        );

        let waited = self.collaborators.shutdown.wait();
        let stopped = self.collaborators.web.stop();
        let closed = if no_db {
            Ok(())
        } else {
            self.collaborators.database.stop()
        };
        waited?;
        stopped?;
        closed?;
        Ok(Outcome::Success)
    }

    fn stop_database_quietly(&mut self) {
        if let Err(error) = self.collaborators.database.stop() {
            tracing::warn!(
                target: ORCHESTRATOR_TARGET,
                event = "database_stop_failed",
                %error,
                "failed to stop the database"
            );
        }
    }

    fn reset_db(&mut self) -> Result<Outcome, AppError> {
        self.collaborators.database.reset()?;
        Ok(Outcome::Success)
    }

    fn verify<W: Write>(&self, root: &Path, stdout: &mut W) -> Result<Outcome, AppError> {
        info!(
            target: ORCHESTRATOR_TARGET,
            event = "verifying",
            root = %root.display(),
            "verifying app..."
        );
        let report = Verifier::new(Arc::clone(&self.bootstrapper))
            .with_path_options(self.path_options(root))
            .with_loaders(self.loaders())
            .verify(root)?;

        writeln!(stdout, "{report}").map_err(AppError::Output)?;
        if report.errors_found() {
            return Ok(Outcome::Failure);
        }
        writeln!(stdout, "No errors found.").map_err(AppError::Output)?;
        Ok(Outcome::Success)
    }

    fn test(&mut self, flags: TestFlags, root: &Path) -> Result<Outcome, AppError> {
        self.prepare_test_database()?;
        let request = BootstrapRequest::new(root)
            .with_path_options(self.path_options(root).with_tests(true))
            .with_loaders(self.loaders());
        let run = self
            .bootstrapper
            .ensure_ready(&request)
            .map_err(AppError::from)
            .and_then(|_| {
                let suite = TestSuite::discover(SuiteKind::Unit, root)
                    .with_flags(flags.fail_fast, flags.verbose);
                Ok(self.collaborators.tests.run(&suite)?)
            });
        let closed = self.collaborators.database.stop();
        let passed = run?;
        closed?;
        Ok(Outcome::from_success(passed))
    }

    fn ui_test(&mut self, port: u16, flags: TestFlags, root: &Path) -> Result<Outcome, AppError> {
        self.prepare_test_database()?;
        let handler = self.deferred_handler(root);
        let run = self
            .collaborators
            .web
            .start(port, &root.join(WEB_ROOT_DIR), handler)
            .and_then(|()| {
                let suite = TestSuite::discover(SuiteKind::Ui, root)
                    .with_flags(flags.fail_fast, flags.verbose)
                    .with_port(port);
                self.collaborators.tests.run(&suite)
            });
        let stopped = self.collaborators.web.stop();
        let closed = self.collaborators.database.stop();
        let passed = run?;
        stopped?;
        closed?;
        Ok(Outcome::from_success(passed))
    }

    fn prepare_test_database(&mut self) -> Result<(), AppError> {
        self.collaborators.database.reset()?;
        self.collaborators.database.start()?;
        Ok(())
    }

    fn console(&mut self, port: u16, user: &str) -> Result<Outcome, AppError> {
        let session = ConsoleSession {
            host: self.config.console_host.clone(),
            port,
            user: user.to_owned(),
        };
        let clean = self.collaborators.shell.open(&session)?;
        if !clean {
            tracing::error!(
                target: ORCHESTRATOR_TARGET,
                event = "console_failed",
                host = %session.host,
                port,
                "error connecting to admin console"
            );
        }
        Ok(Outcome::from_success(clean))
    }
}
