//! Command-line surface of the `ronin` tool.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ronin",
    about = "Development server, verifier and test driver for Ronin projects",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// What to do; `serve` on the current directory when omitted.
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

impl Cli {
    /// Selected command, falling back to serving the current directory.
    pub(crate) fn into_command(self) -> Command {
        self.command.unwrap_or_else(|| Command::Serve {
            port: None,
            no_db: false,
            project: ProjectArg::default(),
        })
    }
}

/// Project root positional shared by the project-scoped commands.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProjectArg {
    /// Project root directory.
    #[arg(value_name = "ROOT", default_value = ".")]
    pub(crate) root: PathBuf,
}

impl Default for ProjectArg {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Switches shared by the test commands.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TestFlags {
    /// Stop at the first failing test.
    #[arg(long)]
    pub(crate) fail_fast: bool,
    /// Report every test, not only failures.
    #[arg(long)]
    pub(crate) verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Starts the database and serves the project over HTTP until
    /// interrupted.
    Serve {
        /// HTTP port; defaults to the configured port.
        #[arg(long)]
        port: Option<u16>,
        /// Do not start the database.
        #[arg(long)]
        no_db: bool,
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Drops the database and seeds it from the project schema.
    ResetDb {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Checks every module of the project and reports the invalid ones.
    Verify {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Runs the project's unit tests against a fresh test database.
    Test {
        #[command(flatten)]
        flags: TestFlags,
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Serves the project and runs its UI tests against it.
    UiTest {
        /// HTTP port the UI tests drive; defaults to the configured port.
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        flags: TestFlags,
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Opens the administrative console of a running application.
    Console {
        /// Console port.
        #[arg(long)]
        port: u16,
        /// Account to log in as.
        #[arg(long)]
        user: String,
    },
}

impl Command {
    /// Project root the command operates on, if it has one.
    pub(crate) fn root(&self) -> Option<&Path> {
        match self {
            Self::Serve { project, .. }
            | Self::ResetDb { project }
            | Self::Verify { project }
            | Self::Test { project, .. }
            | Self::UiTest { project, .. } => Some(&project.root),
            Self::Console { .. } => None,
        }
    }

    /// Test commands always run against the test database.
    pub(crate) const fn forces_test_mode(&self) -> bool {
        matches!(self, Self::Test { .. } | Self::UiTest { .. })
    }

    /// Keyword used in log events.
    pub(crate) const fn keyword(&self) -> &'static str {
        match self {
            Self::Serve { .. } => "serve",
            Self::ResetDb { .. } => "reset-db",
            Self::Verify { .. } => "verify",
            Self::Test { .. } => "test",
            Self::UiTest { .. } => "ui-test",
            Self::Console { .. } => "console",
        }
    }
}
