//! Development orchestrator for Ronin projects.
//!
//! The `ronin` binary serves a project with a lazily constructed request
//! handler, resets its database, verifies every module, runs unit and UI
//! tests, and opens the administrative console of a running application.
//! Argument parsing, configuration and logging live here so the binary can
//! stay a thin wrapper and tests can drive [`run`] with in-memory streams.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use ronin_config::{Config, RunMode};
use ronin_modules::HandlerRegistry;
use tracing::info;

mod cli;
pub mod collaborators;
mod config;
mod errors;
pub mod handlers;
mod orchestrator;
pub mod shutdown;
pub mod telemetry;

use cli::{Cli, Command};
use config::{command_arguments, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use errors::AppError;
pub use errors::CollaboratorError;
use orchestrator::Orchestrator;

use collaborators::Collaborators;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the flag-settable fields of
/// `ronin_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &["--config-path", "--log-filter", "--log-format", "--mode"];

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
}

impl<'a, W, E, L> CliRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L) -> Self {
        Self { io, loader }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let result = Cli::try_parse_from(command_arguments(&args, &split))
            .map_err(AppError::CliUsage)
            .and_then(|cli| {
                self.loader
                    .load(&split.config_arguments)
                    .map(|config| (cli.into_command(), config))
            })
            .and_then(|(command, config)| self.dispatch(&command, config));

        match result {
            Ok(exit_code) => exit_code,
            Err(AppError::CliUsage(error)) if !error.use_stderr() => {
                let _ = write!(self.io.stdout, "{error}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }

    fn dispatch(&mut self, command: &Command, config: Config) -> Result<ExitCode, AppError> {
        let config = if command.forces_test_mode() {
            config.with_mode(RunMode::Test)
        } else {
            config
        };
        let logging = telemetry::initialise(&config.log_settings())?;
        let _span = logging.command_span(command.keyword()).entered();
        info!(
            target: "ronin_dev::config",
            event = "config_loaded",
            mode = %config.mode(),
            port = config.port,
            handler = %config.handler,
            dev_mode = config.dev_mode,
            dev_tree = config.dev_tree,
            "config loaded"
        );

        let root = command.root().unwrap_or_else(|| Path::new("."));
        let collaborators = Collaborators::system(&config, root);
        let mut registry = HandlerRegistry::new();
        handlers::register_builtin(&mut registry)?;

        Orchestrator::new(config, collaborators, registry)
            .execute(command, &mut *self.io.stdout)
            .map(ExitCode::from)
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let mut io = IoStreams::new(stdout, stderr);
    CliRunner::new(&mut io, loader).run(args)
}

#[cfg(test)]
mod tests;
