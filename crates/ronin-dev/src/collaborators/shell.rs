//! Administrative console client.

use std::process::{Command, Stdio};

use ronin_config::Config;
use tracing::info;

use super::{RemoteShell, launch_error};
use crate::errors::CollaboratorError;

/// Where and as whom to open the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSession {
    /// Host running the application.
    pub host: String,
    /// Console port.
    pub port: u16,
    /// Account name; the client prompts for the password.
    pub user: String,
}

/// Console opened through an ssh client with inherited stdio.
#[derive(Debug, Clone)]
pub struct SshShell {
    program: String,
}

impl SshShell {
    /// Shell using the configured client program.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.ssh_command.clone(),
        }
    }

    fn arguments(session: &ConsoleSession) -> Vec<String> {
        vec![
            String::from("-p"),
            session.port.to_string(),
            String::from("-l"),
            session.user.clone(),
            session.host.clone(),
        ]
    }
}

impl RemoteShell for SshShell {
    fn open(&mut self, session: &ConsoleSession) -> Result<bool, CollaboratorError> {
        info!(
            target: "ronin_dev::console",
            event = "console_opening",
            host = %session.host,
            port = session.port,
            user = %session.user,
            "connecting to admin console"
        );
        let status = Command::new(&self.program)
            .args(Self::arguments(session))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(launch_error(&self.program))?;
        Ok(status.success())
    }
}
