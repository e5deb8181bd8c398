//! Entrypoint for the `ronin` development tool.
//!
//! All work happens in [`ronin_dev::run`]; the binary only locks the
//! standard streams and hands over the process arguments.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    ronin_dev::run(std::env::args_os(), &mut stdout, &mut stderr)
}
