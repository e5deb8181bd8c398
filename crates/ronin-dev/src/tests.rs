//! Tests for the CLI runner with an injected configuration loader.

use std::ffi::OsString;
use std::fs;
use std::process::ExitCode;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

/// Loader that returns a fixed configuration and records what it was given.
struct StubLoader {
    config: Config,
    seen: std::cell::RefCell<Vec<OsString>>,
}

impl StubLoader {
    fn new(config: Config) -> Self {
        Self {
            config,
            seen: std::cell::RefCell::default(),
        }
    }
}

impl ConfigLoader for StubLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        self.seen.borrow_mut().extend(args.iter().cloned());
        Ok(self.config.clone())
    }
}

struct FailingLoader;

impl ConfigLoader for FailingLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Err(AppError::Output(std::io::Error::other("config unavailable")))
    }
}

struct Captured {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn invoke<L: ConfigLoader>(args: &[&str], loader: &L) -> Captured {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run_with_loader(
        args.iter().map(OsString::from),
        &mut stdout,
        &mut stderr,
        loader,
    );
    Captured {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

#[fixture]
fn project() -> TempDir {
    TempDir::new().expect("project dir")
}

fn root_arg(project: &TempDir) -> String {
    project.path().display().to_string()
}

#[rstest]
fn verify_of_an_empty_project_succeeds(project: TempDir) {
    let root = root_arg(&project);
    let loader = StubLoader::new(Config::default());
    let outcome = invoke(&["ronin", "verify", &root], &loader);

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(outcome.stdout, "0 types verified.\nNo errors found.\n");
}

#[rstest]
fn verify_of_a_broken_project_fails(project: TempDir) {
    let src = project.path().join("src");
    fs::create_dir_all(&src).expect("src dir");
    fs::write(src.join("Bad.gs"), "class Bad {\n").expect("write Bad");
    let root = root_arg(&project);
    let loader = StubLoader::new(Config::default());

    let outcome = invoke(&["ronin", "verify", &root], &loader);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.starts_with("Errors in Bad:\n"), "{}", outcome.stdout);
    assert!(!outcome.stdout.contains("No errors found."));
}

#[rstest]
fn configuration_flags_reach_the_loader(project: TempDir) {
    let root = root_arg(&project);
    let loader = StubLoader::new(Config::default());

    let outcome = invoke(
        &["ronin", "--log-filter", "warn", "--mode=staging", "verify", &root],
        &loader,
    );

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    let seen: Vec<String> = loader
        .seen
        .borrow()
        .iter()
        .map(|argument| argument.to_string_lossy().into_owned())
        .collect();
    assert_eq!(seen, ["ronin", "--log-filter", "warn", "--mode=staging"]);
}

#[test]
fn configuration_failures_are_reported() {
    let outcome = invoke(&["ronin", "verify"], &FailingLoader);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("config unavailable"), "{}", outcome.stderr);
}

#[rstest]
#[case(&["ronin", "frobnicate"])]
#[case(&["ronin", "console", "--port", "22"])]
fn usage_errors_fail(#[case] args: &[&str]) {
    let outcome = invoke(args, &StubLoader::new(Config::default()));

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("Usage"), "{}", outcome.stderr);
}

#[test]
fn help_goes_to_stdout() {
    let outcome = invoke(&["ronin", "--help"], &StubLoader::new(Config::default()));

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("verify"), "{}", outcome.stdout);
    assert!(outcome.stderr.is_empty());
}
