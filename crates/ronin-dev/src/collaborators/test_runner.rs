//! External test runner driven through a configured command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use ronin_config::Config;
use ronin_modules::ModuleName;
use ronin_modules::module_path::TEST_DIR;
use ronin_modules::verify::discover_tree;
use tracing::info;

use super::{TestRunner, launch_error};
use crate::errors::CollaboratorError;

const TEST_TARGET: &str = "ronin_dev::test";

/// Which tests a suite selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteKind {
    /// Modules whose simple name ends in `Test`, except UI tests.
    Unit,
    /// Modules whose simple name ends in `UITest`.
    Ui,
}

impl SuiteKind {
    /// Returns `true` when `name` belongs to this suite.
    #[must_use]
    pub fn selects(self, name: &ModuleName) -> bool {
        let simple = name.simple_name();
        let ui = simple.ends_with("UITest");
        match self {
            Self::Unit => simple.ends_with("Test") && !ui,
            Self::Ui => ui,
        }
    }
}

/// A set of test modules and how to run them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    /// Which tests were selected.
    pub kind: SuiteKind,
    /// Project root.
    pub root: PathBuf,
    /// Selected modules, sorted.
    pub modules: Vec<ModuleName>,
    /// Stop at the first failure.
    pub fail_fast: bool,
    /// Report passing tests too.
    pub verbose: bool,
    /// Port of the application under test, for UI suites.
    pub port: Option<u16>,
}

impl TestSuite {
    /// Selects the `kind` tests below `<root>/test`.
    #[must_use]
    pub fn discover(kind: SuiteKind, root: &Path) -> Self {
        let mut modules: Vec<ModuleName> = discover_tree(&root.join(TEST_DIR))
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| kind.selects(name))
            .collect();
        modules.sort();
        modules.dedup();
        Self {
            kind,
            root: root.to_path_buf(),
            modules,
            fail_fast: false,
            verbose: false,
            port: None,
        }
    }

    /// Sets the fail-fast and verbosity switches.
    #[must_use]
    pub const fn with_flags(mut self, fail_fast: bool, verbose: bool) -> Self {
        self.fail_fast = fail_fast;
        self.verbose = verbose;
        self
    }

    /// Sets the port of the application under test.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Runs `test_command` with the selected module names as arguments.
///
/// The command runs in the project root with `RONIN_MODE=test`,
/// `RONIN_TEST_FAIL_FAST`, `RONIN_TEST_VERBOSE` and, for UI suites,
/// `RONIN_TEST_PORT` set.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    command_line: Vec<String>,
}

impl CommandTestRunner {
    /// Runner for the configured test command.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            command_line: config.test_command_line(),
        }
    }

    fn command(&self, suite: &TestSuite) -> Result<(String, Command), CollaboratorError> {
        let (program, arguments) =
            self.command_line
                .split_first()
                .ok_or(CollaboratorError::NotConfigured {
                    setting: "test_command",
                })?;
        let mut command = Command::new(program);
        command
            .args(arguments)
            .args(suite.modules.iter().map(ModuleName::as_str))
            .current_dir(&suite.root)
            .env("RONIN_MODE", "test")
            .env("RONIN_TEST_FAIL_FAST", suite.fail_fast.to_string())
            .env("RONIN_TEST_VERBOSE", suite.verbose.to_string());
        if let Some(port) = suite.port {
            command.env("RONIN_TEST_PORT", port.to_string());
        }
        Ok((program.clone(), command))
    }
}

impl TestRunner for CommandTestRunner {
    fn run(&mut self, suite: &TestSuite) -> Result<bool, CollaboratorError> {
        let (program, mut command) = self.command(suite)?;
        info!(
            target: TEST_TARGET,
            event = "tests_starting",
            kind = ?suite.kind,
            modules = suite.modules.len(),
            "running tests..."
        );
        let status = command.status().map_err(launch_error(&program))?;
        info!(
            target: TEST_TARGET,
            event = "tests_finished",
            success = status.success(),
            code = ?status.code(),
            "tests finished"
        );
        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    fn name(raw: &str) -> ModuleName {
        ModuleName::parse(raw).expect("valid name")
    }

    #[rstest]
    #[case("app.UserTest", SuiteKind::Unit, true)]
    #[case("app.LoginUITest", SuiteKind::Unit, false)]
    #[case("app.LoginUITest", SuiteKind::Ui, true)]
    #[case("app.TestData", SuiteKind::Unit, false)]
    #[case("app.UserTest", SuiteKind::Ui, false)]
    fn suites_select_by_suffix(#[case] raw: &str, #[case] kind: SuiteKind, #[case] expected: bool) {
        assert_eq!(kind.selects(&name(raw)), expected);
    }

    #[test]
    fn discovers_test_modules_in_order() {
        let project = TempDir::new().expect("project");
        let tests = project.path().join("test/app");
        fs::create_dir_all(&tests).expect("test tree");
        for file in ["ZooTest.gs", "AppTest.gs", "Helper.gs", "HomeUITest.gs"] {
            fs::write(tests.join(file), "").expect("test file");
        }

        let unit = TestSuite::discover(SuiteKind::Unit, project.path());
        assert_eq!(unit.modules, vec![name("app.AppTest"), name("app.ZooTest")]);

        let ui = TestSuite::discover(SuiteKind::Ui, project.path());
        assert_eq!(ui.modules, vec![name("app.HomeUITest")]);
    }

    #[test]
    fn missing_command_is_reported() {
        let project = TempDir::new().expect("project");
        let mut runner = CommandTestRunner::new(&Config::default());
        let suite = TestSuite::discover(SuiteKind::Unit, project.path());
        let error = runner.run(&suite).expect_err("no command configured");
        assert!(
            matches!(error, CollaboratorError::NotConfigured { setting: "test_command" }),
            "got {error:?}"
        );
    }

    #[cfg(unix)]
    #[rstest]
    #[case("true", true)]
    #[case("false", false)]
    fn exit_status_decides_the_outcome(#[case] program: &str, #[case] expected: bool) {
        let project = TempDir::new().expect("project");
        let config = Config {
            test_command: program.to_owned(),
            ..Config::default()
        };
        let mut runner = CommandTestRunner::new(&config);
        let suite = TestSuite::discover(SuiteKind::Unit, project.path()).with_port(8181);
        assert_eq!(runner.run(&suite).expect("runner launches"), expected);
    }
}
