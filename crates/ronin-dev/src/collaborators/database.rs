//! File-backed development database.
//!
//! Each run mode owns a storage directory below `runtime/db`. Seeding feeds
//! the project's first `src/db/**/*.ddl` schema either to the configured
//! init command or into the storage itself, then drops a marker so later
//! starts leave the data alone.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use jwalk::WalkDir;
use ronin_config::{Config, RunMode};
use ronin_modules::schema::{SCHEMA_DIR, SCHEMA_EXTENSION};
use tracing::{info, warn};

use super::{Database, launch_error};
use crate::errors::CollaboratorError;

/// Marker written once the storage has been seeded.
pub const METADATA_MARKER: &str = "ronin_metadata";

/// Copy of the schema kept in the storage when no init command is set.
pub const SEED_FILE: &str = "schema.ddl";

const DATABASE_TARGET: &str = "ronin_dev::database";

/// Database stored under `<root>/runtime/db/<mode>`.
#[derive(Debug)]
pub struct FileDatabase {
    root: PathBuf,
    mode: RunMode,
    storage: PathBuf,
    port: u16,
    server_command: Vec<String>,
    init_command: Vec<String>,
    server: Option<Child>,
}

impl FileDatabase {
    /// Database for the project at `root` in the configured mode.
    #[must_use]
    pub fn new(root: &Path, config: &Config) -> Self {
        let mode = config.mode();
        Self {
            root: root.to_path_buf(),
            mode,
            storage: root.join(mode.database_location()),
            port: config.db_port,
            server_command: config.db_command_line(),
            init_command: config.db_init_command_line(),
            server: None,
        }
    }

    /// Storage directory of this mode.
    #[must_use]
    pub fn storage(&self) -> &Path {
        &self.storage
    }

    /// Connection URL handed to external commands.
    #[must_use]
    pub fn url(&self) -> String {
        format!("file:{}", self.storage.display())
    }

    /// Returns `true` once the storage has been seeded.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.storage.join(METADATA_MARKER).is_file()
    }

    /// First schema file below `src/db`, in sorted walk order.
    #[must_use]
    pub fn initial_schema(&self) -> Option<PathBuf> {
        let schema_root = self.root.join(SCHEMA_DIR);
        if !schema_root.is_dir() {
            return None;
        }
        WalkDir::new(schema_root)
            .sort(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path())
            .find(|path| {
                path.extension()
                    .is_some_and(|extension| extension.eq_ignore_ascii_case(SCHEMA_EXTENSION))
            })
    }

    fn ensure_storage(&self) -> Result<(), CollaboratorError> {
        fs::create_dir_all(&self.storage).map_err(|source| CollaboratorError::Filesystem {
            action: "create",
            path: self.storage.clone(),
            source,
        })
    }

    fn seed(&self) -> Result<(), CollaboratorError> {
        let Some(schema) = self.initial_schema() else {
            info!(
                target: DATABASE_TARGET,
                event = "schema_missing",
                root = %self.root.display(),
                "no initial schema found; the database will be empty"
            );
            return Ok(());
        };

        info!(
            target: DATABASE_TARGET,
            event = "seeding",
            schema = %schema.display(),
            "creating database from {}",
            schema.display()
        );
        let ddl = fs::read_to_string(&schema).map_err(|source| CollaboratorError::Filesystem {
            action: "read",
            path: schema.clone(),
            source,
        })?;

        if self.init_command.is_empty() {
            let seed = self.storage.join(SEED_FILE);
            fs::write(&seed, &ddl).map_err(|source| CollaboratorError::Filesystem {
                action: "write",
                path: seed,
                source,
            })?;
        } else {
            self.run_init_command(&ddl)?;
        }

        let marker = self.storage.join(METADATA_MARKER);
        fs::write(&marker, format!("mode={}\n", self.mode)).map_err(|source| {
            CollaboratorError::Filesystem {
                action: "write",
                path: marker,
                source,
            }
        })
    }

    fn run_init_command(&self, ddl: &str) -> Result<(), CollaboratorError> {
        let Some(mut command) = self.command(&self.init_command) else {
            return Ok(());
        };
        let program = self.init_command.first().cloned().unwrap_or_default();
        let mut child = command
            .stdin(Stdio::piped())
            .spawn()
            .map_err(launch_error(&program))?;
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(ddl.as_bytes()) {
                // The command may exit without reading; its status decides.
                Err(error) if error.kind() != io::ErrorKind::BrokenPipe => {
                    return Err(launch_error(&program)(error));
                }
                _ => {}
            }
        }
        let status = child.wait().map_err(launch_error(&program))?;
        if status.success() {
            Ok(())
        } else {
            Err(CollaboratorError::CommandFailed {
                program,
                status: status.code(),
            })
        }
    }

    fn command(&self, line: &[String]) -> Option<Command> {
        let (program, arguments) = line.split_first()?;
        let mut command = Command::new(program);
        command
            .args(arguments.iter().map(|argument| self.expand(argument)))
            .current_dir(&self.root);
        Some(command)
    }

    fn expand(&self, argument: &str) -> String {
        argument
            .replace("{storage}", &self.storage.display().to_string())
            .replace("{port}", &self.port.to_string())
            .replace("{url}", &self.url())
    }
}

impl Database for FileDatabase {
    fn start(&mut self) -> Result<(), CollaboratorError> {
        self.ensure_storage()?;
        if !self.is_seeded() {
            self.seed()?;
        }
        if self.server.is_none() {
            if let Some(mut command) = self.command(&self.server_command) {
                let program = self.server_command.first().cloned().unwrap_or_default();
                self.server = Some(command.spawn().map_err(launch_error(&program))?);
            }
        }
        info!(
            target: DATABASE_TARGET,
            event = "database_started",
            mode = %self.mode,
            url = %self.url(),
            port = self.port,
            "database started at {}",
            self.url()
        );
        Ok(())
    }

    fn reset(&mut self) -> Result<(), CollaboratorError> {
        if self.storage.exists() {
            info!(
                target: DATABASE_TARGET,
                event = "dropping",
                storage = %self.storage.display(),
                "dropping all user tables"
            );
            fs::remove_dir_all(&self.storage).map_err(|source| CollaboratorError::Filesystem {
                action: "remove",
                path: self.storage.clone(),
                source,
            })?;
        }
        self.ensure_storage()?;
        self.seed()
    }

    fn stop(&mut self) -> Result<(), CollaboratorError> {
        let Some(mut server) = self.server.take() else {
            return Ok(());
        };
        if let Err(error) = server.kill() {
            warn!(
                target: DATABASE_TARGET,
                event = "stop_failed",
                %error,
                "database server did not accept the stop request"
            );
        }
        server
            .wait()
            .map(|_| ())
            .map_err(|source| CollaboratorError::Filesystem {
                action: "wait for",
                path: self.storage.clone(),
                source,
            })
    }
}

impl Drop for FileDatabase {
    fn drop(&mut self) {
        if self.server.is_some() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn project() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("src/db/nested")).expect("schema dirs");
        fs::write(dir.path().join("src/db/b.ddl"), "CREATE TABLE B (id INT);").expect("b");
        fs::write(dir.path().join("src/db/a.ddl"), "CREATE TABLE A (id INT);").expect("a");
        dir
    }

    fn database(root: &Path, config: &Config) -> FileDatabase {
        FileDatabase::new(root, config)
    }

    fn seeded_schema(database: &FileDatabase) -> String {
        fs::read_to_string(database.storage().join(SEED_FILE)).expect("seed file")
    }

    #[rstest]
    fn storage_follows_the_mode(project: TempDir) {
        let config = Config::default().with_mode(RunMode::Test);
        let db = database(project.path(), &config);
        assert_eq!(db.storage(), project.path().join("runtime/db/testdb"));
    }

    #[rstest]
    fn start_seeds_from_the_first_schema(project: TempDir) {
        let mut db = database(project.path(), &Config::default());
        db.start().expect("start");
        assert!(db.is_seeded());
        assert_eq!(seeded_schema(&db), "CREATE TABLE A (id INT);");
    }

    #[rstest]
    fn start_keeps_seeded_data(project: TempDir) {
        let mut db = database(project.path(), &Config::default());
        db.start().expect("first start");
        fs::write(db.storage().join("rows"), "kept").expect("data");
        db.start().expect("second start");
        assert!(db.storage().join("rows").is_file());
    }

    #[rstest]
    fn reset_drops_and_reseeds(project: TempDir) {
        let mut db = database(project.path(), &Config::default());
        db.start().expect("start");
        fs::write(db.storage().join("rows"), "dropped").expect("data");
        db.reset().expect("reset");
        assert!(!db.storage().join("rows").exists());
        assert!(db.is_seeded());
    }

    #[test]
    fn missing_schema_leaves_the_database_unseeded() {
        let dir = TempDir::new().expect("temp dir");
        let mut db = database(dir.path(), &Config::default());
        db.reset().expect("reset");
        assert!(db.storage().is_dir());
        assert!(!db.is_seeded());
    }

    #[rstest]
    fn placeholders_are_expanded(project: TempDir) {
        let config = Config {
            db_port: 9100,
            ..Config::default()
        };
        let db = database(project.path(), &config);
        assert_eq!(db.expand("--tcp-port={port}"), "--tcp-port=9100");
        assert_eq!(db.expand("{url}"), db.url());
    }

    #[cfg(unix)]
    #[rstest]
    fn failing_init_command_is_reported(project: TempDir) {
        let config = Config {
            db_init_command: String::from("false"),
            ..Config::default()
        };
        let mut db = database(project.path(), &config);
        let error = db.reset().expect_err("init command fails");
        assert!(
            matches!(error, CollaboratorError::CommandFailed { ref program, .. } if program == "false"),
            "got {error:?}"
        );
        assert!(!db.is_seeded());
    }

    #[test]
    fn unknown_server_command_fails_to_launch() {
        let dir = TempDir::new().expect("temp dir");
        let config = Config {
            db_command: String::from("ronin-no-such-database-server"),
            ..Config::default()
        };
        let mut db = database(dir.path(), &config);
        let error = db.start().expect_err("server cannot start");
        assert!(matches!(error, CollaboratorError::Launch { .. }), "got {error:?}");
    }
}
