//! Auxiliary loader exposing database tables as modules.
//!
//! Every `CREATE TABLE` statement in the project's `src/db/*.ddl` files
//! becomes a module named `db.<ddl file stem>.<table>`. Tables that declare
//! no columns, or the same column twice, resolve as invalid modules.

mod ddl;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::module::{Module, ModuleBody, ModuleOrigin, OtherModule};
use crate::name::ModuleName;
use crate::noise::NoiseChannel;
use crate::system::AuxiliaryLoader;

pub use self::ddl::{TableDefinition, parse_tables};

/// Directory below the project root holding schema files.
pub const SCHEMA_DIR: &str = "src/db";
/// Extension of schema files.
pub const SCHEMA_EXTENSION: &str = "ddl";
/// Name of the loader as it appears in module origins.
pub const SCHEMA_LOADER: &str = "schema";

/// Loader over the tables declared in a project's schema files.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    tables: BTreeMap<ModuleName, TableDefinition>,
}

impl SchemaLoader {
    /// Reads every schema file below `root`. Unreadable files are reported on
    /// `noise` and skipped.
    #[must_use]
    pub fn load(root: &Path, noise: &NoiseChannel) -> Self {
        let mut loader = Self::default();
        for file in schema_files(&root.join(SCHEMA_DIR)) {
            let Some(stem) = file.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match fs::read_to_string(&file) {
                Ok(contents) => loader.add_schema(stem, &contents),
                Err(error) => {
                    noise.emit(&format!("cannot read schema {}: {error}", file.display()));
                }
            }
        }
        loader
    }

    /// Adds the tables of one schema file named `stem`.
    pub fn add_schema(&mut self, stem: &str, contents: &str) {
        for table in parse_tables(contents) {
            let qualified = format!("db.{stem}.{}", table.name());
            if let Some(name) = ModuleName::parse(&qualified) {
                self.tables.insert(name, table);
            }
        }
    }

    /// Names of every table module, sorted.
    pub fn module_names(&self) -> impl Iterator<Item = &ModuleName> {
        self.tables.keys()
    }
}

impl AuxiliaryLoader for SchemaLoader {
    fn name(&self) -> &str {
        SCHEMA_LOADER
    }

    fn resolve(&self, name: &ModuleName) -> Option<Module> {
        let table = self.tables.get(name)?;
        Some(Module::new(
            name.clone(),
            ModuleOrigin::Loader(SCHEMA_LOADER.to_owned()),
            ModuleBody::Other(validate(table)),
        ))
    }
}

/// Schema files directly inside `directory`, sorted by path.
#[must_use]
pub fn schema_files(directory: &Path) -> Vec<PathBuf> {
    let Ok(listing) = fs::read_dir(directory) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = listing
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|extension| extension.eq_ignore_ascii_case(SCHEMA_EXTENSION))
        })
        .collect();
    files.sort();
    files
}

fn validate(table: &TableDefinition) -> OtherModule {
    if table.columns().is_empty() {
        return OtherModule::invalid(format!("table '{}' declares no columns", table.name()));
    }
    let mut seen = HashSet::new();
    for column in table.columns() {
        if !seen.insert(column.to_ascii_lowercase()) {
            return OtherModule::invalid(format!(
                "column '{column}' is declared more than once in table '{}'",
                table.name()
            ));
        }
    }
    OtherModule::valid()
}
