//! Construction of the ordered module search path for a project root.
//!
//! The path is assembled from the compiled-output directory, the source
//! directory, the library archives and, for development-tree runs, the
//! platform's own source directory. Building never fails: entries that do
//! not exist are simply left out.

use std::fs;
use std::path::{Path, PathBuf};

/// Compiled-output directory below the project root.
pub const CLASSES_DIR: &str = "classes";
/// Source tree below the project root.
pub const SOURCE_DIR: &str = "src";
/// Test source tree below the project root.
pub const TEST_DIR: &str = "test";
/// Library archive directory below the project root.
pub const LIBRARY_DIR: &str = "lib";
/// File name of the platform runtime archive.
pub const PLATFORM_LIBRARY: &str = "ronin.jar";

const ARCHIVE_SUFFIXES: [&str; 2] = [".jar", ".zip"];

/// A single entry on the module path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModulePathEntry {
    /// Directory of compiled artifacts.
    CompiledOutput(PathBuf),
    /// Directory of source files.
    SourceDirectory(PathBuf),
    /// Library archive.
    Library(PathBuf),
}

impl ModulePathEntry {
    /// Filesystem location of the entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::CompiledOutput(path) | Self::SourceDirectory(path) | Self::Library(path) => path,
        }
    }
}

/// Knobs that vary the module path between modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePathOptions {
    /// Append the `test` tree after `src`.
    pub include_tests: bool,
    /// Platform source directory appended in development-tree runs.
    pub dev_tree: Option<PathBuf>,
    /// Archive name (case-insensitive suffix) that must lead the path.
    pub platform_library: String,
}

impl Default for ModulePathOptions {
    fn default() -> Self {
        Self {
            include_tests: false,
            dev_tree: None,
            platform_library: PLATFORM_LIBRARY.to_owned(),
        }
    }
}

impl ModulePathOptions {
    /// Enables or disables the `test` tree.
    #[must_use]
    pub fn with_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    /// Sets the platform source directory for development-tree runs.
    #[must_use]
    pub fn with_dev_tree(mut self, dev_tree: Option<PathBuf>) -> Self {
        self.dev_tree = dev_tree;
        self
    }
}

/// Ordered module search path; earlier entries shadow later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePath {
    entries: Vec<ModulePathEntry>,
}

impl ModulePath {
    /// Builds the module path for `root`.
    ///
    /// Archives in `lib` are kept in directory order except that any archive
    /// whose name ends with the platform library moves to the very front of
    /// the path, ahead of the compiled output and sources.
    #[must_use]
    pub fn build(root: &Path, options: &ModulePathOptions) -> Self {
        let mut entries = Vec::new();
        if root.is_dir() {
            entries.push(ModulePathEntry::CompiledOutput(root.join(CLASSES_DIR)));
            entries.push(ModulePathEntry::SourceDirectory(root.join(SOURCE_DIR)));
            if options.include_tests {
                entries.push(ModulePathEntry::SourceDirectory(root.join(TEST_DIR)));
            }
            let library_dir = root.join(LIBRARY_DIR);
            if library_dir.is_dir() {
                add_archives(&library_dir, &options.platform_library, &mut entries);
            }
        }
        if let Some(platform_source) = &options.dev_tree {
            entries.push(ModulePathEntry::SourceDirectory(platform_source.clone()));
        }
        Self { entries }
    }

    /// Creates a path from explicit entries.
    #[must_use]
    pub const fn from_entries(entries: Vec<ModulePathEntry>) -> Self {
        Self { entries }
    }

    /// Entries in search order.
    #[must_use]
    pub fn entries(&self) -> &[ModulePathEntry] {
        &self.entries
    }

    /// Source directories in search order.
    pub fn source_directories(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().filter_map(|entry| match entry {
            ModulePathEntry::SourceDirectory(path) => Some(path.as_path()),
            _ => None,
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the path has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn add_archives(library_dir: &Path, platform_library: &str, entries: &mut Vec<ModulePathEntry>) {
    let Ok(listing) = fs::read_dir(library_dir) else {
        return;
    };
    let platform_suffix = platform_library.to_ascii_lowercase();
    for entry in listing.filter_map(Result::ok) {
        let file_name = entry.file_name();
        let lower = file_name.to_string_lossy().to_ascii_lowercase();
        if !ARCHIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
            continue;
        }
        let archive = ModulePathEntry::Library(entry.path());
        if lower.ends_with(&platform_suffix) {
            entries.insert(0, archive);
        } else {
            entries.push(archive);
        }
    }
}
