//! Discovery of verification candidates in a project's source trees.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::module_path::{SOURCE_DIR, TEST_DIR};
use crate::name::{ModuleName, SourceKind};

/// A module name provided by more than one source file.
///
/// The files may sit in different trees (`src/Foo.gs` and `test/Foo.gs`) or
/// in the same one (`src/Foo.gs` next to `src/Foo.gst`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    name: ModuleName,
    kept: Origin,
    ignored: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Origin {
    tree: &'static str,
    path: PathBuf,
}

impl NameCollision {
    /// Colliding name.
    #[must_use]
    pub const fn name(&self) -> &ModuleName {
        &self.name
    }

    /// File that provides the module.
    #[must_use]
    pub fn kept(&self) -> &Path {
        &self.kept.path
    }

    /// Source tree (`src` or `test`) of [`NameCollision::kept`].
    #[must_use]
    pub const fn kept_tree(&self) -> &'static str {
        self.kept.tree
    }

    /// File shadowed by [`NameCollision::kept`].
    #[must_use]
    pub fn ignored(&self) -> &Path {
        &self.ignored.path
    }

    /// Source tree (`src` or `test`) of [`NameCollision::ignored`].
    #[must_use]
    pub const fn ignored_tree(&self) -> &'static str {
        self.ignored.tree
    }

    /// Returns `true` when both files live in the same source tree.
    #[must_use]
    pub fn within_one_tree(&self) -> bool {
        self.kept.tree == self.ignored.tree
    }

    /// One-line description used in warnings.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.within_one_tree() {
            format!(
                "module {} has more than one source file in {}",
                self.name, self.kept.tree
            )
        } else {
            format!(
                "module {} is defined in both {} and {}",
                self.name, self.kept.tree, self.ignored.tree
            )
        }
    }
}

/// Deduplicated, sorted module names found in `src` and `test`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    names: BTreeMap<ModuleName, Origin>,
    collisions: Vec<NameCollision>,
}

impl Candidates {
    /// Names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &ModuleName> {
        self.names.keys()
    }

    /// Source file a name was found in.
    #[must_use]
    pub fn source_of(&self, name: &ModuleName) -> Option<&Path> {
        self.names.get(name).map(|origin| origin.path.as_path())
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` when no candidates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names provided by more than one file.
    #[must_use]
    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }

    /// Consumes the set, returning its collisions.
    #[must_use]
    pub fn into_collisions(self) -> Vec<NameCollision> {
        self.collisions
    }

    fn insert(&mut self, name: ModuleName, tree: &'static str, path: PathBuf) {
        let origin = Origin { tree, path };
        if let Some(kept) = self.names.get(&name) {
            self.collisions.push(NameCollision {
                name,
                kept: kept.clone(),
                ignored: origin,
            });
            return;
        }
        self.names.insert(name, origin);
    }
}

/// Finds every class, enhancement and template below `root/src` and
/// `root/test`. A name provided by several files is kept once: `src` wins
/// over `test`, matching module path order, and within a tree the first
/// file in path order wins.
#[must_use]
pub fn discover_candidates(root: &Path) -> Candidates {
    let mut candidates = Candidates::default();
    for tree in [SOURCE_DIR, TEST_DIR] {
        for (name, path) in discover_tree(&root.join(tree)) {
            candidates.insert(name, tree, path);
        }
    }
    for collision in &candidates.collisions {
        tracing::warn!(
            target: "ronin_modules::verify",
            event = "module_name_collision",
            module = %collision.name,
            kept = %collision.kept().display(),
            ignored = %collision.ignored().display(),
            "{}",
            collision.describe()
        );
    }
    candidates
}

/// Module names and files below a single source tree, in path order.
#[must_use]
pub fn discover_tree(tree: &Path) -> Vec<(ModuleName, PathBuf)> {
    if !tree.is_dir() {
        return Vec::new();
    }
    WalkDir::new(tree)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.path();
            SourceKind::from_path(&path)?;
            let relative = path.strip_prefix(tree).ok()?;
            let name = ModuleName::from_relative_path(relative)?;
            Some((name, path))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::write_file;
    use rstest::rstest;
    use tempfile::TempDir;

    fn only_collision(project: &TempDir) -> NameCollision {
        let candidates = discover_candidates(project.path());
        assert_eq!(candidates.len(), 1);
        candidates
            .collisions()
            .first()
            .cloned()
            .expect("one collision")
    }

    #[test]
    fn sibling_files_collide_within_one_tree() {
        let project = TempDir::new().expect("create temp dir");
        write_file(project.path(), "src/Foo.gs", "class Foo {}\n");
        write_file(project.path(), "src/Foo.gst", "hello\n");

        let collision = only_collision(&project);

        assert!(collision.within_one_tree());
        assert_eq!(collision.kept_tree(), SOURCE_DIR);
        assert_eq!(collision.ignored_tree(), SOURCE_DIR);
        assert_eq!(collision.describe(), "module Foo has more than one source file in src");
    }

    #[rstest]
    #[case("src/Foo.gs", "test/Foo.gs")]
    #[case("src/Foo.gst", "test/Foo.gsx")]
    fn source_tree_wins_over_test_tree(#[case] kept: &str, #[case] ignored: &str) {
        let project = TempDir::new().expect("create temp dir");
        write_file(project.path(), kept, "class Foo {}\n");
        write_file(project.path(), ignored, "class Foo {}\n");

        let collision = only_collision(&project);

        assert!(!collision.within_one_tree());
        assert_eq!(collision.kept(), project.path().join(kept));
        assert_eq!(collision.ignored(), project.path().join(ignored));
        assert_eq!(collision.describe(), "module Foo is defined in both src and test");
    }
}
