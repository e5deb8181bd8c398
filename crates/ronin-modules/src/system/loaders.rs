use std::path::Path;

use crate::noise::NoiseChannel;
use crate::schema::SchemaLoader;

use super::AuxiliaryLoader;

/// Auxiliary loaders the bootstrapper can install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    /// Database schema types synthesised from `src/db/*.ddl`.
    Schema,
}

/// Ordered selection of auxiliary loaders for a bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliaryLoaders {
    kinds: Vec<LoaderKind>,
}

impl AuxiliaryLoaders {
    /// No auxiliary loaders.
    #[must_use]
    pub const fn none() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Explicit loader order.
    #[must_use]
    pub const fn from_kinds(kinds: Vec<LoaderKind>) -> Self {
        Self { kinds }
    }

    /// Loaders for the given execution mode. Development-tree runs see the
    /// schema types; packaged runs get them from the platform itself.
    #[must_use]
    pub fn for_dev_tree(dev_tree: bool) -> Self {
        if dev_tree {
            Self::from_kinds(vec![LoaderKind::Schema])
        } else {
            Self::none()
        }
    }

    /// Selected kinds in installation order.
    #[must_use]
    pub fn kinds(&self) -> &[LoaderKind] {
        &self.kinds
    }

    /// Builds the loaders for a project rooted at `root`.
    #[must_use]
    pub fn instantiate(&self, root: &Path, noise: &NoiseChannel) -> Vec<Box<dyn AuxiliaryLoader>> {
        self.kinds
            .iter()
            .map(|kind| match kind {
                LoaderKind::Schema => {
                    Box::new(SchemaLoader::load(root, noise)) as Box<dyn AuxiliaryLoader>
                }
            })
            .collect()
    }
}
