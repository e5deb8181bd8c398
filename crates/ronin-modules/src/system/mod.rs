//! The module system: resolution of dotted names to parsed modules.
//!
//! [`SourceModuleSystem`] searches auxiliary loaders first, in installation
//! order, and then the module path, where earlier entries shadow later ones.
//! Parsed source modules are cached alongside the modification time of the
//! file they came from, so editing a file is picked up by the next
//! resolution without restarting the process.

mod loaders;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use crate::bootstrap::BootstrapError;
use crate::module::{Module, ModuleBody, ModuleOrigin, OrdinaryModule, OtherModule, TemplateModule};
use crate::module_path::{ModulePath, ModulePathEntry};
use crate::name::{ModuleName, SourceKind};
use crate::noise::NoiseChannel;
use crate::parser::{ParserOptions, SourceParser};

pub use self::loaders::{AuxiliaryLoaders, LoaderKind};

/// Extension of compiled artifacts in the compiled-output directory.
pub const COMPILED_EXTENSION: &str = "class";

/// Resolves module names against a module path.
pub trait ModuleSystem: Send + Sync {
    /// Resolves `name`, returning `None` when nothing on the path provides it.
    fn resolve(&self, name: &ModuleName) -> Option<Arc<Module>>;

    /// Installs an auxiliary loader after any already installed.
    fn install_loader(&self, loader: Box<dyn AuxiliaryLoader>);

    /// Names of installed auxiliary loaders in consultation order.
    fn loader_names(&self) -> Vec<String>;

    /// Path the system searches.
    fn module_path(&self) -> &ModulePath;

    /// Channel the system reports diagnostics on.
    fn noise(&self) -> &NoiseChannel;
}

/// Additional source of modules consulted before the module path.
pub trait AuxiliaryLoader: Send + Sync {
    /// Name used in diagnostics and module origins.
    fn name(&self) -> &str;

    /// Resolves `name`, returning `None` when this loader does not provide it.
    fn resolve(&self, name: &ModuleName) -> Option<Module>;
}

/// Creates the process-wide module system during bootstrap.
pub trait ModuleSystemFactory: Send + Sync {
    /// Builds a module system over `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when the system cannot be brought up.
    fn initialize(
        &self,
        path: ModulePath,
        noise: NoiseChannel,
    ) -> Result<Arc<dyn ModuleSystem>, BootstrapError>;
}

/// Factory for [`SourceModuleSystem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceModuleSystemFactory {
    options: ParserOptions,
}

impl SourceModuleSystemFactory {
    /// Creates a factory whose systems parse with `options`.
    #[must_use]
    pub const fn new(options: ParserOptions) -> Self {
        Self { options }
    }
}

impl ModuleSystemFactory for SourceModuleSystemFactory {
    fn initialize(
        &self,
        path: ModulePath,
        noise: NoiseChannel,
    ) -> Result<Arc<dyn ModuleSystem>, BootstrapError> {
        for directory in path.source_directories() {
            if !directory.exists() {
                continue;
            }
            if let Err(source) = fs::read_dir(directory) {
                return Err(BootstrapError::UnreadableSource {
                    path: directory.to_path_buf(),
                    source: Arc::new(source),
                });
            }
        }
        let system = SourceModuleSystem::new(path, noise, SourceParser::new(self.options));
        Ok(Arc::new(system))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Source(PathBuf, SourceKind),
    Compiled(PathBuf),
}

impl Location {
    fn path(&self) -> &Path {
        match self {
            Self::Source(path, _) | Self::Compiled(path) => path,
        }
    }
}

struct CachedModule {
    location: PathBuf,
    modified: Option<SystemTime>,
    module: Arc<Module>,
}

/// Hot-reloading module system backed by source directories.
pub struct SourceModuleSystem {
    path: ModulePath,
    noise: NoiseChannel,
    parser: SourceParser,
    loaders: RwLock<Vec<Box<dyn AuxiliaryLoader>>>,
    cache: RwLock<HashMap<ModuleName, CachedModule>>,
}

impl SourceModuleSystem {
    /// Creates a system over `path`.
    #[must_use]
    pub fn new(path: ModulePath, noise: NoiseChannel, parser: SourceParser) -> Self {
        for entry in path.entries() {
            if let ModulePathEntry::Library(archive) = entry {
                noise.emit(&format!(
                    "library {} is on the module path but its contents are not indexed",
                    archive.display()
                ));
            }
        }
        Self {
            path,
            noise,
            parser,
            loaders: RwLock::new(Vec::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Drops any cached parse of `name`.
    pub fn invalidate(&self, name: &ModuleName) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    /// Number of cached modules.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn resolve_auxiliary(&self, name: &ModuleName) -> Option<Module> {
        self.loaders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find_map(|loader| loader.resolve(name))
    }

    fn locate(&self, name: &ModuleName) -> Option<Location> {
        self.path.entries().iter().find_map(|entry| match entry {
            ModulePathEntry::CompiledOutput(directory) => {
                let candidate = directory.join(name.relative_path(COMPILED_EXTENSION));
                candidate.is_file().then_some(Location::Compiled(candidate))
            }
            ModulePathEntry::SourceDirectory(directory) => SourceKind::ALL.iter().find_map(|kind| {
                let candidate = directory.join(name.relative_path(kind.extension()));
                candidate
                    .is_file()
                    .then(|| Location::Source(candidate, *kind))
            }),
            ModulePathEntry::Library(_) => None,
        })
    }

    fn cached(
        &self,
        name: &ModuleName,
        location: &Path,
        modified: Option<SystemTime>,
    ) -> Option<Arc<Module>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.get(name)?;
        (entry.location == location && entry.modified == modified && modified.is_some())
            .then(|| Arc::clone(&entry.module))
    }

    fn load(&self, name: &ModuleName, location: &Location) -> Option<Module> {
        match location {
            Location::Compiled(path) => {
                let body = match fs::metadata(path) {
                    Ok(metadata) if metadata.len() == 0 => {
                        OtherModule::invalid("compiled artifact is empty")
                    }
                    Ok(_) => OtherModule::valid(),
                    Err(error) => OtherModule::invalid(format!("cannot inspect artifact: {error}")),
                };
                Some(Module::new(
                    name.clone(),
                    ModuleOrigin::Compiled(path.clone()),
                    ModuleBody::Other(body),
                ))
            }
            Location::Source(path, kind) => {
                let source = match fs::read_to_string(path) {
                    Ok(source) => source,
                    Err(error) => {
                        self.noise
                            .emit(&format!("cannot read {}: {error}", path.display()));
                        return None;
                    }
                };
                let body = self.parse(name, *kind, &source);
                Some(Module::new(
                    name.clone(),
                    ModuleOrigin::Source(path.clone()),
                    body,
                ))
            }
        }
    }

    fn parse(&self, name: &ModuleName, kind: SourceKind, source: &str) -> ModuleBody {
        match kind {
            SourceKind::Class | SourceKind::Enhancement => {
                let feedback = self.parser.parse_type(source, name, kind).err();
                ModuleBody::Ordinary(OrdinaryModule::new(kind, feedback))
            }
            SourceKind::Template => {
                let (generator, feedback) = self.parser.parse_template(source);
                ModuleBody::Template(TemplateModule::new(generator, feedback))
            }
        }
    }
}

impl ModuleSystem for SourceModuleSystem {
    fn resolve(&self, name: &ModuleName) -> Option<Arc<Module>> {
        if let Some(module) = self.resolve_auxiliary(name) {
            return Some(Arc::new(module));
        }
        let location = self.locate(name)?;
        let modified = fs::metadata(location.path())
            .and_then(|metadata| metadata.modified())
            .ok();
        if let Some(module) = self.cached(name, location.path(), modified) {
            return Some(module);
        }
        let module = Arc::new(self.load(name, &location)?);
        tracing::debug!(
            target: "ronin_modules::system",
            event = "module_parsed",
            module = %name,
            kind = %module.kind(),
            valid = module.is_valid(),
            "parsed module"
        );
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.clone(),
                CachedModule {
                    location: location.path().to_path_buf(),
                    modified,
                    module: Arc::clone(&module),
                },
            );
        Some(module)
    }

    fn install_loader(&self, loader: Box<dyn AuxiliaryLoader>) {
        tracing::debug!(
            target: "ronin_modules::system",
            event = "loader_installed",
            loader = loader.name(),
            "installed auxiliary loader"
        );
        self.loaders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(loader);
    }

    fn loader_names(&self) -> Vec<String> {
        self.loaders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|loader| loader.name().to_owned())
            .collect()
    }

    fn module_path(&self) -> &ModulePath {
        &self.path
    }

    fn noise(&self) -> &NoiseChannel {
        &self.noise
    }
}
