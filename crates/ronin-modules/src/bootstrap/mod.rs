//! Thread-safe, once-only initialisation of the module system.
//!
//! The [`Bootstrapper`] owns the process-wide module system. Any number of
//! threads may call [`Bootstrapper::ensure_ready`]; exactly one of them runs
//! initialisation while the rest wait on the exclusive section and then
//! observe the published system. Readiness is published only after the
//! module system and its auxiliary loaders are fully in place, and a failed
//! or aborted initialisation leaves the state `Uninitialized` so the next
//! caller retries.

mod reporter;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use thiserror::Error;

use crate::module_path::{ModulePath, ModulePathOptions};
use crate::noise::NoiseChannel;
use crate::system::{AuxiliaryLoaders, ModuleSystem, ModuleSystemFactory};

pub use self::reporter::{BootstrapReporter, StructuredReporter};

/// Errors raised while bringing up the module system.
#[derive(Debug, Clone, Error)]
pub enum BootstrapError {
    /// A source directory on the module path exists but cannot be listed.
    #[error("module source directory {} cannot be listed: {source}", .path.display())]
    UnreadableSource {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The module system factory refused to initialise.
    #[error("module system initialisation failed: {message}")]
    Initialise {
        /// Human-readable failure description.
        message: String,
    },
}

/// Lifecycle of the process-wide module system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Not yet initialised, or the last attempt failed.
    Uninitialized,
    /// A caller is inside the exclusive section initialising.
    Initializing,
    /// The module system is published and usable.
    Ready,
}

impl BootstrapState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Initializing => 1,
            Self::Ready => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Initializing,
            2 => Self::Ready,
            _ => Self::Uninitialized,
        }
    }
}

/// Inputs to one bootstrap attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapRequest {
    root: PathBuf,
    path: ModulePathOptions,
    loaders: AuxiliaryLoaders,
}

impl BootstrapRequest {
    /// Request for the project rooted at `root` with default options.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            path: ModulePathOptions::default(),
            loaders: AuxiliaryLoaders::none(),
        }
    }

    /// Overrides the module path options.
    #[must_use]
    pub fn with_path_options(mut self, path: ModulePathOptions) -> Self {
        self.path = path;
        self
    }

    /// Overrides the auxiliary loaders.
    #[must_use]
    pub fn with_loaders(mut self, loaders: AuxiliaryLoaders) -> Self {
        self.loaders = loaders;
        self
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Module path options.
    #[must_use]
    pub const fn path_options(&self) -> &ModulePathOptions {
        &self.path
    }

    /// Auxiliary loaders to install.
    #[must_use]
    pub const fn loaders(&self) -> &AuxiliaryLoaders {
        &self.loaders
    }
}

/// Owner of the process-wide module system.
pub struct Bootstrapper {
    factory: Box<dyn ModuleSystemFactory>,
    reporter: Arc<dyn BootstrapReporter>,
    noise: NoiseChannel,
    state: AtomicU8,
    section: Mutex<()>,
    system: OnceLock<Arc<dyn ModuleSystem>>,
}

impl Bootstrapper {
    /// Creates an uninitialised bootstrapper.
    pub fn new(
        factory: impl ModuleSystemFactory + 'static,
        reporter: Arc<dyn BootstrapReporter>,
    ) -> Self {
        Self {
            factory: Box::new(factory),
            reporter,
            noise: NoiseChannel::new(),
            state: AtomicU8::new(BootstrapState::Uninitialized.as_u8()),
            section: Mutex::new(()),
            system: OnceLock::new(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BootstrapState {
        BootstrapState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Diagnostic channel shared with the module system.
    #[must_use]
    pub const fn noise(&self) -> &NoiseChannel {
        &self.noise
    }

    /// Lifecycle observer.
    #[must_use]
    pub fn reporter(&self) -> &dyn BootstrapReporter {
        self.reporter.as_ref()
    }

    /// The published module system, once ready.
    #[must_use]
    pub fn module_system(&self) -> Option<Arc<dyn ModuleSystem>> {
        if self.state() != BootstrapState::Ready {
            return None;
        }
        self.system.get().map(Arc::clone)
    }

    /// Ensures the module system is initialised, initialising it if needed.
    ///
    /// Once ready, later calls return immediately without taking the
    /// exclusive section, whatever root they name.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when initialisation fails. The state is
    /// left `Uninitialized` and a later call retries.
    pub fn ensure_ready(
        &self,
        request: &BootstrapRequest,
    ) -> Result<Arc<dyn ModuleSystem>, BootstrapError> {
        if let Some(system) = self.module_system() {
            return Ok(system);
        }
        self.exclusive().ensure_ready(request)
    }

    /// Enters the process-wide exclusive section.
    ///
    /// Callers that need to do further once-only work after readiness (such
    /// as constructing a request handler) use the returned section so both
    /// steps happen under the same critical region.
    #[must_use]
    pub fn exclusive(&self) -> ExclusiveSection<'_> {
        let guard = self.section.lock().unwrap_or_else(PoisonError::into_inner);
        ExclusiveSection {
            owner: self,
            _guard: guard,
        }
    }

    fn initialise(
        &self,
        request: &BootstrapRequest,
    ) -> Result<Arc<dyn ModuleSystem>, BootstrapError> {
        let path = ModulePath::build(request.root(), request.path_options());
        let system = self.factory.initialize(path, self.noise.clone())?;
        for loader in request.loaders().instantiate(request.root(), &self.noise) {
            system.install_loader(loader);
        }
        Ok(system)
    }
}

/// Held while inside the process-wide exclusive section.
pub struct ExclusiveSection<'a> {
    owner: &'a Bootstrapper,
    _guard: MutexGuard<'a, ()>,
}

impl ExclusiveSection<'_> {
    /// Initialises the module system unless it is already ready.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when initialisation fails.
    pub fn ensure_ready(
        &mut self,
        request: &BootstrapRequest,
    ) -> Result<Arc<dyn ModuleSystem>, BootstrapError> {
        let owner = self.owner;
        if let Some(system) = owner.module_system() {
            return Ok(system);
        }

        let mut attempt = Attempt::begin(&owner.state);
        owner.reporter.bootstrap_starting(request.root());
        match owner.initialise(request) {
            Ok(system) => {
                let entries = system.module_path().len();
                let published = Arc::clone(owner.system.get_or_init(|| system));
                attempt.complete();
                owner.reporter.bootstrap_succeeded(request.root(), entries);
                Ok(published)
            }
            Err(error) => {
                drop(attempt);
                owner.reporter.bootstrap_failed(request.root(), &error);
                Err(error)
            }
        }
    }

    /// The bootstrapper this section belongs to.
    #[must_use]
    pub const fn bootstrapper(&self) -> &Bootstrapper {
        self.owner
    }
}

/// Marks the state `Initializing` and resets it to `Uninitialized` on drop
/// unless completed, including when initialisation unwinds.
struct Attempt<'a> {
    state: &'a AtomicU8,
    completed: bool,
}

impl<'a> Attempt<'a> {
    fn begin(state: &'a AtomicU8) -> Self {
        state.store(BootstrapState::Initializing.as_u8(), Ordering::Release);
        Self {
            state,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.state
            .store(BootstrapState::Ready.as_u8(), Ordering::Release);
        self.completed = true;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.state
                .store(BootstrapState::Uninitialized.as_u8(), Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests;
