//! Deferred construction of the platform request handler.
//!
//! The web container starts before the module system exists, so the handler
//! it serves through is a [`DeferredHandler`]: a stand-in that, on the first
//! request, bootstraps the module system, looks the real handler up in a
//! [`HandlerRegistry`] by name, initialises it and forwards every request to
//! it from then on. Both the bootstrap and the construction run inside the
//! bootstrapper's exclusive section, so concurrent first requests construct
//! exactly one handler.

mod registry;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::bootstrap::{BootstrapError, BootstrapRequest, Bootstrapper};
use crate::module_path::ModulePathOptions;
use crate::system::{AuxiliaryLoaders, ModuleSystem};

pub use self::registry::{HandlerFactory, HandlerRegistry};

/// Directory below the web root holding the packaged project.
pub const PACKAGED_ROOT_DIR: &str = "WEB-INF";

/// Errors raised while constructing or running a request handler.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// No factory is registered under the requested name.
    #[error("request handler '{name}' is not registered")]
    NotRegistered {
        /// Name that was looked up.
        name: String,
    },
    /// A factory is already registered under the name.
    #[error("request handler '{name}' is already registered")]
    AlreadyRegistered {
        /// Duplicate name.
        name: String,
    },
    /// The module system could not be brought up.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The handler rejected its initialisation context.
    #[error("request handler '{handler}' failed to initialise: {message}")]
    Init {
        /// Handler name.
        handler: String,
        /// Human-readable failure description.
        message: String,
    },
    /// A resource needed to answer the request could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Resource that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// Request as seen by a [`RequestHandler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerRequest {
    method: String,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HandlerRequest {
    /// Creates a request for `target`, which may carry a `?query`.
    #[must_use]
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        Self {
            method: method.into(),
            path,
            query,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// First header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Response produced by a [`RequestHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

impl HandlerResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    /// Plain-text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// `404 Not Found`.
    #[must_use]
    pub fn not_found(path: &str) -> Self {
        Self::text(404, format!("{path} not found\n"))
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Content type header value.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the response, returning its body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Everything a handler receives when initialised.
#[derive(Clone)]
pub struct HandlerContext {
    module_system: Arc<dyn ModuleSystem>,
    web_root: PathBuf,
    resource_root: PathBuf,
    dev_mode: bool,
}

impl HandlerContext {
    /// Assembles a context.
    #[must_use]
    pub const fn new(
        module_system: Arc<dyn ModuleSystem>,
        web_root: PathBuf,
        resource_root: PathBuf,
        dev_mode: bool,
    ) -> Self {
        Self {
            module_system,
            web_root,
            resource_root,
            dev_mode,
        }
    }

    /// The ready module system.
    #[must_use]
    pub fn module_system(&self) -> &Arc<dyn ModuleSystem> {
        &self.module_system
    }

    /// Directory static resources are served from.
    #[must_use]
    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    /// Project root the module system was bootstrapped against.
    #[must_use]
    pub fn resource_root(&self) -> &Path {
        &self.resource_root
    }

    /// Development-mode flag.
    #[must_use]
    pub const fn dev_mode(&self) -> bool {
        self.dev_mode
    }
}

/// The platform's request handler.
pub trait RequestHandler: Send + Sync {
    /// Prepares the handler once, before its first request.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the handler cannot serve.
    fn init(&mut self, context: &HandlerContext) -> Result<(), HandlerError>;

    /// Answers one request.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the request cannot be answered.
    fn service(&self, request: &HandlerRequest) -> Result<HandlerResponse, HandlerError>;
}

/// What the web container knows about where it is serving from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingContext {
    web_root: PathBuf,
}

impl ServingContext {
    /// Context for a container serving `web_root`.
    #[must_use]
    pub fn new(web_root: impl Into<PathBuf>) -> Self {
        Self {
            web_root: web_root.into(),
        }
    }

    /// Directory the container serves.
    #[must_use]
    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    /// Project root for the module system.
    ///
    /// In the unpacked development layout this is the parent of the web
    /// root; a packaged deployment keeps the project in `WEB-INF`.
    #[must_use]
    pub fn resource_root(&self, dev_layout: bool) -> PathBuf {
        if dev_layout {
            self.web_root
                .parent()
                .map_or_else(|| self.web_root.clone(), Path::to_path_buf)
        } else {
            self.web_root.join(PACKAGED_ROOT_DIR)
        }
    }
}

/// How the deferred handler bootstraps and what it constructs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    /// Registry key of the handler to construct.
    pub handler: String,
    /// Flag passed to the handler factory.
    pub dev_mode: bool,
    /// Resource root layout, see [`ServingContext::resource_root`].
    pub dev_layout: bool,
    /// Module path options used for the bootstrap.
    pub path: ModulePathOptions,
    /// Auxiliary loaders installed during the bootstrap.
    pub loaders: AuxiliaryLoaders,
}

impl HandlerSettings {
    /// Settings for `handler` with development defaults.
    #[must_use]
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            dev_mode: true,
            dev_layout: true,
            path: ModulePathOptions::default(),
            loaders: AuxiliaryLoaders::none(),
        }
    }
}

/// Stand-in handler that constructs the real one on first request.
pub struct DeferredHandler {
    bootstrapper: Arc<Bootstrapper>,
    registry: Arc<HandlerRegistry>,
    settings: HandlerSettings,
    handler: OnceLock<Box<dyn RequestHandler>>,
}

impl DeferredHandler {
    /// Creates an uninitialised stand-in.
    #[must_use]
    pub const fn new(
        bootstrapper: Arc<Bootstrapper>,
        registry: Arc<HandlerRegistry>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            bootstrapper,
            registry,
            settings,
            handler: OnceLock::new(),
        }
    }

    /// Returns `true` once the real handler has been constructed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.handler.get().is_some()
    }

    /// Settings this handler was created with.
    #[must_use]
    pub const fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    /// Forwards `request` to the real handler, constructing it first if
    /// this is the first request.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when bootstrap, construction or the handler
    /// itself fails. A failed construction is retried on the next request.
    pub fn service(
        &self,
        request: &HandlerRequest,
        context: &ServingContext,
    ) -> Result<HandlerResponse, HandlerError> {
        let handler = match self.handler.get() {
            Some(handler) => handler.as_ref(),
            None => self.construct(context)?,
        };
        handler.service(request)
    }

    fn construct(&self, context: &ServingContext) -> Result<&dyn RequestHandler, HandlerError> {
        let mut section = self.bootstrapper.exclusive();
        if let Some(handler) = self.handler.get() {
            return Ok(handler.as_ref());
        }

        let resource_root = context.resource_root(self.settings.dev_layout);
        let request = BootstrapRequest::new(&resource_root)
            .with_path_options(self.settings.path.clone())
            .with_loaders(self.settings.loaders.clone());
        let system = section.ensure_ready(&request)?;

        let reporter = self.bootstrapper.reporter();
        let handler = self
            .build(system, context, resource_root)
            .inspect_err(|error| reporter.handler_failed(&self.settings.handler, error))?;
        reporter.handler_ready(&self.settings.handler);
        Ok(self.handler.get_or_init(|| handler).as_ref())
    }

    fn build(
        &self,
        system: Arc<dyn ModuleSystem>,
        context: &ServingContext,
        resource_root: PathBuf,
    ) -> Result<Box<dyn RequestHandler>, HandlerError> {
        let mut handler = self
            .registry
            .construct(&self.settings.handler, self.settings.dev_mode)?;
        let init_context = HandlerContext::new(
            system,
            context.web_root().to_path_buf(),
            resource_root,
            self.settings.dev_mode,
        );
        handler.init(&init_context)?;
        Ok(handler)
    }
}
