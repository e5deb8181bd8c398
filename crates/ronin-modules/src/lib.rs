//! Module system bootstrap, deferred handler construction and verification
//! for Ronin projects.
//!
//! A Ronin project keeps its classes (`.gs`), enhancements (`.gsx`) and
//! templates (`.gst`) under `src` and `test`, compiled artifacts under
//! `classes` and library archives under `lib`. This crate turns such a
//! project into a running module system:
//!
//! - [`ModulePath`] orders the places modules are looked up in.
//! - [`Bootstrapper`] brings the process-wide [`ModuleSystem`] up exactly
//!   once, however many threads ask for it.
//! - [`DeferredHandler`] lets a web container start serving before the
//!   module system exists, constructing the real [`RequestHandler`] from a
//!   [`HandlerRegistry`] on first request.
//! - [`Verifier`] resolves every module of a project and renders a
//!   [`VerificationReport`] of the invalid ones.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use ronin_modules::{Bootstrapper, SourceModuleSystemFactory, StructuredReporter, Verifier};
//!
//! let bootstrapper = Arc::new(Bootstrapper::new(
//!     SourceModuleSystemFactory::default(),
//!     Arc::new(StructuredReporter::new()),
//! ));
//! let report = Verifier::new(bootstrapper)
//!     .verify(Path::new("."))
//!     .expect("module system starts");
//! println!("{report}");
//! ```

pub mod bootstrap;
pub mod handler;
pub mod module;
pub mod module_path;
pub mod name;
pub mod noise;
pub mod parser;
pub mod schema;
pub mod system;
pub mod verify;

#[cfg(test)]
mod tests;

pub use self::bootstrap::{
    BootstrapError, BootstrapReporter, BootstrapRequest, BootstrapState, Bootstrapper,
    ExclusiveSection, StructuredReporter,
};
pub use self::handler::{
    DeferredHandler, HandlerContext, HandlerError, HandlerFactory, HandlerRegistry,
    HandlerRequest, HandlerResponse, HandlerSettings, RequestHandler, ServingContext,
};
pub use self::module::{Module, ModuleBody, ModuleKind, ModuleOrigin};
pub use self::module_path::{ModulePath, ModulePathEntry, ModulePathOptions};
pub use self::name::{ModuleName, SourceKind};
pub use self::noise::{NoiseChannel, NoiseSuppression};
pub use self::parser::{ParseFeedback, ParseIssue, ParserOptions, SourceParser};
pub use self::schema::SchemaLoader;
pub use self::system::{
    AuxiliaryLoader, AuxiliaryLoaders, LoaderKind, ModuleSystem, ModuleSystemFactory,
    SourceModuleSystem, SourceModuleSystemFactory,
};
pub use self::verify::{Diagnostic, VerificationReport, Verifier};
