//! Name-keyed registry of request handler factories.

use std::collections::HashMap;
use std::fmt;

use super::{HandlerError, RequestHandler};

/// Constructor for a request handler, given the development-mode flag.
pub type HandlerFactory = Box<dyn Fn(bool) -> Box<dyn RequestHandler> + Send + Sync>;

/// Registry mapping handler names to their factories.
///
/// Handlers are looked up by name at first request, so the serving layer
/// never links against a concrete handler type.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::AlreadyRegistered`] if the name is taken.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), HandlerError>
    where
        F: Fn(bool) -> Box<dyn RequestHandler> + Send + Sync + 'static,
    {
        let key = name.into();
        if self.factories.contains_key(&key) {
            return Err(HandlerError::AlreadyRegistered { name: key });
        }
        self.factories.insert(key, Box::new(factory));
        Ok(())
    }

    /// Constructs the handler registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NotRegistered`] for unknown names.
    pub fn construct(
        &self,
        name: &str,
        dev_mode: bool,
    ) -> Result<Box<dyn RequestHandler>, HandlerError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| HandlerError::NotRegistered {
                name: name.to_owned(),
            })?;
        Ok(factory(dev_mode))
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
