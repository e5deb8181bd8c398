//! The built-in development request handler.
//!
//! Static files come straight from the web root. Any other path names a
//! controller: `/Admin/users` is routed to the `controller.Admin` module.
//! In development mode an invalid controller answers with its compiler
//! diagnostics instead of a bare error page.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use ronin_config::DEFAULT_HANDLER;
use ronin_modules::verify::extract_diagnostic;
use ronin_modules::{
    HandlerContext, HandlerError, HandlerRegistry, HandlerRequest, HandlerResponse, ModuleName,
    ModuleSystem, RequestHandler,
};

/// Package holding the project's controllers.
pub const CONTROLLER_PACKAGE: &str = "controller";

const INDEX_FILE: &str = "index.html";

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("txt", "text/plain; charset=utf-8"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
];

const OCTET_STREAM: &str = "application/octet-stream";

/// Registers [`RoninHandler`] under the default handler name.
///
/// # Errors
///
/// Returns [`HandlerError::AlreadyRegistered`] when the name is taken.
pub fn register_builtin(registry: &mut HandlerRegistry) -> Result<(), HandlerError> {
    registry.register(DEFAULT_HANDLER, |dev_mode| {
        Box::new(RoninHandler::new(dev_mode)) as Box<dyn RequestHandler>
    })
}

/// Content type for `path`, by extension.
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|extension| extension.to_str())
        .and_then(|extension| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(extension))
        })
        .map_or(OCTET_STREAM, |(_, mime)| mime)
}

struct Serving {
    web_root: PathBuf,
    modules: Arc<dyn ModuleSystem>,
}

/// Development request handler.
pub struct RoninHandler {
    dev_mode: bool,
    serving: Option<Serving>,
}

impl RoninHandler {
    /// Handler that reports diagnostics when `dev_mode` is set.
    #[must_use]
    pub const fn new(dev_mode: bool) -> Self {
        Self {
            dev_mode,
            serving: None,
        }
    }

    fn static_file(web_root: &Path, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return None;
        }
        let candidate = web_root.join(relative);
        if candidate.is_dir() {
            let index = candidate.join(INDEX_FILE);
            return index.is_file().then_some(index);
        }
        candidate.is_file().then_some(candidate)
    }

    fn controller(&self, modules: &dyn ModuleSystem, path: &str) -> Option<HandlerResponse> {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        let controller = segments.next()?;
        let action = segments.next().unwrap_or("index");
        let name = ModuleName::parse(&format!("{CONTROLLER_PACKAGE}.{controller}"))?;
        let module = modules.resolve(&name)?;

        let response = match extract_diagnostic(&module) {
            None => HandlerResponse::text(200, format!("{name}#{action}\n")),
            Some(diagnostic) if self.dev_mode => HandlerResponse::text(500, diagnostic.to_string()),
            Some(_) => HandlerResponse::text(500, "internal server error\n"),
        };
        Some(response)
    }
}

impl RequestHandler for RoninHandler {
    fn init(&mut self, context: &HandlerContext) -> Result<(), HandlerError> {
        self.serving = Some(Serving {
            web_root: context.web_root().to_path_buf(),
            modules: Arc::clone(context.module_system()),
        });
        Ok(())
    }

    fn service(&self, request: &HandlerRequest) -> Result<HandlerResponse, HandlerError> {
        let serving = self.serving.as_ref().ok_or_else(|| HandlerError::Init {
            handler: DEFAULT_HANDLER.to_owned(),
            message: String::from("service called before init"),
        })?;

        if let Some(file) = Self::static_file(&serving.web_root, request.path()) {
            let body = fs::read(&file).map_err(|source| io_error(&file, source))?;
            return Ok(HandlerResponse::new(200, content_type(&file), body));
        }

        Ok(self
            .controller(serving.modules.as_ref(), request.path())
            .unwrap_or_else(|| HandlerResponse::not_found(request.path())))
    }
}

fn io_error(path: &Path, source: io::Error) -> HandlerError {
    HandlerError::Io {
        path: path.to_path_buf(),
        source: Arc::new(source),
    }
}
