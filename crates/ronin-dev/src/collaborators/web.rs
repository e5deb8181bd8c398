//! `tiny_http` web container backed by a rayon worker pool.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rayon::ThreadPoolBuilder;
use ronin_modules::{DeferredHandler, HandlerRequest, HandlerResponse, ServingContext};
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

use super::{WebContainer, launch_error};
use crate::errors::CollaboratorError;

/// Directory below the project root served as the web root.
pub const WEB_ROOT_DIR: &str = "html";

const WEB_TARGET: &str = "ronin_dev::serve";

struct Listener {
    server: Arc<Server>,
    thread: JoinHandle<()>,
    port: u16,
}

/// Web container that shares one listener between `workers` threads.
pub struct TinyHttpContainer {
    workers: usize,
    listener: Option<Listener>,
}

impl TinyHttpContainer {
    /// Container with `workers` request threads (at least one).
    #[must_use]
    pub const fn new(workers: usize) -> Self {
        Self {
            workers,
            listener: None,
        }
    }

    /// Port actually bound, once started.
    #[must_use]
    pub fn local_port(&self) -> Option<u16> {
        self.listener.as_ref().map(|listener| listener.port)
    }
}

impl WebContainer for TinyHttpContainer {
    fn start(
        &mut self,
        port: u16,
        web_root: &Path,
        handler: Arc<DeferredHandler>,
    ) -> Result<(), CollaboratorError> {
        if self.listener.is_some() {
            return Ok(());
        }

        let server = Server::http(("0.0.0.0", port)).map_err(|error| CollaboratorError::Bind {
            port,
            message: error.to_string(),
        })?;
        let bound = server.server_addr().to_ip().map_or(port, |address| address.port());
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers.max(1))
            .thread_name(|index| format!("ronin-web-{index}"))
            .build()?;

        let server = Arc::new(server);
        let context = Arc::new(ServingContext::new(web_root));
        let incoming = Arc::clone(&server);
        let thread = thread::Builder::new()
            .name(String::from("ronin-web-listener"))
            .spawn(move || {
                for request in incoming.incoming_requests() {
                    let handler = Arc::clone(&handler);
                    let context = Arc::clone(&context);
                    pool.spawn(move || respond(request, &handler, &context));
                }
            })
            .map_err(launch_error("web listener"))?;

        info!(
            target: WEB_TARGET,
            event = "web_started",
            port = bound,
            web_root = %web_root.display(),
            workers = self.workers.max(1),
            "web container listening on port {bound}"
        );
        self.listener = Some(Listener {
            server,
            thread,
            port: bound,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CollaboratorError> {
        let Some(listener) = self.listener.take() else {
            return Ok(());
        };
        listener.server.unblock();
        if listener.thread.join().is_err() {
            warn!(
                target: WEB_TARGET,
                event = "listener_panicked",
                "web listener exited with a panic"
            );
        }
        info!(target: WEB_TARGET, event = "web_stopped", port = listener.port, "web container stopped");
        Ok(())
    }
}

impl Drop for TinyHttpContainer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn respond(mut request: Request, handler: &DeferredHandler, context: &ServingContext) {
    let response = match read_request(&mut request) {
        Ok(converted) => handler.service(&converted, context).unwrap_or_else(|failure| {
            error!(
                target: WEB_TARGET,
                event = "request_failed",
                path = converted.path(),
                error = %failure,
                "request handler failed"
            );
            HandlerResponse::text(500, format!("{failure}\n"))
        }),
        Err(failure) => HandlerResponse::text(400, format!("unreadable request body: {failure}\n")),
    };

    debug!(
        target: WEB_TARGET,
        event = "request_served",
        method = %request.method(),
        url = request.url(),
        status = response.status(),
        "request served"
    );

    let status = StatusCode(response.status());
    let content_type = Header::from_bytes("Content-Type", response.content_type().as_bytes());
    let mut reply = Response::from_data(response.into_body()).with_status_code(status);
    if let Ok(header) = content_type {
        reply = reply.with_header(header);
    }
    if let Err(failure) = request.respond(reply) {
        warn!(
            target: WEB_TARGET,
            event = "respond_failed",
            error = %failure,
            "failed to send response"
        );
    }
}

fn read_request(request: &mut Request) -> io::Result<HandlerRequest> {
    let mut body = Vec::new();
    request.as_reader().read_to_end(&mut body)?;
    let converted = request.headers().iter().fold(
        HandlerRequest::new(request.method().as_str(), request.url()),
        |converted, header| converted.with_header(header.field.as_str().as_str(), header.value.as_str()),
    );
    Ok(converted.with_body(body))
}
