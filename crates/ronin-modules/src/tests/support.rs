//! Recording and counting doubles for the bootstrapper's collaborators.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::bootstrap::{BootstrapError, BootstrapReporter};
use crate::handler::HandlerError;
use crate::module_path::ModulePath;
use crate::noise::NoiseChannel;
use crate::parser::SourceParser;
use crate::system::{ModuleSystem, ModuleSystemFactory, SourceModuleSystem};

/// Factory that counts initialisations and can fail or panic on demand.
#[derive(Debug, Default)]
pub(crate) struct CountingFactory {
    calls: Arc<AtomicUsize>,
    failures_left: AtomicUsize,
    panics_left: AtomicUsize,
    delay: Duration,
}

impl CountingFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub(crate) fn panicking(times: usize) -> Self {
        Self {
            panics_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl ModuleSystemFactory for CountingFactory {
    fn initialize(
        &self,
        path: ModulePath,
        noise: NoiseChannel,
    ) -> Result<Arc<dyn ModuleSystem>, BootstrapError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        thread::sleep(self.delay);
        if Self::take(&self.panics_left) {
            panic!("module system exploded");
        }
        if Self::take(&self.failures_left) {
            return Err(BootstrapError::Initialise {
                message: "factory refused".to_owned(),
            });
        }
        Ok(Arc::new(SourceModuleSystem::new(
            path,
            noise,
            SourceParser::default(),
        )))
    }
}

/// Reporter that records event names in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl BootstrapReporter for RecordingReporter {
    fn bootstrap_starting(&self, _root: &Path) {
        self.record("starting".to_owned());
    }

    fn bootstrap_succeeded(&self, _root: &Path, _path_entries: usize) {
        self.record("succeeded".to_owned());
    }

    fn bootstrap_failed(&self, _root: &Path, _error: &BootstrapError) {
        self.record("failed".to_owned());
    }

    fn handler_ready(&self, handler: &str) {
        self.record(format!("handler_ready:{handler}"));
    }

    fn handler_failed(&self, handler: &str, _error: &HandlerError) {
        self.record(format!("handler_failed:{handler}"));
    }
}

/// Writes `contents` to `root/relative`, creating parent directories.
pub(crate) fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(path, contents).expect("write file");
}
