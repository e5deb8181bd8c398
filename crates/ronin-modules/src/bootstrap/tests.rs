//! Unit tests for the bootstrapper.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::system::LoaderKind;
use crate::tests::support::{CountingFactory, RecordingReporter, write_file};

#[fixture]
fn project() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    write_file(dir.path(), "src/Good.gs", "class Good {}\n");
    dir
}

fn bootstrapper(factory: CountingFactory) -> (Arc<Bootstrapper>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let bootstrapper = Bootstrapper::new(factory, reporter.clone() as Arc<dyn BootstrapReporter>);
    (Arc::new(bootstrapper), reporter)
}

#[rstest]
fn starts_uninitialised_and_becomes_ready(project: TempDir) {
    let (bootstrapper, reporter) = bootstrapper(CountingFactory::new());
    assert_eq!(bootstrapper.state(), BootstrapState::Uninitialized);
    assert!(bootstrapper.module_system().is_none());

    bootstrapper
        .ensure_ready(&BootstrapRequest::new(project.path()))
        .expect("bootstrap succeeds");

    assert_eq!(bootstrapper.state(), BootstrapState::Ready);
    assert!(bootstrapper.module_system().is_some());
    assert_eq!(reporter.events(), vec!["starting", "succeeded"]);
}

#[rstest]
fn concurrent_callers_initialise_exactly_once(project: TempDir) {
    let factory = CountingFactory::new().with_delay(Duration::from_millis(20));
    let calls = factory.counter();
    let (bootstrapper, _) = bootstrapper(factory);
    let request = BootstrapRequest::new(project.path());
    let callers = 16;
    let barrier = Arc::new(Barrier::new(callers));

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let bootstrapper = Arc::clone(&bootstrapper);
            let barrier = Arc::clone(&barrier);
            let request = request.clone();
            thread::spawn(move || {
                barrier.wait();
                bootstrapper.ensure_ready(&request).expect("bootstrap succeeds")
            })
        })
        .collect();
    let systems: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("caller thread"))
        .collect();

    assert_eq!(calls.load(Ordering::Acquire), 1);
    let first = systems.first().expect("at least one caller");
    assert!(systems.iter().all(|system| Arc::ptr_eq(system, first)));
}

#[rstest]
fn ready_calls_skip_initialisation(project: TempDir) {
    let factory = CountingFactory::new();
    let calls = factory.counter();
    let (bootstrapper, _) = bootstrapper(factory);
    let request = BootstrapRequest::new(project.path());

    for _ in 0..5 {
        bootstrapper.ensure_ready(&request).expect("bootstrap succeeds");
    }

    assert_eq!(calls.load(Ordering::Acquire), 1);
}

#[rstest]
fn first_root_wins(project: TempDir) {
    let (bootstrapper, _) = bootstrapper(CountingFactory::new());
    let other = TempDir::new().expect("create temp dir");

    bootstrapper
        .ensure_ready(&BootstrapRequest::new(project.path()))
        .expect("first bootstrap");
    let system = bootstrapper
        .ensure_ready(&BootstrapRequest::new(other.path()))
        .expect("second call");

    let first_entry = system.module_path().entries().first().map(|entry| entry.path().to_path_buf());
    assert_eq!(first_entry, Some(project.path().join("classes")));
}

#[rstest]
fn failure_leaves_state_retryable(project: TempDir) {
    let factory = CountingFactory::failing(1);
    let calls = factory.counter();
    let (bootstrapper, reporter) = bootstrapper(factory);
    let request = BootstrapRequest::new(project.path());

    let error = bootstrapper
        .ensure_ready(&request)
        .err()
        .expect("first attempt fails");
    assert!(matches!(error, BootstrapError::Initialise { .. }));
    assert_eq!(bootstrapper.state(), BootstrapState::Uninitialized);

    bootstrapper.ensure_ready(&request).expect("retry succeeds");
    assert_eq!(bootstrapper.state(), BootstrapState::Ready);
    assert_eq!(calls.load(Ordering::Acquire), 2);
    assert_eq!(
        reporter.events(),
        vec!["starting", "failed", "starting", "succeeded"]
    );
}

#[rstest]
fn panic_during_initialisation_resets_state(project: TempDir) {
    let (bootstrapper, _) = bootstrapper(CountingFactory::panicking(1));
    let request = BootstrapRequest::new(project.path());

    let outcome = catch_unwind(AssertUnwindSafe(|| bootstrapper.ensure_ready(&request)));
    assert!(outcome.is_err(), "factory panic propagates");
    assert_eq!(bootstrapper.state(), BootstrapState::Uninitialized);

    bootstrapper
        .ensure_ready(&request)
        .expect("retry after panic succeeds");
    assert_eq!(bootstrapper.state(), BootstrapState::Ready);
}

#[rstest]
fn installs_mode_dependent_loaders(project: TempDir) {
    let (bootstrapper, _) = bootstrapper(CountingFactory::new());
    let request = BootstrapRequest::new(project.path())
        .with_loaders(AuxiliaryLoaders::for_dev_tree(true));

    let system = bootstrapper.ensure_ready(&request).expect("bootstrap succeeds");

    assert_eq!(AuxiliaryLoaders::for_dev_tree(true).kinds(), [LoaderKind::Schema]);
    assert_eq!(system.loader_names(), vec!["schema"]);
}

#[rstest]
fn packaged_runs_install_no_loaders(project: TempDir) {
    let (bootstrapper, _) = bootstrapper(CountingFactory::new());
    let request = BootstrapRequest::new(project.path())
        .with_loaders(AuxiliaryLoaders::for_dev_tree(false));

    let system = bootstrapper.ensure_ready(&request).expect("bootstrap succeeds");

    assert!(system.loader_names().is_empty());
}

#[rstest]
fn exclusive_section_shares_the_same_system(project: TempDir) {
    let (bootstrapper, _) = bootstrapper(CountingFactory::new());
    let request = BootstrapRequest::new(project.path());

    let from_section = {
        let mut section = bootstrapper.exclusive();
        section.ensure_ready(&request).expect("bootstrap in section")
    };
    let from_fast_path = bootstrapper.ensure_ready(&request).expect("fast path");

    assert!(Arc::ptr_eq(&from_section, &from_fast_path));
}
