//! Unit tests for diagnostic extraction and report rendering.

use std::path::PathBuf;
use std::sync::Mutex;

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::bootstrap::BootstrapReporter;
use crate::module::{ModuleKind, ModuleOrigin, OrdinaryModule, OtherModule};
use crate::module_path::ModulePath;
use crate::name::{ModuleName, SourceKind};
use crate::noise::NoiseChannel;
use crate::parser::TemplateGenerator;
use crate::system::{ModuleSystem, ModuleSystemFactory, SourceModuleSystem};
use crate::tests::support::{CountingFactory, RecordingReporter, write_file};

fn name(raw: &str) -> ModuleName {
    ModuleName::parse(raw).expect("valid module name")
}

fn template(raw: &str, source: &str) -> Module {
    let (generator, feedback) = SourceParser::default().parse_template(source);
    Module::new(
        name(raw),
        ModuleOrigin::Source(PathBuf::from(format!("{raw}.gst"))),
        ModuleBody::Template(TemplateModule::new(generator, feedback)),
    )
}

fn ordinary(raw: &str, source: &str) -> Module {
    let module_name = name(raw);
    let feedback = SourceParser::default()
        .parse_type(source, &module_name, SourceKind::Class)
        .err();
    Module::new(
        module_name,
        ModuleOrigin::Source(PathBuf::from(format!("{raw}.gs"))),
        ModuleBody::Ordinary(OrdinaryModule::new(SourceKind::Class, feedback)),
    )
}

#[test]
fn valid_modules_produce_no_diagnostic() {
    assert!(extract_diagnostic(&ordinary("Good", "class Good {}\n")).is_none());
}

#[test]
fn ordinary_feedback_becomes_lines() {
    let diagnostic =
        extract_diagnostic(&ordinary("Bad", "class Bad {\n")).expect("invalid module");
    assert_eq!(diagnostic.kind(), ModuleKind::OrdinaryType);
    assert_eq!(
        diagnostic.lines(),
        ["error at line 1, column 11: '{' is never closed, expected '}'"]
    );
}

#[test]
fn template_feedback_comes_from_reverification() {
    let diagnostic =
        extract_diagnostic(&template("views.Page", "<% if (x) { %>\n")).expect("invalid template");
    assert_eq!(diagnostic.kind(), ModuleKind::TemplateType);
    assert_eq!(
        diagnostic.lines(),
        ["error at line 1, column 11: '{' is never closed, expected '}'"]
    );
}

#[test]
fn template_falls_back_to_captured_feedback() {
    let module = template(
        "views.Page",
        "<%@ params(a : String) %>\n<%@ params(b : String) %>\n",
    );
    let diagnostic = extract_diagnostic(&module).expect("invalid template");
    assert_eq!(
        diagnostic.lines(),
        ["error at line 2, column 1: duplicate 'params' directive"]
    );
}

#[test]
fn other_modules_report_header_only() {
    let module = Module::new(
        name("db.app.Person"),
        ModuleOrigin::Loader("schema".to_owned()),
        ModuleBody::Other(OtherModule::invalid("table 'Person' declares no columns")),
    );
    let diagnostic = extract_diagnostic(&module).expect("invalid module");
    assert!(diagnostic.lines().is_empty());
    assert_eq!(diagnostic.to_string(), "Errors in db.app.Person:\n\n");
}

#[rstest]
#[case(0, &[], "0 types verified.")]
#[case(
    2,
    &[("Bad", &["first", "second"][..])],
    "Errors in Bad:\n  first\n  second\n\n2 types verified."
)]
#[case(
    3,
    &[("A", &["one"][..]), ("B", &["two"][..])],
    "Errors in A:\n  one\n\nErrors in B:\n  two\n\n3 types verified."
)]
fn renders_blocks_then_summary(
    #[case] checked: usize,
    #[case] blocks: &[(&str, &[&str])],
    #[case] expected: &str,
) {
    let mut report = VerificationReport::new(Vec::new());
    for _ in 0..checked {
        report.record_checked();
    }
    for (module, lines) in blocks {
        report.push(Diagnostic::new(
            name(module),
            ModuleKind::OrdinaryType,
            lines.iter().map(|line| (*line).to_owned()).collect(),
        ));
    }
    assert_eq!(report.to_string(), expected);
    assert_eq!(report.errors_found(), !blocks.is_empty());
}

#[test]
fn generator_is_kept_for_reverification() {
    let generator = TemplateGenerator::generate("${ a }");
    let module = Module::new(
        name("T"),
        ModuleOrigin::Source(PathBuf::from("T.gst")),
        ModuleBody::Template(TemplateModule::new(generator.clone(), None)),
    );
    let ModuleBody::Template(template) = module.body() else {
        panic!("template body expected");
    };
    assert_eq!(template.generator(), &generator);
    assert!(extract_diagnostic(&module).is_none());
}

/// Factory that records whether its noise channel accepted a message.
#[derive(Debug, Default)]
struct EmittingFactory {
    emitted: Arc<Mutex<Vec<bool>>>,
}

impl ModuleSystemFactory for EmittingFactory {
    fn initialize(
        &self,
        path: ModulePath,
        noise: NoiseChannel,
    ) -> Result<Arc<dyn ModuleSystem>, BootstrapError> {
        let accepted = noise.emit("classes directory is missing");
        self.emitted.lock().expect("emitted lock").push(accepted);
        Ok(Arc::new(SourceModuleSystem::new(
            path,
            noise,
            SourceParser::default(),
        )))
    }
}

fn project_with_archive() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    write_file(dir.path(), "src/Good.gs", "class Good {}\n");
    write_file(dir.path(), "lib/vendor.jar", "");
    dir
}

fn verifier_over(factory: impl ModuleSystemFactory + 'static) -> (Verifier, Arc<Bootstrapper>) {
    let reporter = Arc::new(RecordingReporter::default()) as Arc<dyn BootstrapReporter>;
    let bootstrapper = Arc::new(Bootstrapper::new(factory, reporter));
    (Verifier::new(Arc::clone(&bootstrapper)), bootstrapper)
}

#[test]
fn noise_is_muted_for_the_whole_pass() {
    let project = project_with_archive();
    let factory = EmittingFactory::default();
    let emitted = Arc::clone(&factory.emitted);
    let (verifier, bootstrapper) = verifier_over(factory);

    let report = verifier.verify(project.path()).expect("verification runs");

    assert_eq!(report.checked(), 1);
    assert_eq!(*emitted.lock().expect("emitted lock"), vec![false]);
    assert!(!bootstrapper.noise().is_muted());
    assert!(bootstrapper.noise().emit("audible after verification"));
}

#[test]
fn noise_is_restored_when_bootstrap_fails() {
    let project = project_with_archive();
    let (verifier, bootstrapper) = verifier_over(CountingFactory::failing(1));

    let error = verifier
        .verify(project.path())
        .err()
        .expect("bootstrap refuses");

    assert!(matches!(error, BootstrapError::Initialise { .. }));
    assert!(!bootstrapper.noise().is_muted());

    verifier.verify(project.path()).expect("retry succeeds");
    assert!(!bootstrapper.noise().is_muted());
}
