//! End-to-end verification of small projects on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use ronin_modules::{
    AuxiliaryLoaders, BootstrapReporter, Bootstrapper, ModuleKind, SourceModuleSystemFactory,
    StructuredReporter, VerificationReport, Verifier,
};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(path, contents).expect("write file");
}

fn verifier() -> Verifier {
    let reporter: Arc<dyn BootstrapReporter> = Arc::new(StructuredReporter::new());
    let bootstrapper = Bootstrapper::new(SourceModuleSystemFactory::default(), reporter);
    Verifier::new(Arc::new(bootstrapper))
}

fn verify(root: &Path) -> VerificationReport {
    verifier().verify(root).expect("module system starts")
}

#[fixture]
fn project() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::create_dir_all(dir.path().join("src")).expect("create src");
    fs::create_dir_all(dir.path().join("test")).expect("create test");
    dir
}

#[rstest]
fn empty_project_verifies_nothing(project: TempDir) {
    let report = verify(project.path());
    assert_eq!(report.to_string(), "0 types verified.");
    assert!(!report.errors_found());
}

#[test]
fn missing_trees_verify_nothing() {
    let dir = TempDir::new().expect("create temp dir");
    let report = verify(dir.path());
    assert_eq!(report.checked(), 0);
}

#[rstest]
fn reports_only_invalid_modules(project: TempDir) {
    write(project.path(), "src/Good.gs", "class Good {\n}\n");
    write(project.path(), "src/Bad.gs", "class Bad {\n  function f() {\n}\n");

    let report = verify(project.path());

    assert_eq!(
        report.to_string(),
        "Errors in Bad:\n  error at line 1, column 11: '{' is never closed, expected '}'\n\n2 types verified."
    );
    assert!(report.errors_found());
}

#[rstest]
fn names_follow_directory_structure(project: TempDir) {
    write(
        project.path(),
        "src/com/acme/Foo.gs",
        "package com.acme\nclass Foo {\n",
    );

    let report = verify(project.path());
    let diagnostic = report.diagnostics().first().expect("Foo is invalid");

    assert_eq!(diagnostic.module().as_str(), "com.acme.Foo");
    assert!(report.to_string().starts_with("Errors in com.acme.Foo:\n"));
}

#[rstest]
fn every_invalid_module_is_reported_in_order(project: TempDir) {
    write(project.path(), "src/b/Second.gs", "class Second {\n");
    write(project.path(), "src/a/First.gs", "class First }\n");
    write(project.path(), "test/c/ThirdTest.gs", "class Wrong {}\n");

    let report = verify(project.path());
    let modules: Vec<&str> = report
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.module().as_str())
        .collect();

    assert_eq!(modules, vec!["a.First", "b.Second", "c.ThirdTest"]);
    assert_eq!(report.checked(), 3);
}

#[rstest]
fn templates_report_generator_feedback(project: TempDir) {
    write(
        project.path(),
        "src/views/List.gst",
        "<ul>\n<% for (i in items) { %>\n  <li>${ i }</li>\n</ul>\n",
    );

    let report = verify(project.path());
    let diagnostic = report.diagnostics().first().expect("template is invalid");

    assert_eq!(diagnostic.kind(), ModuleKind::TemplateType);
    assert_eq!(
        diagnostic.lines(),
        ["error at line 2, column 21: '{' is never closed, expected '}'"]
    );
}

#[rstest]
fn names_in_both_trees_are_verified_once(project: TempDir) {
    write(project.path(), "src/a/B.gs", "package a\nclass B {}\n");
    write(project.path(), "test/a/B.gs", "package a\nclass B {\n");

    let report = verify(project.path());

    assert_eq!(report.checked(), 1);
    assert!(!report.errors_found(), "src copy shadows the test copy");
    let collision = report.collisions().first().expect("collision recorded");
    assert_eq!(collision.name().as_str(), "a.B");
    assert!(collision.kept().starts_with(project.path().join("src")));
}

#[rstest]
fn unresolvable_names_are_skipped_silently(project: TempDir) {
    write(project.path(), "src/a/Weird.v2.gs", "class Weird {}\n");
    write(project.path(), "src/a/Fine.gs", "package a\nclass Fine {}\n");

    let report = verify(project.path());

    assert_eq!(report.to_string(), "1 types verified.");
}

#[rstest]
fn compiled_artifacts_report_header_only(project: TempDir) {
    write(project.path(), "src/Shadow.gs", "class Shadow {}\n");
    write(project.path(), "classes/Shadow.class", "");

    let report = verify(project.path());

    assert_eq!(report.to_string(), "Errors in Shadow:\n\n1 types verified.");
    assert!(report.errors_found());
}

#[rstest]
fn schema_types_shadow_sources_in_dev_tree_runs(project: TempDir) {
    write(project.path(), "src/db/app/Person.gs", "package db.app\nclass Person {\n");
    write(project.path(), "src/db/app.ddl", "CREATE TABLE Person (id INT);");

    let report = verifier()
        .with_loaders(AuxiliaryLoaders::for_dev_tree(true))
        .verify(project.path())
        .expect("module system starts");

    assert_eq!(report.checked(), 1);
    assert!(!report.errors_found());
}

#[rstest]
fn repeated_runs_are_identical(project: TempDir) {
    write(project.path(), "src/Bad.gs", "class Bad {\n");
    write(project.path(), "src/Other.gsx", "enhancement Other : String {}\n");
    write(project.path(), "test/Page.gst", "${ a ");

    let verifier = verifier();
    let first = verifier.verify(project.path()).expect("first run");
    let second = verifier.verify(project.path()).expect("second run");

    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.checked(), 3);
}
