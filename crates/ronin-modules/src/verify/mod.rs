//! Whole-project verification.
//!
//! Every class, enhancement and template under `src` and `test` is resolved
//! through the module system and each invalid module contributes a block of
//! diagnostics to the [`VerificationReport`]. The module system's own
//! diagnostic channel is muted for the whole pass so the report is the only
//! output.

mod candidates;
mod report;

use std::path::Path;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, BootstrapRequest, Bootstrapper};
use crate::module::{Module, ModuleBody, TemplateModule};
use crate::module_path::ModulePathOptions;
use crate::parser::{ParseFeedback, ParserOptions, SourceParser};
use crate::system::AuxiliaryLoaders;

pub use self::candidates::{Candidates, NameCollision, discover_candidates, discover_tree};
pub use self::report::{Diagnostic, VerificationReport};

const VERIFY_TARGET: &str = "ronin_modules::verify";

/// Verifies every module of a project.
pub struct Verifier {
    bootstrapper: Arc<Bootstrapper>,
    path: ModulePathOptions,
    loaders: AuxiliaryLoaders,
}

impl Verifier {
    /// Creates a verifier that bootstraps through `bootstrapper`.
    #[must_use]
    pub fn new(bootstrapper: Arc<Bootstrapper>) -> Self {
        Self {
            bootstrapper,
            path: ModulePathOptions::default(),
            loaders: AuxiliaryLoaders::none(),
        }
    }

    /// Overrides the module path options; the test tree is always included.
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

    /// Verifies the project rooted at `root`.
    ///
    /// Candidates are visited in lexicographic order. Names that do not
    /// resolve are skipped without output and are not counted.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when the module system cannot be brought up.
    pub fn verify(&self, root: &Path) -> Result<VerificationReport, BootstrapError> {
        let _quiet = self.bootstrapper.noise().suppress();
        let request = BootstrapRequest::new(root)
            .with_path_options(self.path.clone().with_tests(true))
            .with_loaders(self.loaders.clone());
        let system = self.bootstrapper.ensure_ready(&request)?;

        let candidates = discover_candidates(root);
        let names: Vec<_> = candidates.names().cloned().collect();
        let mut report = VerificationReport::new(candidates.into_collisions());
        for name in names {
            tracing::debug!(
                target: VERIFY_TARGET,
                event = "verifying_module",
                module = %name,
                "Verifying {name}"
            );
            let Some(module) = system.resolve(&name) else {
                continue;
            };
            report.record_checked();
            if let Some(diagnostic) = extract_diagnostic(&module) {
                report.push(diagnostic);
            }
        }

        tracing::info!(
            target: VERIFY_TARGET,
            event = "verification_finished",
            checked = report.checked(),
            invalid = report.diagnostics().len(),
            collisions = report.collisions().len(),
            "verification finished"
        );
        Ok(report)
    }
}

/// Builds the diagnostic for `module`, or `None` when it is valid.
#[must_use]
pub fn extract_diagnostic(module: &Module) -> Option<Diagnostic> {
    if module.is_valid() {
        return None;
    }
    let lines = match module.body() {
        ModuleBody::Ordinary(ordinary) => feedback_lines(ordinary.feedback()),
        ModuleBody::Template(template) => template_lines(module, template),
        ModuleBody::Other(_) => Vec::new(),
    };
    Some(Diagnostic::new(module.name().clone(), module.kind(), lines))
}

fn feedback_lines(feedback: Option<&ParseFeedback>) -> Vec<String> {
    feedback.map(ParseFeedback::lines).unwrap_or_default()
}

/// Re-verifies the template's generator with a fresh minimal parser. If that
/// unexpectedly passes, the feedback captured at resolution time is used.
fn template_lines(module: &Module, template: &TemplateModule) -> Vec<String> {
    let parser = SourceParser::new(ParserOptions::minimal());
    match template.generator().verify(&parser) {
        Err(failure) => failure.feedback().lines(),
        Ok(()) => {
            tracing::debug!(
                target: VERIFY_TARGET,
                event = "template_reverify_passed",
                module = %module.name(),
                "template re-verification passed; using captured feedback"
            );
            feedback_lines(template.feedback())
        }
    }
}

#[cfg(test)]
mod tests;
