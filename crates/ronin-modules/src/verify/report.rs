//! Verification results and their textual rendering.

use std::fmt;

use crate::module::ModuleKind;
use crate::name::ModuleName;

use super::candidates::NameCollision;

/// Problems reported for one invalid module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    module: ModuleName,
    kind: ModuleKind,
    lines: Vec<String>,
}

impl Diagnostic {
    /// Creates a diagnostic; `lines` may be empty.
    #[must_use]
    pub const fn new(module: ModuleName, kind: ModuleKind, lines: Vec<String>) -> Self {
        Self {
            module,
            kind,
            lines,
        }
    }

    /// Module the diagnostic belongs to.
    #[must_use]
    pub const fn module(&self) -> &ModuleName {
        &self.module
    }

    /// Category the module was verified as.
    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Feedback lines, unindented.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Errors in {}:", self.module)?;
        for line in &self.lines {
            writeln!(f, "  {line}")?;
        }
        writeln!(f)
    }
}

/// Outcome of verifying a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    checked: usize,
    diagnostics: Vec<Diagnostic>,
    collisions: Vec<NameCollision>,
}

impl VerificationReport {
    /// Empty report carrying the collisions found during discovery.
    #[must_use]
    pub const fn new(collisions: Vec<NameCollision>) -> Self {
        Self {
            checked: 0,
            diagnostics: Vec::new(),
            collisions,
        }
    }

    /// Counts one resolved module.
    pub const fn record_checked(&mut self) {
        self.checked += 1;
    }

    /// Adds the diagnostic of an invalid module.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Number of modules that resolved and were examined.
    #[must_use]
    pub const fn checked(&self) -> usize {
        self.checked
    }

    /// Diagnostics in verification order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Names found in both source trees.
    #[must_use]
    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }

    /// Returns `true` when at least one module was invalid.
    #[must_use]
    pub fn errors_found(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            write!(f, "{diagnostic}")?;
        }
        write!(f, "{} types verified.", self.checked)
    }
}
