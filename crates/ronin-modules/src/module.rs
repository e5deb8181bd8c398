//! Resolved modules and their kind-specific payloads.

use std::fmt;
use std::path::PathBuf;

use crate::name::{ModuleName, SourceKind};
use crate::parser::{ParseFeedback, TemplateGenerator};

/// Verification category of a resolved module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Class or enhancement compiled from source.
    OrdinaryType,
    /// Template compiled through a generator.
    TemplateType,
    /// Anything else: compiled artifacts or loader-synthesised types.
    Other,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OrdinaryType => "ordinary",
            Self::TemplateType => "template",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// Where a module was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// Source file on a source directory entry.
    Source(PathBuf),
    /// Compiled artifact in the compiled-output directory.
    Compiled(PathBuf),
    /// Auxiliary loader, by name.
    Loader(String),
}

/// Payload of an ordinary type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdinaryModule {
    declaration: SourceKind,
    feedback: Option<ParseFeedback>,
}

impl OrdinaryModule {
    /// Creates the payload; `feedback` is `None` when parsing succeeded.
    #[must_use]
    pub const fn new(declaration: SourceKind, feedback: Option<ParseFeedback>) -> Self {
        Self {
            declaration,
            feedback,
        }
    }

    /// Source kind the type was declared in.
    #[must_use]
    pub const fn declaration(&self) -> SourceKind {
        self.declaration
    }

    /// Parse feedback captured at resolution time.
    #[must_use]
    pub const fn feedback(&self) -> Option<&ParseFeedback> {
        self.feedback.as_ref()
    }
}

/// Payload of a template type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateModule {
    generator: TemplateGenerator,
    feedback: Option<ParseFeedback>,
}

impl TemplateModule {
    /// Creates the payload; `feedback` is `None` when parsing succeeded.
    #[must_use]
    pub const fn new(generator: TemplateGenerator, feedback: Option<ParseFeedback>) -> Self {
        Self {
            generator,
            feedback,
        }
    }

    /// Generator that produced the template's code.
    #[must_use]
    pub const fn generator(&self) -> &TemplateGenerator {
        &self.generator
    }

    /// Parse feedback captured at resolution time.
    #[must_use]
    pub const fn feedback(&self) -> Option<&ParseFeedback> {
        self.feedback.as_ref()
    }
}

/// Payload of a module outside the two source categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherModule {
    problem: Option<String>,
}

impl OtherModule {
    /// A module with no known problems.
    #[must_use]
    pub const fn valid() -> Self {
        Self { problem: None }
    }

    /// A module that failed validation for the given reason.
    #[must_use]
    pub fn invalid(problem: impl Into<String>) -> Self {
        Self {
            problem: Some(problem.into()),
        }
    }

    /// Description of the validation failure, if any.
    #[must_use]
    pub fn problem(&self) -> Option<&str> {
        self.problem.as_deref()
    }
}

/// Kind-specific payload of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleBody {
    /// Class or enhancement.
    Ordinary(OrdinaryModule),
    /// Template.
    Template(TemplateModule),
    /// Anything else.
    Other(OtherModule),
}

/// A module resolved by the module system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: ModuleName,
    origin: ModuleOrigin,
    body: ModuleBody,
}

impl Module {
    /// Assembles a module.
    #[must_use]
    pub const fn new(name: ModuleName, origin: ModuleOrigin, body: ModuleBody) -> Self {
        Self { name, origin, body }
    }

    /// Fully qualified name.
    #[must_use]
    pub const fn name(&self) -> &ModuleName {
        &self.name
    }

    /// Where the module came from.
    #[must_use]
    pub const fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    /// Kind-specific payload.
    #[must_use]
    pub const fn body(&self) -> &ModuleBody {
        &self.body
    }

    /// Verification category.
    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        match self.body {
            ModuleBody::Ordinary(_) => ModuleKind::OrdinaryType,
            ModuleBody::Template(_) => ModuleKind::TemplateType,
            ModuleBody::Other(_) => ModuleKind::Other,
        }
    }

    /// Returns `true` when the module compiled without problems.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        match &self.body {
            ModuleBody::Ordinary(ordinary) => ordinary.feedback.is_none(),
            ModuleBody::Template(template) => template.feedback.is_none(),
            ModuleBody::Other(other) => other.problem.is_none(),
        }
    }
}
