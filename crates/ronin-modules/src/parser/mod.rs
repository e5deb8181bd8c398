//! Source parsing for classes, enhancements and templates.
//!
//! The parser performs the structural checks the module system needs to
//! decide whether a module compiled: comments, literals and delimiters must
//! be well formed and, for ordinary types, the file must declare a type named
//! after itself in the package its location implies. Templates are first
//! turned into code by a [`TemplateGenerator`] and then checked the same way.

mod lexer;
mod template;

use std::fmt;

use thiserror::Error;

use crate::name::{ModuleName, SourceKind};

pub use self::template::TemplateGenerator;

/// A single problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParseIssue {
    line: usize,
    column: usize,
    message: String,
}

impl ParseIssue {
    /// Creates an issue at a 1-based `(line, column)` position.
    #[must_use]
    pub fn new(position: (usize, usize), message: impl Into<String>) -> Self {
        Self {
            line: position.0,
            column: position.1,
            message: message.into(),
        }
    }

    /// 1-based line.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// 1-based column.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

/// Ordered parse issues for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseFeedback {
    issues: Vec<ParseIssue>,
}

impl ParseFeedback {
    /// Wraps a list of issues.
    #[must_use]
    pub const fn new(issues: Vec<ParseIssue>) -> Self {
        Self { issues }
    }

    /// Returns `None` when there is nothing to report.
    #[must_use]
    pub fn from_issues(issues: Vec<ParseIssue>) -> Option<Self> {
        (!issues.is_empty()).then(|| Self::new(issues))
    }

    /// Issues in source order.
    #[must_use]
    pub fn issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    /// Number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` when there are no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// One rendered line per issue.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Newline-separated rendering of every issue.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

/// Error returned when template code fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template failed verification with {} issue(s)", feedback.len())]
pub struct ParseFailure {
    feedback: ParseFeedback,
}

impl ParseFailure {
    /// Wraps the feedback that caused the failure.
    #[must_use]
    pub const fn new(feedback: ParseFeedback) -> Self {
        Self { feedback }
    }

    /// Issues that caused the failure.
    #[must_use]
    pub const fn feedback(&self) -> &ParseFeedback {
        &self.feedback
    }

    /// Consumes the error, returning its feedback.
    #[must_use]
    pub fn into_feedback(self) -> ParseFeedback {
        self.feedback
    }
}

/// Which checks a [`SourceParser`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    declarations: bool,
}

impl ParserOptions {
    /// Lexical checks plus declaration and directive checks.
    #[must_use]
    pub const fn full() -> Self {
        Self { declarations: true }
    }

    /// Lexical checks only.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            declarations: false,
        }
    }

    /// Returns `true` when declaration checks run.
    #[must_use]
    pub const fn checks_declarations(self) -> bool {
        self.declarations
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::full()
    }
}

const CLASS_KEYWORDS: [&str; 4] = ["class", "interface", "enum", "structure"];
const ENHANCEMENT_KEYWORDS: [&str; 1] = ["enhancement"];

/// Structural parser for module sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceParser {
    options: ParserOptions,
}

impl SourceParser {
    /// Creates a parser with the given options.
    #[must_use]
    pub const fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Options this parser runs with.
    #[must_use]
    pub const fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parses a class or enhancement source for module `name`.
    ///
    /// # Errors
    ///
    /// Returns the collected [`ParseFeedback`] when any check fails.
    pub fn parse_type(
        &self,
        source: &str,
        name: &ModuleName,
        kind: SourceKind,
    ) -> Result<(), ParseFeedback> {
        let scan = lexer::scan(source);
        let mut issues = scan.issues;
        if self.options.declarations {
            check_declarations(&scan.words, name, kind, &mut issues);
            issues.sort();
        }
        ParseFeedback::from_issues(issues).map_or(Ok(()), Err)
    }

    /// Generates and checks a template source.
    ///
    /// Returns the generator alongside any feedback so callers can keep the
    /// generator for later re-verification.
    #[must_use]
    pub fn parse_template(&self, source: &str) -> (TemplateGenerator, Option<ParseFeedback>) {
        let generator = TemplateGenerator::generate(source);
        let feedback = generator.verify(self).err().map(ParseFailure::into_feedback);
        (generator, feedback)
    }

    /// Lexical checks over a code fragment.
    #[must_use]
    pub fn check_code(&self, code: &str) -> Vec<ParseIssue> {
        lexer::scan(code).issues
    }
}

fn check_declarations(
    words: &[lexer::Word],
    name: &ModuleName,
    kind: SourceKind,
    issues: &mut Vec<ParseIssue>,
) {
    let top_level: Vec<&lexer::Word> = words.iter().filter(|word| word.depth == 0).collect();

    check_package(&top_level, name, issues);

    let keywords: &[&str] = match kind {
        SourceKind::Enhancement => &ENHANCEMENT_KEYWORDS,
        SourceKind::Class | SourceKind::Template => &CLASS_KEYWORDS,
    };
    let declared = top_level
        .windows(2)
        .find_map(|pair| match pair {
            [keyword, declared] if keywords.contains(&keyword.text.as_str()) => Some(*declared),
            _ => None,
        });

    match declared {
        Some(word) if word.text != name.simple_name() => issues.push(ParseIssue::new(
            word.position,
            format!(
                "type '{}' must be declared in a file named '{}.{}'",
                word.text,
                word.text,
                kind.extension()
            ),
        )),
        Some(_) => {}
        None => issues.push(ParseIssue::new(
            (1, 1),
            format!(
                "expected {} named '{}'",
                describe_keywords(keywords),
                name.simple_name()
            ),
        )),
    }
}

fn check_package(top_level: &[&lexer::Word], name: &ModuleName, issues: &mut Vec<ParseIssue>) {
    let declared = match top_level {
        [first, second, ..] if first.text == "package" => Some(*second),
        _ => None,
    };
    let Some(package) = declared else {
        return;
    };
    if package.text != name.package() {
        issues.push(ParseIssue::new(
            package.position,
            format!(
                "package '{}' does not match the module location '{}'",
                package.text,
                name.package()
            ),
        ));
    }
}

fn describe_keywords(keywords: &[&str]) -> String {
    match keywords {
        [only] => format!("an {only}"),
        _ => format!("a type declaration ({})", keywords.join(", ")),
    }
}
