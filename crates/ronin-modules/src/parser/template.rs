//! Template code generation.
//!
//! A template mixes literal text with `<% code %>`, `<%= expression %>`,
//! `<%@ directive %>` and `${ expression }` sections. Generation blanks the
//! literal text (newlines survive) so every character of generated code keeps
//! the line and column it had in the template.

use super::lexer::{Cursor, Position};
use super::{ParseFailure, ParseFeedback, ParseIssue, SourceParser};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    position: Position,
    text: String,
}

/// Code generated from a template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateGenerator {
    code: String,
    structure: Vec<ParseIssue>,
    directives: Vec<Directive>,
}

impl TemplateGenerator {
    /// Generates code from a template source.
    #[must_use]
    pub fn generate(source: &str) -> Self {
        let mut generator = Self {
            code: String::with_capacity(source.len()),
            structure: Vec::new(),
            directives: Vec::new(),
        };
        let mut cursor = Cursor::new(source);
        loop {
            let start = cursor.position();
            let Some(current) = cursor.bump() else {
                break;
            };
            match current {
                '<' if cursor.peek() == Some('%') => {
                    cursor.bump();
                    generator.code.push_str("  ");
                    generator.scriptlet(&mut cursor, start);
                }
                '$' if cursor.peek() == Some('{') => {
                    cursor.bump();
                    generator.code.push_str("  ");
                    if !generator.expression(&mut cursor) {
                        generator
                            .structure
                            .push(ParseIssue::new(start, "unterminated '${' expression"));
                    }
                }
                '\n' => generator.code.push('\n'),
                _ => generator.code.push(' '),
            }
        }
        generator
    }

    /// Generated code with template text blanked out.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Checks the generated code with `parser`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFailure`] carrying every structural and lexical issue.
    pub fn verify(&self, parser: &SourceParser) -> Result<(), ParseFailure> {
        let mut issues = self.structure.clone();
        issues.extend(parser.check_code(&self.code));
        if parser.options().checks_declarations() {
            self.check_directives(&mut issues);
        }
        issues.sort();
        ParseFeedback::from_issues(issues)
            .map_or(Ok(()), |feedback| Err(ParseFailure::new(feedback)))
    }

    fn scriptlet(&mut self, cursor: &mut Cursor<'_>, start: Position) {
        let directive = match cursor.peek() {
            Some('@') => {
                cursor.bump();
                self.code.push(' ');
                true
            }
            Some('=') => {
                cursor.bump();
                self.code.push(' ');
                false
            }
            _ => false,
        };
        let mut body = String::new();
        let mut closed = false;
        while let Some(current) = cursor.bump() {
            if current == '%' && cursor.peek() == Some('>') {
                cursor.bump();
                self.code.push_str("  ");
                closed = true;
                break;
            }
            self.code.push(current);
            body.push(current);
        }
        if !closed {
            self.structure
                .push(ParseIssue::new(start, "unterminated '<%' section"));
        }
        if directive {
            self.directives.push(Directive {
                position: start,
                text: body.trim().to_owned(),
            });
        }
    }

    fn expression(&mut self, cursor: &mut Cursor<'_>) -> bool {
        let mut depth = 0_usize;
        while let Some(current) = cursor.bump() {
            match current {
                '{' => depth += 1,
                '}' if depth == 0 => {
                    self.code.push(' ');
                    return true;
                }
                '}' => depth -= 1,
                _ => {}
            }
            self.code.push(current);
        }
        false
    }

    fn check_directives(&self, issues: &mut Vec<ParseIssue>) {
        let mut params = self
            .directives
            .iter()
            .filter(|directive| directive.text.starts_with("params"));
        if params.next().is_some() {
            issues.extend(
                params.map(|duplicate| {
                    ParseIssue::new(duplicate.position, "duplicate 'params' directive")
                }),
            );
        }
    }
}
