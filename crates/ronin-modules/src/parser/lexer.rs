//! Character-level scanner shared by type and template parsing.

use std::iter::Peekable;
use std::str::Chars;

use super::ParseIssue;

/// Line and column of a character, both starting at 1.
pub(crate) type Position = (usize, usize);

pub(crate) struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub(crate) const fn position(&self) -> Position {
        (self.line, self.column)
    }

    pub(crate) fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let current = self.chars.next()?;
        if current == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(current)
    }
}

/// Identifier (dots included) seen while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Word {
    pub(crate) text: String,
    pub(crate) position: Position,
    pub(crate) depth: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub(crate) issues: Vec<ParseIssue>,
    pub(crate) words: Vec<Word>,
}

struct Opener {
    symbol: char,
    position: Position,
}

/// Scans `source` for comment, literal and delimiter problems.
pub(crate) fn scan(source: &str) -> Scan {
    let mut cursor = Cursor::new(source);
    let mut scan = Scan::default();
    let mut open: Vec<Opener> = Vec::new();

    loop {
        let start = cursor.position();
        let Some(current) = cursor.bump() else {
            break;
        };
        match current {
            '/' if cursor.peek() == Some('/') => skip_line(&mut cursor),
            '/' if cursor.peek() == Some('*') => {
                cursor.bump();
                if !skip_block_comment(&mut cursor) {
                    scan.issues
                        .push(ParseIssue::new(start, "unterminated block comment"));
                }
            }
            '"' | '\'' => {
                if !skip_literal(&mut cursor, current) {
                    scan.issues
                        .push(ParseIssue::new(start, "unterminated string literal"));
                }
            }
            '(' | '[' | '{' => open.push(Opener {
                symbol: current,
                position: start,
            }),
            ')' | ']' | '}' => match open.pop() {
                None => scan
                    .issues
                    .push(ParseIssue::new(start, format!("unexpected '{current}'"))),
                Some(opener) if closing_for(opener.symbol) != current => {
                    scan.issues.push(ParseIssue::new(
                        start,
                        format!(
                            "expected '{}' to close '{}' opened at line {}, found '{current}'",
                            closing_for(opener.symbol),
                            opener.symbol,
                            opener.position.0
                        ),
                    ));
                }
                Some(_) => {}
            },
            c if is_word_start(c) => {
                let text = read_word(&mut cursor, c);
                scan.words.push(Word {
                    text,
                    position: start,
                    depth: open.len(),
                });
            }
            _ => {}
        }
    }

    for opener in open {
        scan.issues.push(ParseIssue::new(
            opener.position,
            format!(
                "'{}' is never closed, expected '{}'",
                opener.symbol,
                closing_for(opener.symbol)
            ),
        ));
    }
    scan.issues.sort();
    scan
}

const fn closing_for(symbol: char) -> char {
    match symbol {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn read_word(cursor: &mut Cursor<'_>, first: char) -> String {
    let mut text = String::from(first);
    while let Some(next) = cursor.peek() {
        if !(next.is_alphanumeric() || next == '_' || next == '.') {
            break;
        }
        text.push(next);
        cursor.bump();
    }
    text
}

fn skip_line(cursor: &mut Cursor<'_>) {
    while let Some(next) = cursor.peek() {
        if next == '\n' {
            break;
        }
        cursor.bump();
    }
}

fn skip_block_comment(cursor: &mut Cursor<'_>) -> bool {
    while let Some(current) = cursor.bump() {
        if current == '*' && cursor.peek() == Some('/') {
            cursor.bump();
            return true;
        }
    }
    false
}

fn skip_literal(cursor: &mut Cursor<'_>, quote: char) -> bool {
    loop {
        match cursor.peek() {
            None | Some('\n') => return false,
            Some('\\') => {
                cursor.bump();
                cursor.bump();
            }
            Some(c) if c == quote => {
                cursor.bump();
                return true;
            }
            Some(_) => {
                cursor.bump();
            }
        }
    }
}
