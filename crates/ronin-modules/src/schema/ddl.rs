//! Minimal `CREATE TABLE` reader for schema files.

const CONSTRAINT_KEYWORDS: [&str; 7] = [
    "CONSTRAINT",
    "PRIMARY",
    "FOREIGN",
    "UNIQUE",
    "CHECK",
    "INDEX",
    "KEY",
];

/// Table declared in a schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    name: String,
    columns: Vec<String>,
}

impl TableDefinition {
    /// Table name without schema qualifier or quotes.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Literal,
    Open,
    Close,
    Comma,
    End,
}

impl Token {
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Word(word) if word.eq_ignore_ascii_case(keyword))
    }
}

/// Extracts every `CREATE TABLE` statement from `ddl`.
#[must_use]
pub fn parse_tables(ddl: &str) -> Vec<TableDefinition> {
    let tokens = tokenize(ddl);
    let mut tables = Vec::new();
    let mut remaining = tokens.as_slice();
    while let Some((first, rest)) = remaining.split_first() {
        remaining = rest;
        let starts_table = first.is_keyword("CREATE")
            && rest.first().is_some_and(|token| token.is_keyword("TABLE"));
        if !starts_table {
            continue;
        }
        let (table, after) = parse_table(rest.get(1..).unwrap_or_default());
        if let Some(definition) = table {
            tables.push(definition);
        }
        remaining = after;
    }
    tables
}

fn parse_table(tokens: &[Token]) -> (Option<TableDefinition>, &[Token]) {
    let mut remaining = tokens;
    if remaining.first().is_some_and(|token| token.is_keyword("IF")) {
        remaining = remaining.get(3..).unwrap_or_default();
    }
    let Some((Token::Word(qualified), rest)) = remaining.split_first() else {
        return (None, remaining);
    };
    let name = qualified
        .rsplit('.')
        .next()
        .unwrap_or(qualified.as_str())
        .to_owned();
    let Some((Token::Open, body)) = rest.split_first() else {
        return (None, rest);
    };

    let mut columns = Vec::new();
    let mut item: Vec<&Token> = Vec::new();
    let mut depth = 1_usize;
    let mut consumed = 0_usize;
    for token in body {
        consumed += 1;
        match token {
            Token::Open => depth += 1,
            Token::Close if depth == 1 => {
                push_column(&item, &mut columns);
                break;
            }
            Token::Close => depth -= 1,
            Token::Comma if depth == 1 => {
                push_column(&item, &mut columns);
                item.clear();
                continue;
            }
            Token::End => break,
            _ => {}
        }
        if depth == 1 {
            item.push(token);
        }
    }
    let after = body.get(consumed..).unwrap_or_default();
    (Some(TableDefinition { name, columns }), after)
}

fn push_column(item: &[&Token], columns: &mut Vec<String>) {
    let Some(Token::Word(first)) = item.first() else {
        return;
    };
    let constraint = CONSTRAINT_KEYWORDS
        .iter()
        .any(|keyword| first.eq_ignore_ascii_case(keyword));
    if !constraint {
        columns.push(first.clone());
    }
}

fn tokenize(ddl: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = ddl.chars().peekable();
    while let Some(current) = chars.next() {
        match current {
            '-' if chars.peek() == Some(&'-') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            ',' => tokens.push(Token::Comma),
            ';' => tokens.push(Token::End),
            '\'' => {
                for skipped in chars.by_ref() {
                    if skipped == '\'' {
                        break;
                    }
                }
                tokens.push(Token::Literal);
            }
            '"' | '`' => {
                let word: String = chars.by_ref().take_while(|c| *c != current).collect();
                tokens.push(Token::Word(word));
            }
            c if c.is_whitespace() => {}
            c => {
                let mut word = String::from(c);
                while let Some(next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '(' | ')' | ',' | ';') {
                        break;
                    }
                    word.push(*next);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    tokens
}
