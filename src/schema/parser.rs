use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{
    Column, ForeignKeyDef, IndexDef, IndexKind, TableSchema, strip_auto_increment,
};

/// Parses one `SHOW CREATE TABLE` text into a [`TableSchema`].
///
/// Empty text yields an empty schema (the table is absent on that side).
/// Text without a parenthesised column block yields a schema with no columns,
/// which callers also treat as absent.
pub fn parse_table(name: &str, definition: &str) -> TableSchema {
    let mut schema = TableSchema {
        name: name.to_string(),
        raw: definition.to_string(),
        ..TableSchema::default()
    };
    if definition.trim().is_empty() {
        return schema;
    }

    let Some((open, close)) = find_column_block(definition) else {
        debug!(table = name, "definition has no column block");
        return schema;
    };
    schema.body_end = close + 1;
    schema.tail = strip_auto_increment(definition[close + 1..].trim()).trim().to_string();

    for clause in split_clauses(&definition[open + 1..close]) {
        match classify(clause) {
            Some(Clause::Column(column)) => schema.columns.push(column),
            Some(Clause::Index(index)) => {
                schema.indexes.insert(index.name.clone(), index);
            }
            Some(Clause::ForeignKey(fk)) => {
                schema.foreign_keys.insert(fk.name.clone(), fk);
            }
            None => debug!(table = name, clause, "skipping unrecognised clause"),
        }
    }

    schema
}

enum Clause {
    Column(Column),
    Index(IndexDef),
    ForeignKey(ForeignKeyDef),
}

fn classify(clause: &str) -> Option<Clause> {
    if clause.starts_with('`') {
        let (name, _) = read_identifier(clause)?;
        return Some(Clause::Column(Column {
            name,
            definition: strip_charset(clause),
        }));
    }

    let upper = clause.to_ascii_uppercase();
    if upper.starts_with("PRIMARY KEY") {
        return Some(index(IndexKind::Primary, "PRIMARY".to_string(), clause));
    }

    let kind = if upper.starts_with("UNIQUE ") {
        IndexKind::Unique
    } else if upper.starts_with("KEY ") || upper.starts_with("INDEX ") {
        IndexKind::Index
    } else if upper.starts_with("FULLTEXT ") {
        IndexKind::Fulltext
    } else if upper.starts_with("SPATIAL ") {
        IndexKind::Spatial
    } else if upper.starts_with("CONSTRAINT ") {
        return classify_constraint(clause);
    } else {
        return None;
    };
    let name = first_identifier(clause)?;
    Some(index(kind, name, clause))
}

fn classify_constraint(clause: &str) -> Option<Clause> {
    let start = clause.find('`')?;
    let (name, rest) = read_identifier(&clause[start..])?;
    let rest_upper = rest.trim_start().to_ascii_uppercase();

    if rest_upper.starts_with("FOREIGN KEY") {
        return Some(Clause::ForeignKey(ForeignKeyDef {
            referenced_table: referenced_table(rest).unwrap_or_default(),
            name,
            sql: clause.to_string(),
        }));
    }
    if rest_upper.starts_with("CHECK") {
        return Some(index(IndexKind::Check, name, clause));
    }
    None
}

fn index(kind: IndexKind, name: String, clause: &str) -> Clause {
    Clause::Index(IndexDef {
        name,
        kind,
        sql: clause.to_string(),
    })
}

/// Table named after `REFERENCES`, without any database qualifier.
fn referenced_table(text: &str) -> Option<String> {
    let upper = text.to_ascii_uppercase();
    let pos = upper.find("REFERENCES")?;
    let mut rest = text[pos + "REFERENCES".len()..].trim_start();
    let (mut table, after) = read_identifier(rest)?;
    rest = after;
    while let Some(qualified) = rest.strip_prefix('.') {
        let (next, after) = read_identifier(qualified)?;
        table = next;
        rest = after;
    }
    Some(table)
}

fn first_identifier(clause: &str) -> Option<String> {
    let start = clause.find('`')?;
    read_identifier(&clause[start..]).map(|(name, _)| name)
}

/// Reads a backtick-quoted identifier at the start of `text` and returns it
/// with the remaining text. A doubled backtick is an escaped backtick.
fn read_identifier(text: &str) -> Option<(String, &str)> {
    let body = text.strip_prefix('`')?;
    let mut name = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '`' {
            if let Some((_, '`')) = chars.peek() {
                chars.next();
                name.push('`');
                continue;
            }
            return Some((name, &body[idx + 1..]));
        }
        name.push(ch);
    }
    None
}

/// Column charsets may be display-only on some servers; never diff on them.
fn strip_charset(definition: &str) -> String {
    charset_re().replace_all(definition, "").to_string()
}

fn charset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+CHARACTER SET [A-Za-z0-9_]+").expect("valid regex"))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Backtick,
    Single,
    Double,
}

struct Scanner {
    quote: Quote,
    escaped: bool,
}

impl Scanner {
    fn new() -> Self {
        Self {
            quote: Quote::None,
            escaped: false,
        }
    }

    /// Feeds one character; returns true when it is outside any quoted text.
    fn feed(&mut self, ch: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return false;
        }
        match (self.quote, ch) {
            (Quote::None, '`') => self.quote = Quote::Backtick,
            (Quote::None, '\'') => self.quote = Quote::Single,
            (Quote::None, '"') => self.quote = Quote::Double,
            (Quote::None, _) => return true,
            (Quote::Single | Quote::Double, '\\') => self.escaped = true,
            (Quote::Backtick, '`') | (Quote::Single, '\'') | (Quote::Double, '"') => {
                self.quote = Quote::None
            }
            _ => {}
        }
        false
    }
}

/// Byte offsets of the outer `(` and its matching `)`.
fn find_column_block(text: &str) -> Option<(usize, usize)> {
    let mut scanner = Scanner::new();
    let mut depth = 0usize;
    let mut open = None;
    for (idx, ch) in text.char_indices() {
        if !scanner.feed(ch) {
            continue;
        }
        match ch {
            '(' => {
                if depth == 0 && open.is_none() {
                    open = Some(idx);
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return open.map(|start| (start, idx));
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits the column block on top-level commas, trimming each clause.
fn split_clauses(body: &str) -> Vec<&str> {
    let mut scanner = Scanner::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut clauses = Vec::new();
    for (idx, ch) in body.char_indices() {
        if !scanner.feed(ch) {
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                clauses.push(body[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    clauses.push(body[start..].trim());
    clauses.retain(|clause| !clause.is_empty());
    clauses
}
