//! Line-oriented MySQL DDL scanner.
//!
//! Each trimmed line is tested against a fixed set of shapes, in priority
//! order:
//!
//! 1. `USE <schema>;` switches the current schema (an open table stays open)
//! 2. `CREATE TABLE [IF NOT EXISTS] <schema>.<table> (` opens a qualified table
//! 3. `CREATE TABLE [IF NOT EXISTS] <table> (` opens a table in the current schema
//! 4. inside a table, `<identifier> <type...>` is a column unless the leading
//!    word is a key/constraint keyword
//! 5. inside a table, a line starting with `)` commits the table
//!
//! Tables are collected by `(schema, table)` so a table declared twice is
//! merged, and finalized in first-seen order once the whole document is
//! scanned. A table that ends up with no columns is dropped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::traits::DdlParser;
use crate::core::{Column, Diagnostic, ParseOutput, Table};
use crate::error::Result;

static USE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^USE\s+`?(\w+)`?\s*;").expect("valid USE pattern"));

static CREATE_QUALIFIED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?`?(\w+)`?\s*\.\s*`?(\w+)`?\s*\(")
        .expect("valid CREATE TABLE pattern")
});

static CREATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?`?(\w+)`?\s*\(")
        .expect("valid CREATE TABLE pattern")
});

static COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(`?)(\w+)`?\s+[\w()]+").expect("valid column pattern")
});

/// Leading words that introduce keys, indexes or constraints rather than
/// columns. Compared case-insensitively, and only for unquoted words.
const NON_COLUMN_WORDS: &[&str] = &[
    "primary",
    "constraint",
    "key",
    "unique",
    "alter",
    "index",
    "foreign",
    "fulltext",
    "spatial",
    "check",
];

/// Line prefixes that are part of a table body but never columns.
const STRUCTURAL_PREFIXES: &[&str] = &[
    "PRIMARY KEY",
    "CONSTRAINT",
    "UNIQUE",
    "KEY",
    "ENGINE",
    "INDEX",
    "FOREIGN KEY",
    "FULLTEXT",
    "SPATIAL",
    "CHECK",
];

/// MySQL parser.
#[derive(Debug, Clone, Default)]
pub struct MysqlParser;

impl MysqlParser {
    /// Create a new MySQL parser instance.
    pub fn new() -> Self {
        Self
    }
}

impl DdlParser for MysqlParser {
    fn name(&self) -> &str {
        "mysql"
    }

    fn parse(&self, sql: &str) -> Result<ParseOutput> {
        let mut scan = Scan::default();
        for (idx, raw) in sql.lines().enumerate() {
            scan.line(idx + 1, raw.trim());
        }
        Ok(scan.finish())
    }
}

/// Table currently being accumulated.
#[derive(Debug)]
struct OpenTable {
    schema: String,
    name: String,
    opened_at: usize,
    columns: Vec<String>,
}

/// Scanner state for one document.
#[derive(Debug, Default)]
struct Scan {
    current_schema: String,
    open: Option<OpenTable>,
    /// Insertion-ordered `(schema, table)` → column names.
    order: Vec<(String, String)>,
    columns: HashMap<(String, String), Vec<String>>,
    diagnostics: Vec<Diagnostic>,
}

impl Scan {
    fn line(&mut self, line_no: usize, line: &str) {
        if let Some(caps) = USE_RE.captures(line) {
            self.current_schema = caps[1].to_string();
        } else if let Some(caps) = CREATE_QUALIFIED_RE.captures(line) {
            self.current_schema = caps[1].to_string();
            self.open_table(line_no, caps[2].to_string());
        } else if let Some(caps) = CREATE_RE.captures(line) {
            self.open_table(line_no, caps[1].to_string());
        } else if self.open.is_some() {
            self.table_body_line(line_no, line);
        } else if line.starts_with(')') {
            self.diagnostics.push(Diagnostic::at_line(
                line_no,
                "closing parenthesis without an open CREATE TABLE",
            ));
        }
    }

    fn open_table(&mut self, line_no: usize, name: String) {
        if let Some(previous) = self.open.take() {
            self.diagnostics.push(Diagnostic::at_line(
                line_no,
                format!(
                    "table {}.{} (line {}) was not closed before the next CREATE TABLE",
                    previous.schema, previous.name, previous.opened_at
                ),
            ));
            self.commit(previous);
        }
        if self.current_schema.is_empty() {
            self.diagnostics.push(Diagnostic::at_line(
                line_no,
                format!("table {} has no schema (no USE or qualifier seen)", name),
            ));
        }
        self.open = Some(OpenTable {
            schema: self.current_schema.clone(),
            name,
            opened_at: line_no,
            columns: Vec::new(),
        });
    }

    fn table_body_line(&mut self, line_no: usize, line: &str) {
        if let Some(caps) = COLUMN_RE.captures(line) {
            let quoted = !caps[1].is_empty();
            let word = &caps[2];
            if !quoted && is_non_column_word(word) {
                return;
            }
            if let Some(open) = self.open.as_mut() {
                open.columns.push(word.to_string());
            }
        } else if line.starts_with(')') {
            if let Some(open) = self.open.take() {
                self.commit(open);
            }
        } else if !is_ignorable(line) {
            self.diagnostics.push(Diagnostic::at_line(
                line_no,
                format!("unrecognized line inside table body skipped: {}", line),
            ));
        }
    }

    fn commit(&mut self, table: OpenTable) {
        debug!(
            "mysql: {}.{} with {} columns",
            table.schema,
            table.name,
            table.columns.len()
        );
        let key = (table.schema, table.name);
        match self.columns.get_mut(&key) {
            Some(existing) => existing.extend(table.columns),
            None => {
                self.order.push(key.clone());
                self.columns.insert(key, table.columns);
            }
        }
    }

    fn finish(mut self) -> ParseOutput {
        if let Some(open) = self.open.take() {
            self.diagnostics.push(Diagnostic::at_line(
                open.opened_at,
                format!(
                    "table {}.{} is never closed; keeping {} columns seen",
                    open.schema,
                    open.name,
                    open.columns.len()
                ),
            ));
            self.commit(open);
        }

        let mut columns = self.columns;
        let mut tables = Vec::with_capacity(self.order.len());
        for (schema, name) in self.order {
            let cols = columns.remove(&(schema.clone(), name.clone())).unwrap_or_default();
            if cols.is_empty() {
                self.diagnostics.push(Diagnostic::new(format!(
                    "table {}.{} declares no columns; skipped",
                    schema, name
                )));
                continue;
            }
            tables.push(Table::new(schema, name, cols.into_iter().map(Column::new).collect()));
        }

        ParseOutput::new(tables, self.diagnostics)
    }
}

fn is_non_column_word(word: &str) -> bool {
    NON_COLUMN_WORDS
        .iter()
        .any(|w| w.eq_ignore_ascii_case(word))
}

fn is_ignorable(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    line.is_empty()
        || line.starts_with("--")
        || line.starts_with('#')
        || line.starts_with("/*")
        || STRUCTURAL_PREFIXES.iter().any(|p| upper.starts_with(p))
}
