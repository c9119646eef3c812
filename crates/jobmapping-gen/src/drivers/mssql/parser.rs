//! T-SQL DDL parser.
//!
//! Scripts are cut into `GO` batches and each batch is handed to the
//! `sqlparser` T-SQL grammar. The resulting statements are walked
//! children-first: every column definition of a `CREATE TABLE` is collected
//! into a local context before the table itself is committed.
//!
//! A batch the grammar rejects does not fail the document. It is retried
//! statement by statement. A `CREATE TABLE` that still fails, typically
//! because of scripted storage clauses such as `ON [PRIMARY]` or
//! `PRIMARY KEY CLUSTERED ([Id] ASC) WITH (..)`, is read from its text.
//! Anything else is skipped with a diagnostic.

use sqlparser::ast::{ColumnDef, CreateTable, Statement};
use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::{Parser, ParserError};
use tracing::debug;

use crate::core::identifier::{split_qualified, strip_type_brackets};
use crate::core::traits::DdlParser;
use crate::core::{Column, Diagnostic, ParseOutput, Table};
use crate::drivers::common::fallback::{recover_create_table, RecoveredTable};
use crate::drivers::common::object_name_parts;
use crate::error::Result;

/// Schema assumed for unqualified table names.
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Keywords that start a new top-level statement when a batch has to be
/// split without help from the grammar.
const STATEMENT_KEYWORDS: &[&str] = &[
    "CREATE", "ALTER", "DROP", "SET", "USE", "INSERT", "EXEC", "EXECUTE", "GRANT", "PRINT",
];

/// SQL Server parser.
#[derive(Debug, Clone, Default)]
pub struct MssqlParser;

impl MssqlParser {
    /// Create a new SQL Server parser instance.
    pub fn new() -> Self {
        Self
    }
}

impl DdlParser for MssqlParser {
    fn name(&self) -> &str {
        "sqlserver"
    }

    fn parse(&self, sql: &str) -> Result<ParseOutput> {
        let dialect = MsSqlDialect {};
        let mut tables = Vec::new();
        let mut diagnostics = Vec::new();

        for batch in split_batches(sql) {
            match Parser::parse_sql(&dialect, &batch.text) {
                Ok(statements) => walk(&statements, &mut tables),
                Err(batch_err) => {
                    let pieces = split_statements(&batch);
                    if pieces.len() < 2 {
                        recover(&batch, "batch", batch_err, &mut tables, &mut diagnostics);
                        continue;
                    }
                    debug!(
                        "sqlserver: batch at line {} rejected, retrying {} statements",
                        batch.line,
                        pieces.len()
                    );
                    for piece in pieces {
                        match Parser::parse_sql(&dialect, &piece.text) {
                            Ok(statements) => walk(&statements, &mut tables),
                            Err(e) => recover(&piece, "statement", e, &mut tables, &mut diagnostics),
                        }
                    }
                }
            }
        }

        Ok(ParseOutput::new(tables, diagnostics))
    }

    fn provides_types(&self) -> bool {
        true
    }
}

/// Columns collected for the `CREATE TABLE` node being walked.
struct TableContext {
    schema: String,
    name: String,
    columns: Vec<Column>,
}

impl TableContext {
    fn enter(create: &CreateTable) -> Self {
        let (schema, name) = split_qualified(&object_name_parts(&create.name));
        Self {
            schema: schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            name: name.unwrap_or_default(),
            columns: Vec::new(),
        }
    }

    fn recovered(table: RecoveredTable) -> Self {
        let (schema, name) = split_qualified(&table.name_parts);
        Self {
            schema: schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            name: name.unwrap_or_default(),
            columns: table.columns,
        }
    }

    fn column(&mut self, def: &ColumnDef) {
        let type_text = strip_type_brackets(&def.data_type.to_string());
        self.columns
            .push(Column::with_type(def.name.value.clone(), type_text));
    }

    fn exit(self) -> Table {
        debug!(
            "sqlserver: {}.{} with {} columns",
            self.schema,
            self.name,
            self.columns.len()
        );
        Table::new(self.schema, self.name, self.columns)
    }
}

fn walk(statements: &[Statement], tables: &mut Vec<Table>) {
    for statement in statements {
        if let Statement::CreateTable(create) = statement {
            let mut context = TableContext::enter(create);
            for def in &create.columns {
                context.column(def);
            }
            tables.push(context.exit());
        }
    }
}

/// Read a rejected `CREATE TABLE` from its text, or skip the unit with a
/// diagnostic.
fn recover(
    unit: &Batch,
    kind: &str,
    err: ParserError,
    tables: &mut Vec<Table>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match recover_create_table(&unit.text) {
        Some(table) => {
            debug!(
                "sqlserver: line {}: reading CREATE TABLE from text ({})",
                unit.line, err
            );
            tables.push(TableContext::recovered(table).exit());
        }
        None => diagnostics.push(Diagnostic::at_line(
            unit.line,
            format!("skipped unparseable {}: {}", kind, err),
        )),
    }
}

/// A slice of the script with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Batch {
    line: usize,
    text: String,
}

/// `GO` (optionally followed by a repeat count) on a line of its own.
fn is_batch_separator(line: &str) -> bool {
    let mut words = line.trim().trim_end_matches(';').split_whitespace();
    let is_go = matches!(words.next(), Some(w) if w.eq_ignore_ascii_case("go"));
    is_go && words.all(|w| w.chars().all(|c| c.is_ascii_digit()))
}

/// Split a script into `GO`-separated batches, dropping empty ones.
fn split_batches(sql: &str) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current = String::new();
    let mut start_line = 1;

    for (idx, line) in sql.lines().enumerate() {
        if is_batch_separator(line) {
            push_batch(&mut batches, start_line, std::mem::take(&mut current));
            start_line = idx + 2;
            continue;
        }
        if current.is_empty() && line.trim().is_empty() {
            start_line = idx + 2;
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    push_batch(&mut batches, start_line, current);

    batches
}

fn push_batch(batches: &mut Vec<Batch>, line: usize, text: String) {
    if !text.trim().is_empty() {
        batches.push(Batch { line, text });
    }
}

/// Split a batch at lines that begin a new top-level statement.
fn split_statements(batch: &Batch) -> Vec<Batch> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut start_line = batch.line;

    for (idx, line) in batch.text.lines().enumerate() {
        let line_no = batch.line + idx;
        if starts_statement(line) && !current.trim().is_empty() {
            push_batch(&mut pieces, start_line, std::mem::take(&mut current));
        }
        if current.trim().is_empty() {
            start_line = line_no;
        }
        current.push_str(line);
        current.push('\n');
    }
    push_batch(&mut pieces, start_line, current);

    pieces
}

fn starts_statement(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .map(|word| {
            STATEMENT_KEYWORDS
                .iter()
                .any(|k| k.eq_ignore_ascii_case(word))
        })
        .unwrap_or(false)
}
