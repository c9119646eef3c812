//! Core parsing trait.
//!
//! Each dialect implements [`DdlParser`] with its own algorithm (AST walk,
//! line heuristics, grammar walk). The orchestrator only ever sees the
//! uniform [`ParseOutput`] they produce.

use crate::error::Result;

use super::schema::ParseOutput;

/// Parse a raw DDL document into tables.
///
/// Implementations are stateless: every call starts from scratch, so parsing
/// the same document twice yields identical output.
pub trait DdlParser: Send + Sync {
    /// Dialect identifier (e.g., "postgres", "mysql", "sqlserver").
    fn name(&self) -> &str;

    /// Parse the DDL text.
    ///
    /// Only fails for dialects with a hard failure contract; best-effort
    /// parsers report problems through [`ParseOutput::diagnostics`].
    fn parse(&self, sql: &str) -> Result<ParseOutput>;

    /// Whether this dialect extracts declared column types, which enables
    /// the column-type lookup in generated code.
    fn provides_types(&self) -> bool {
        false
    }
}
