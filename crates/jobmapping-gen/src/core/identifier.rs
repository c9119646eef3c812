//! Identifier handling shared by the dialect parsers and the code generator.
//!
//! Parsers reduce qualified names to `(schema, table)` before building the
//! schema model, and the generator validates every name before it is
//! embedded in generated source.

use crate::error::{GenError, Result};

/// Maximum identifier length in characters (the largest dialect limit).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
/// Counted in characters, not bytes.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier before it is written into generated code.
///
/// Rejects empty identifiers, identifiers containing null bytes or line
/// breaks, and identifiers exceeding the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GenError::Render("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(GenError::Render(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.contains('\n') || name.contains('\r') {
        return Err(GenError::Render(format!(
            "Identifier contains a line break: {:?}",
            name
        )));
    }

    let length = name.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(GenError::Render(format!(
            "Identifier exceeds maximum length of {} characters (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH, length, name
        )));
    }

    Ok(())
}

/// Split a possibly qualified name into `(schema, table)`.
///
/// `db.schema.table` keeps the last two parts; an unqualified name has no
/// schema.
pub fn split_qualified(parts: &[String]) -> (Option<String>, Option<String>) {
    match parts {
        [] => (None, None),
        [table] => (None, Some(table.clone())),
        [.., schema, table] => (Some(schema.clone()), Some(table.clone())),
    }
}

/// Remove T-SQL bracket quoting from declared type text, e.g.
/// `[nvarchar](50)` becomes `nvarchar(50)`.
pub fn strip_type_brackets(type_text: &str) -> String {
    type_text.replace(['[', ']'], "")
}
