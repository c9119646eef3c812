//! Schema model shared by every dialect parser.
//!
//! Parsers build [`Table`] values with columns in declaration order and hand
//! them off fully constructed; nothing downstream mutates them.

use serde::{Deserialize, Serialize};

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unquoted).
    pub name: String,

    /// Declared type text. Only the T-SQL parser fills this in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl Column {
    /// Column without type information.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
        }
    }

    /// Column with its declared type text.
    pub fn with_type(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
        }
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Schema name.
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Column definitions in declaration order.
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
        }
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Transformation applied to a column during data synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformerKind {
    /// Copy the value unchanged.
    #[default]
    Passthrough,
}

impl TransformerKind {
    /// Name of the `TransformerSource` constant in the generated Go code.
    pub fn go_source_constant(&self) -> &'static str {
        match self {
            TransformerKind::Passthrough => "TRANSFORMER_SOURCE_PASSTHROUGH",
        }
    }

    /// Inverse of [`go_source_constant`](Self::go_source_constant).
    pub fn from_go_source_constant(constant: &str) -> Option<Self> {
        match constant {
            "TRANSFORMER_SOURCE_PASSTHROUGH" => Some(TransformerKind::Passthrough),
            _ => None,
        }
    }
}

/// Per-column synchronization directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMapping {
    pub schema: String,
    pub table: String,
    pub column: String,
    #[serde(default)]
    pub transformer: TransformerKind,
}

/// Non-fatal note produced while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based source line, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Tables recovered from one DDL document plus anything worth warning about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub tables: Vec<Table>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn new(tables: Vec<Table>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            tables,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let table = Table::new("public", "users", vec![Column::new("id")]);
        assert_eq!(table.full_name(), "public.users");
        assert_eq!(table.column_names(), vec!["id"]);
    }

    #[test]
    fn test_transformer_kind_default_is_passthrough() {
        assert_eq!(TransformerKind::default(), TransformerKind::Passthrough);
        let constant = TransformerKind::Passthrough.go_source_constant();
        assert_eq!(
            TransformerKind::from_go_source_constant(constant),
            Some(TransformerKind::Passthrough)
        );
        assert_eq!(TransformerKind::from_go_source_constant("TRANSFORMER_SOURCE_NULL"), None);
    }

    #[test]
    fn test_diagnostic_display() {
        assert_eq!(
            Diagnostic::at_line(4, "skipped batch").to_string(),
            "line 4: skipped batch"
        );
        assert_eq!(Diagnostic::new("no tables").to_string(), "no tables");
    }

    #[test]
    fn test_column_serializes_without_empty_type() {
        let json = serde_json::to_string(&Column::new("id")).unwrap();
        assert_eq!(json, r#"{"name":"id"}"#);
    }
}
