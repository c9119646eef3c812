//! Go source template for generated job mapping files.
//!
//! Output is a pure function of the input: same mappings and tables in the
//! same order always produce byte-identical text. The whole file is rendered
//! into memory before anything touches the filesystem.

use std::fmt::Write;

use crate::core::identifier::validate_identifier;
use crate::core::{JobMapping, Table};
use crate::error::{GenError, Result};

use super::package::validate_package_name;

/// Go import path of the package that defines `JobMapping`.
pub const DEFAULT_MAPPINGS_IMPORT: &str =
    "github.com/nucleuscloud/neosync/backend/gen/go/protos/mgmt/v1alpha1";

/// Import alias used for the mappings package in generated code.
pub const MAPPINGS_ALIAS: &str = "mgmtv1alpha1";

/// Name of the function returning the job mapping list.
pub const MAPPINGS_FN: &str = "GetDefaultSyncJobMappings";

/// Name of the function returning the column type lookup.
pub const TYPE_MAP_FN: &str = "GetTableColumnTypeMap";

/// Everything needed to render one generated file.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    pub package_name: &'a str,
    pub source_file: &'a str,
    pub mappings_import: &'a str,
    pub mappings: &'a [JobMapping],
    pub tables: &'a [Table],
    pub include_type_map: bool,
}

impl<'a> Template<'a> {
    pub fn new(
        package_name: &'a str,
        source_file: &'a str,
        mappings: &'a [JobMapping],
        tables: &'a [Table],
    ) -> Self {
        Self {
            package_name,
            source_file,
            mappings_import: DEFAULT_MAPPINGS_IMPORT,
            mappings,
            tables,
            include_type_map: false,
        }
    }

    /// Emit the column type lookup function as well.
    pub fn with_type_map(mut self, enabled: bool) -> Self {
        self.include_type_map = enabled;
        self
    }

    /// Override the Go import path of the mappings package.
    pub fn with_mappings_import(mut self, import: &'a str) -> Self {
        self.mappings_import = import;
        self
    }

    /// Render the complete Go source file.
    pub fn render(&self) -> Result<String> {
        validate_package_name(self.package_name)?;
        for mapping in self.mappings {
            validate_names(&mapping.schema, &mapping.table, Some(&mapping.column))?;
        }

        let mut out = String::new();
        self.write_file(&mut out)
            .map_err(|e| GenError::Render(e.to_string()))?;
        Ok(out)
    }

    fn write_file(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "// Code generated by jobmapping-gen. DO NOT EDIT.")?;
        writeln!(out, "// source: {}", self.source_file.replace('\n', " "))?;
        writeln!(out)?;
        writeln!(out, "package {}", self.package_name)?;
        writeln!(out)?;
        writeln!(out, "import (")?;
        writeln!(out, "\t{} {}", MAPPINGS_ALIAS, go_quote(self.mappings_import))?;
        writeln!(out, ")")?;
        writeln!(out)?;

        writeln!(
            out,
            "func {}() []*{}.JobMapping {{",
            MAPPINGS_FN, MAPPINGS_ALIAS
        )?;
        writeln!(out, "\treturn []*{}.JobMapping{{", MAPPINGS_ALIAS)?;
        for mapping in self.mappings {
            writeln!(out, "\t\t{{")?;
            writeln!(out, "\t\t\tSchema: {},", go_quote(&mapping.schema))?;
            writeln!(out, "\t\t\tTable:  {},", go_quote(&mapping.table))?;
            writeln!(out, "\t\t\tColumn: {},", go_quote(&mapping.column))?;
            writeln!(
                out,
                "\t\t\tTransformer: &{}.JobMappingTransformer{{",
                MAPPINGS_ALIAS
            )?;
            writeln!(
                out,
                "\t\t\t\tSource: {}.TransformerSource_{},",
                MAPPINGS_ALIAS,
                mapping.transformer.go_source_constant()
            )?;
            writeln!(out, "\t\t\t}},")?;
            writeln!(out, "\t\t}},")?;
        }
        writeln!(out, "\t}}")?;
        writeln!(out, "}}")?;

        if self.include_type_map {
            writeln!(out)?;
            self.write_type_map(out)?;
        }
        Ok(())
    }

    fn write_type_map(&self, out: &mut String) -> std::fmt::Result {
        writeln!(
            out,
            "func {}() map[string]map[string]string {{",
            TYPE_MAP_FN
        )?;
        writeln!(out, "\treturn map[string]map[string]string{{")?;
        for (key, columns) in type_map_entries(self.tables) {
            writeln!(out, "\t\t{}: {{", go_quote(&key))?;
            for (column, type_name) in columns {
                writeln!(out, "\t\t\t{}: {},", go_quote(column), go_quote(type_name))?;
            }
            writeln!(out, "\t\t}},")?;
        }
        writeln!(out, "\t}}")?;
        writeln!(out, "}}")
    }
}

/// Group columns by `schema.table`, first occurrence wins, so the Go map
/// literal never repeats a key.
fn type_map_entries(tables: &[Table]) -> Vec<(String, Vec<(&str, &str)>)> {
    let mut entries: Vec<(String, Vec<(&str, &str)>)> = Vec::new();
    for table in tables {
        let key = table.full_name();
        let idx = match entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                entries.push((key, Vec::new()));
                entries.len() - 1
            }
        };
        let columns = &mut entries[idx].1;
        for column in &table.columns {
            if columns.iter().any(|(name, _)| *name == column.name) {
                continue;
            }
            columns.push((
                column.name.as_str(),
                column.type_name.as_deref().unwrap_or_default(),
            ));
        }
    }
    entries
}

fn validate_names(schema: &str, table: &str, column: Option<&str>) -> Result<()> {
    // Postgres tables declared before any schema legitimately have none.
    if !schema.is_empty() {
        validate_identifier(schema)?;
    }
    validate_identifier(table)?;
    if let Some(column) = column {
        validate_identifier(column)?;
    }
    Ok(())
}

/// Quote a string as a Go interpreted string literal.
pub fn go_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                quoted.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
