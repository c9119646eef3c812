//! Go package naming for generated files.
//!
//! Downstream code imports the generated packages by these names, so the
//! derivation is a fixed string transform and must not change.

use crate::error::{GenError, Result};

/// Tool package from the package argument: its last `_`-separated segment
/// (`workflow_testdata` → `testdata`).
pub fn tool_package(package_arg: &str) -> &str {
    package_arg.rsplit('_').next().unwrap_or(package_arg)
}

/// Package name for a request folder.
///
/// A single-segment folder becomes `<tool>_<folder>`; a deeper folder
/// becomes its last two segments joined by `_`. Hyphens are stripped.
pub fn derive_package_name(tool_package: &str, folder: &str) -> String {
    let segments: Vec<&str> = folder.split('/').collect();
    let name = if segments.len() == 1 {
        format!("{}_{}", tool_package, folder)
    } else {
        segments[segments.len() - 2..].join("_")
    };
    name.replace('-', "")
}

/// Reject names that are not valid Go package identifiers.
pub fn validate_package_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GenError::Render(format!(
            "'{}' is not a valid Go package name",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_package() {
        assert_eq!(tool_package("workflow_testdata"), "testdata");
        assert_eq!(tool_package("testdata"), "testdata");
        assert_eq!(tool_package("a_b_c"), "c");
    }

    #[test]
    fn test_single_segment_folder() {
        assert_eq!(derive_package_name("testdata", "postgres"), "testdata_postgres");
        assert_eq!(
            derive_package_name("testdata", "all-types"),
            "testdata_alltypes"
        );
    }

    #[test]
    fn test_multi_segment_folder_uses_last_two() {
        assert_eq!(derive_package_name("testdata", "postgres/alltypes"), "postgres_alltypes");
        assert_eq!(
            derive_package_name("testdata", "testdata/mysql/multiple-schemas"),
            "mysql_multipleschemas"
        );
    }

    #[test]
    fn test_trailing_slash_is_preserved_as_is() {
        assert_eq!(derive_package_name("testdata", "mssql/simple/"), "simple_");
    }

    #[test]
    fn test_validate_package_name() {
        assert!(validate_package_name("postgres_alltypes").is_ok());
        assert!(validate_package_name("_x1").is_ok());
        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("1abc").is_err());
        assert!(validate_package_name("a.b").is_err());
    }
}
