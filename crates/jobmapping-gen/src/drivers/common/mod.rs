//! Helpers shared by the AST-backed dialect parsers.
//!
//! [`fallback`] reads `CREATE TABLE` statements from text when the grammar
//! rejects them.

pub mod fallback;

use sqlparser::ast::{ObjectName, SchemaName};

/// Unquoted parts of a (possibly qualified) object name.
pub fn object_name_parts(name: &ObjectName) -> Vec<String> {
    name.0.iter().map(|ident| ident.value.clone()).collect()
}

/// Name of the schema created by a `CREATE SCHEMA` statement.
///
/// `CREATE SCHEMA AUTHORIZATION joe` creates a schema named after the role.
pub fn schema_name(schema: &SchemaName) -> Option<String> {
    match schema {
        SchemaName::Simple(name) | SchemaName::NamedAuthorization(name, _) => {
            name.0.last().map(|ident| ident.value.clone())
        }
        SchemaName::UnnamedAuthorization(role) => Some(role.value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::ast::Ident;

    #[test]
    fn test_object_name_parts_unquotes() {
        let name = ObjectName(vec![Ident::with_quote('"', "Sales"), Ident::new("orders")]);
        assert_eq!(object_name_parts(&name), vec!["Sales", "orders"]);
    }

    #[test]
    fn test_schema_name_variants() {
        let simple = SchemaName::Simple(ObjectName(vec![Ident::new("public")]));
        assert_eq!(schema_name(&simple), Some("public".to_string()));

        let unnamed = SchemaName::UnnamedAuthorization(Ident::new("joe"));
        assert_eq!(schema_name(&unnamed), Some("joe".to_string()));

        let named = SchemaName::NamedAuthorization(
            ObjectName(vec![Ident::new("reports")]),
            Ident::new("joe"),
        );
        assert_eq!(schema_name(&named), Some("reports".to_string()));
    }
}
