//! PostgreSQL DDL parser backed by the `sqlparser` AST.
//!
//! The statement list is walked once in document order. Schema attribution
//! is positional: every `CREATE TABLE` belongs to the most recent
//! `CREATE SCHEMA`, whatever qualifier the table name itself carries. Dumps
//! that interleave schemas and tables out of order are attributed wrongly;
//! such mismatches are reported as diagnostics rather than corrected.
//!
//! When the grammar rejects the document, it is split at top-level
//! semicolons and walked statement by statement. A rejected `CREATE TABLE`
//! or `CREATE SCHEMA` is read from its text; any other rejected statement
//! that begins with a known keyword (`CREATE SEQUENCE .. INCREMENT BY`,
//! `CREATE DOMAIN`, ...) is skipped with a diagnostic. Text that is not a
//! statement at all, or a `CREATE TABLE` whose column list cannot be read,
//! fails the document as malformed.

use sqlparser::ast::{CreateTable, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::core::identifier::split_qualified;
use crate::core::traits::DdlParser;
use crate::core::{Column, Diagnostic, ParseOutput, Table};
use crate::drivers::common::fallback::{
    is_create_table, recover_create_schema, recover_create_table, split_statements, Chunk,
};
use crate::drivers::common::{object_name_parts, schema_name};
use crate::error::{GenError, Result};

/// Leading keywords of statements that may be skipped when the grammar
/// rejects them.
const STATEMENT_KEYWORDS: &[&str] = &[
    "ALTER", "ANALYZE", "BEGIN", "CALL", "CLUSTER", "COMMENT", "COMMIT", "COPY", "CREATE", "DO",
    "DROP", "GRANT", "INSERT", "LOCK", "REFRESH", "RESET", "REVOKE", "SECURITY", "SELECT", "SET",
    "TRUNCATE", "UPDATE", "VACUUM", "WITH",
];

/// PostgreSQL parser.
#[derive(Debug, Clone, Default)]
pub struct PostgresParser;

impl PostgresParser {
    /// Create a new PostgreSQL parser instance.
    pub fn new() -> Self {
        Self
    }
}

/// Accumulator threaded through the statement walk.
#[derive(Debug, Default)]
struct WalkState {
    current_schema: Option<String>,
    tables: Vec<Table>,
    diagnostics: Vec<Diagnostic>,
}

impl WalkState {
    /// Attribute a table to the current schema and record it.
    fn push_table(&mut self, qualifier: Option<String>, name: String, columns: Vec<Column>) {
        let schema = self.current_schema.clone().unwrap_or_default();

        match &qualifier {
            Some(q) if schema.is_empty() => self.diagnostics.push(Diagnostic::new(format!(
                "table {}.{} appears before any CREATE SCHEMA; attributed to an empty schema",
                q, name
            ))),
            Some(q) if *q != schema => self.diagnostics.push(Diagnostic::new(format!(
                "table {}.{} attributed to preceding schema '{}'",
                q, name, schema
            ))),
            None if schema.is_empty() => self.diagnostics.push(Diagnostic::new(format!(
                "table {} appears before any CREATE SCHEMA; attributed to an empty schema",
                name
            ))),
            _ => {}
        }

        self.tables.push(Table::new(schema, name, columns));
    }
}

impl DdlParser for PostgresParser {
    fn name(&self) -> &str {
        "postgres"
    }

    fn parse(&self, sql: &str) -> Result<ParseOutput> {
        let dialect = PostgreSqlDialect {};
        let state = match Parser::parse_sql(&dialect, sql) {
            Ok(statements) => statements
                .iter()
                .fold(WalkState::default(), visit_statement),
            Err(e) => {
                debug!("postgres: document rejected ({}), parsing statement by statement", e);
                split_statements(sql)
                    .iter()
                    .try_fold(WalkState::default(), |state, chunk| {
                        visit_chunk(state, chunk, &dialect)
                    })?
            }
        };

        match state.current_schema {
            Some(schema) if !schema.is_empty() => {
                debug!(
                    "postgres: {} tables, last schema '{}'",
                    state.tables.len(),
                    schema
                );
                Ok(ParseOutput::new(state.tables, state.diagnostics))
            }
            _ => Err(GenError::SchemaUndetermined),
        }
    }
}

fn visit_statement(mut state: WalkState, statement: &Statement) -> WalkState {
    match statement {
        Statement::CreateSchema { schema_name: name, .. } => {
            state.current_schema = schema_name(name);
        }
        Statement::CreateTable(create) => visit_create_table(create, &mut state),
        _ => {}
    }
    state
}

fn visit_create_table(create: &CreateTable, state: &mut WalkState) {
    let (qualifier, name) = split_qualified(&object_name_parts(&create.name));

    // Table-level constraints live in `create.constraints`, never in `columns`.
    let columns = create
        .columns
        .iter()
        .map(|def| Column::new(def.name.value.clone()))
        .collect();

    state.push_table(qualifier, name.unwrap_or_default(), columns);
}

/// Walk one statement of a document the grammar rejected as a whole.
fn visit_chunk(
    mut state: WalkState,
    chunk: &Chunk,
    dialect: &PostgreSqlDialect,
) -> Result<WalkState> {
    let err = match Parser::parse_sql(dialect, &chunk.text) {
        Ok(statements) => return Ok(statements.iter().fold(state, visit_statement)),
        Err(e) => e,
    };

    if let Some(table) = recover_create_table(&chunk.text) {
        debug!("postgres: line {}: reading CREATE TABLE from text ({})", chunk.line, err);
        let (qualifier, name) = split_qualified(&table.name_parts);
        let columns = table
            .columns
            .into_iter()
            .map(|column| Column::new(column.name))
            .collect();
        state.push_table(qualifier, name.unwrap_or_default(), columns);
    } else if is_create_table(&chunk.text) || !starts_with_keyword(&chunk.text) {
        return Err(GenError::MalformedDdl(format!("line {}: {}", chunk.line, err)));
    } else if let Some(schema) = recover_create_schema(&chunk.text) {
        state.current_schema = Some(schema);
    } else {
        state.diagnostics.push(Diagnostic::at_line(
            chunk.line,
            format!("skipped unsupported statement: {}", err),
        ));
    }

    Ok(state)
}

fn starts_with_keyword(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .find(|word| !word.is_empty())
        .map(|word| STATEMENT_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Result<ParseOutput> {
        PostgresParser::new().parse(sql)
    }

    #[test]
    fn test_schema_and_table() {
        let output = parse(
            "CREATE SCHEMA public; CREATE TABLE public.users (id int, email text);",
        )
        .unwrap();

        assert_eq!(output.tables.len(), 1);
        let table = &output.tables[0];
        assert_eq!(table.schema, "public");
        assert_eq!(table.name, "users");
        assert_eq!(table.column_names(), vec!["id", "email"]);
        assert!(table.columns.iter().all(|c| c.type_name.is_none()));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_table_constraints_are_not_columns() {
        let sql = r#"
            CREATE SCHEMA IF NOT EXISTS "sales";
            CREATE TABLE "sales"."orders" (
                "id" uuid NOT NULL DEFAULT gen_random_uuid(),
                "customer_id" uuid NOT NULL,
                "total" numeric(10,2),
                CONSTRAINT orders_pkey PRIMARY KEY ("id"),
                CONSTRAINT orders_customer_fk FOREIGN KEY ("customer_id") REFERENCES "sales"."customers" ("id"),
                UNIQUE ("customer_id", "total")
            );
        "#;
        let output = parse(sql).unwrap();
        assert_eq!(
            output.tables[0].column_names(),
            vec!["id", "customer_id", "total"]
        );
    }

    #[test]
    fn test_positional_schema_attribution() {
        let sql = "
            CREATE SCHEMA alpha;
            CREATE TABLE alpha.a (x int);
            CREATE SCHEMA beta;
            CREATE TABLE alpha.b (y int);
        ";
        let output = parse(sql).unwrap();
        assert_eq!(output.tables[0].full_name(), "alpha.a");
        // Attributed by position, not by qualifier.
        assert_eq!(output.tables[1].full_name(), "beta.b");
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("alpha.b"));
    }

    #[test]
    fn test_table_before_schema_gets_empty_schema() {
        let sql = "CREATE TABLE early (id int); CREATE SCHEMA late; CREATE TABLE late.t (id int);";
        let output = parse(sql).unwrap();
        assert_eq!(output.tables[0].schema, "");
        assert_eq!(output.tables[1].schema, "late");
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn test_missing_schema_is_error() {
        let err = parse("CREATE TABLE users (id int);").unwrap_err();
        assert!(matches!(err, GenError::SchemaUndetermined));
    }

    #[test]
    fn test_malformed_sql_is_error() {
        let err = parse("CREATE SCHEMA s; CREATE TABLE (id int").unwrap_err();
        assert!(matches!(err, GenError::MalformedDdl(_)));

        let err = parse("CREATE SCHEMA s;\nCREATE TABLE s.t (id int, name text;").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = parse("CREATE SCHEMA s; THIS IS NOT SQL;").unwrap_err();
        assert!(matches!(err, GenError::MalformedDdl(_)));
    }

    #[test]
    fn test_rejected_statements_are_skipped() {
        let sql = "\
CREATE SCHEMA app;
CREATE SEQUENCE app.s START WITH 1 INCREMENT BY 1 NO MINVALUE NO MAXVALUE CACHE 1;
CREATE TABLE app.t (id int, name text);
";
        let output = parse(sql).unwrap();
        assert_eq!(output.tables.len(), 1);
        assert_eq!(output.tables[0].full_name(), "app.t");
        assert_eq!(output.tables[0].column_names(), vec!["id", "name"]);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_rejected_tables_are_read_from_text() {
        let sql = "\
CREATE SCHEMA app;
CREATE TABLE app.base (id int);
CREATE TABLE app.child (flags bit varying(5), note text) INHERITS (app.base);
";
        let output = parse(sql).unwrap();
        let names: Vec<_> = output.tables.iter().map(|t| t.full_name()).collect();
        assert_eq!(names, vec!["app.base", "app.child"]);
        assert_eq!(output.tables[1].column_names(), vec!["flags", "note"]);
        assert!(output.tables[1].columns.iter().all(|c| c.type_name.is_none()));
    }

    #[test]
    fn test_pg_dump_fixture() {
        let sql = r#"--
-- PostgreSQL database dump
--

-- Dumped from database version 16.2
-- Dumped by pg_dump version 16.2

SET statement_timeout = 0;
SET lock_timeout = 0;
SET client_encoding = 'UTF8';
SET standard_conforming_strings = on;
SELECT pg_catalog.set_config('search_path', '', false);
SET check_function_bodies = false;
SET client_min_messages = warning;
SET row_security = off;

--
-- Name: app; Type: SCHEMA; Schema: -; Owner: postgres
--

CREATE SCHEMA app;


ALTER SCHEMA app OWNER TO postgres;

--
-- Name: email; Type: DOMAIN; Schema: app; Owner: postgres
--

CREATE DOMAIN app.email AS text
	CONSTRAINT email_check CHECK ((VALUE ~ '^[^@]+@[^@]+$'::text));

--
-- Name: touch_updated_at(); Type: FUNCTION; Schema: app; Owner: postgres
--

CREATE FUNCTION app.touch_updated_at() RETURNS trigger
    LANGUAGE plpgsql
    AS $$
BEGIN
  NEW.updated_at := now();
  RETURN NEW;
END;
$$;

SET default_tablespace = '';

SET default_table_access_method = heap;

--
-- Name: accounts; Type: TABLE; Schema: app; Owner: postgres
--

CREATE TABLE app.accounts (
    id integer NOT NULL,
    email app.email NOT NULL,
    "displayName" character varying(100),
    flags bit varying(5),
    created_at timestamp with time zone DEFAULT now() NOT NULL
);


ALTER TABLE app.accounts OWNER TO postgres;

--
-- Name: accounts_id_seq; Type: SEQUENCE; Schema: app; Owner: postgres
--

CREATE SEQUENCE app.accounts_id_seq
    AS integer
    START WITH 1
    INCREMENT BY 1
    NO MINVALUE
    NO MAXVALUE
    CACHE 1;


ALTER SEQUENCE app.accounts_id_seq OWNED BY app.accounts.id;

--
-- Name: admin_accounts; Type: TABLE; Schema: app; Owner: postgres
--

CREATE TABLE app.admin_accounts (
    granted_by integer,
    scopes text[] DEFAULT '{}'::text[]
)
INHERITS (app.accounts);


ALTER TABLE ONLY app.accounts ALTER COLUMN id SET DEFAULT nextval('app.accounts_id_seq'::regclass);

ALTER TABLE ONLY app.accounts
    ADD CONSTRAINT accounts_pkey PRIMARY KEY (id);

CREATE INDEX accounts_email_idx ON app.accounts USING btree (email);

--
-- PostgreSQL database dump complete
--
"#;
        let output = parse(sql).unwrap();

        assert_eq!(
            output.tables,
            vec![
                Table::new(
                    "app",
                    "accounts",
                    vec![
                        Column::new("id"),
                        Column::new("email"),
                        Column::new("displayName"),
                        Column::new("flags"),
                        Column::new("created_at"),
                    ]
                ),
                Table::new(
                    "app",
                    "admin_accounts",
                    vec![Column::new("granted_by"), Column::new("scopes")]
                ),
            ]
        );
        // Sequence and domain definitions are reported, never fatal.
        assert!(output
            .diagnostics
            .iter()
            .all(|d| d.message.starts_with("skipped unsupported statement")));
    }

    #[test]
    fn test_non_table_statements_ignored() {
        let sql = "
            CREATE SCHEMA app;
            CREATE INDEX idx_users_email ON app.users (email);
            CREATE TABLE app.users (id bigint, email text);
            CREATE VIEW app.v AS SELECT id FROM app.users;
        ";
        let output = parse(sql).unwrap();
        assert_eq!(output.tables.len(), 1);
        assert_eq!(output.tables[0].column_names(), vec!["id", "email"]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let sql = "CREATE SCHEMA a; CREATE TABLE a.t1 (x int, y int); CREATE SCHEMA b; CREATE TABLE b.t2 (z text);";
        let parser = PostgresParser::new();
        let first = parser.parse(sql).unwrap();
        let second = parser.parse(sql).unwrap();
        assert_eq!(first, second);
    }
}
