//! PostgreSQL driver.
//!
//! - [`PostgresParser`]: AST-based DDL parser with positional schema attribution

mod parser;

pub use parser::PostgresParser;
