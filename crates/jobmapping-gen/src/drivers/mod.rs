//! Dialect parser implementations and the dispatcher that selects one.
//!
//! - [`postgres`]: AST walk with positional schema attribution
//! - [`mysql`]: heuristic line scanner
//! - [`mssql`]: T-SQL grammar walk with declared column types
//! - [`common`]: AST helpers shared by the grammar-backed parsers
//!
//! # Static dispatch
//!
//! The set of dialects is closed, so [`ParserImpl`] is an enum whose variants
//! forward to the concrete parsers instead of a `Box<dyn DdlParser>`.

pub mod common;
pub mod mssql;
pub mod mysql;
pub mod postgres;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use mssql::MssqlParser;
pub use mysql::MysqlParser;
pub use postgres::PostgresParser;

use crate::core::traits::DdlParser;
use crate::core::{Diagnostic, ParseOutput};
use crate::error::{GenError, Result};

/// Supported driver identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Postgres,
    Mysql,
    Sqlserver,
}

impl Driver {
    /// All supported drivers.
    pub const ALL: [Driver; 3] = [Driver::Postgres, Driver::Mysql, Driver::Sqlserver];

    /// Identifier as written in request files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::Mysql => "mysql",
            Driver::Sqlserver => "sqlserver",
        }
    }

    /// Fresh parser for this driver.
    pub fn parser(&self) -> ParserImpl {
        match self {
            Driver::Postgres => ParserImpl::Postgres(PostgresParser::new()),
            Driver::Mysql => ParserImpl::Mysql(MysqlParser::new()),
            Driver::Sqlserver => ParserImpl::Mssql(MssqlParser::new()),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = GenError;

    /// Identifiers are matched exactly, as the request files spell them.
    fn from_str(s: &str) -> Result<Self> {
        Driver::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| GenError::UnknownDriver(s.to_string()))
    }
}

/// Enum-based static dispatch for dialect parsers.
#[derive(Debug, Clone)]
pub enum ParserImpl {
    Postgres(PostgresParser),
    Mysql(MysqlParser),
    Mssql(MssqlParser),
}

impl DdlParser for ParserImpl {
    fn name(&self) -> &str {
        match self {
            ParserImpl::Postgres(p) => p.name(),
            ParserImpl::Mysql(p) => p.name(),
            ParserImpl::Mssql(p) => p.name(),
        }
    }

    fn parse(&self, sql: &str) -> Result<ParseOutput> {
        match self {
            ParserImpl::Postgres(p) => p.parse(sql),
            ParserImpl::Mysql(p) => p.parse(sql),
            ParserImpl::Mssql(p) => p.parse(sql),
        }
    }

    fn provides_types(&self) -> bool {
        match self {
            ParserImpl::Postgres(p) => p.provides_types(),
            ParserImpl::Mysql(p) => p.provides_types(),
            ParserImpl::Mssql(p) => p.provides_types(),
        }
    }
}

/// Parse `sql` with the parser registered for `driver_id`.
///
/// An unrecognized identifier yields no tables and no error; the mistake is
/// only visible as a diagnostic. Callers wanting a hard failure resolve the
/// identifier with [`Driver::from_str`] first.
pub fn dispatch(driver_id: &str, sql: &str) -> Result<ParseOutput> {
    match driver_id.parse::<Driver>() {
        Ok(driver) => driver.parser().parse(sql),
        Err(_) => {
            warn!("Unknown driver '{}', no tables parsed", driver_id);
            Ok(ParseOutput::new(
                Vec::new(),
                vec![Diagnostic::new(format!(
                    "unknown driver '{}'; expected one of: postgres, mysql, sqlserver",
                    driver_id
                ))],
            ))
        }
    }
}
