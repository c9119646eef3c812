//! Microsoft SQL Server driver.
//!
//! - [`MssqlParser`]: T-SQL grammar walk that also extracts declared column types

mod parser;

pub use parser::MssqlParser;
