//! MySQL/MariaDB driver.
//!
//! - [`MysqlParser`]: heuristic line scanner for `mysqldump`-style DDL
//!
//! There is no grammar behind this parser. It recognizes the line shapes
//! that schema dumps actually produce and skips everything else, so its
//! guarantees are weaker than the other dialects: unusual formatting can
//! silently drop columns. Dropped lines inside a table body are reported as
//! diagnostics.

mod parser;

pub use parser::MysqlParser;
