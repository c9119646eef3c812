//! Core abstractions shared by all dialects.
//!
//! - [`schema`]: Table, column, job mapping and diagnostic types
//! - [`identifier`]: Identifier unquoting, qualification and validation
//! - [`traits`]: The [`DdlParser`] capability implemented per dialect

pub mod identifier;
pub mod schema;
pub mod traits;

pub use schema::{Column, Diagnostic, JobMapping, ParseOutput, Table, TransformerKind};
pub use traits::DdlParser;
