//! # jobmapping-gen
//!
//! Multi-dialect DDL schema extraction and default job mapping generation.
//!
//! Given `CREATE TABLE` scripts written for PostgreSQL, MySQL or SQL Server,
//! this library reconstructs the declared tables and columns and renders one
//! passthrough job mapping per column into a generated Go source file:
//!
//! - **Postgres**: full AST parse with positional schema attribution
//! - **MySQL**: heuristic line scanner that never fails
//! - **SQL Server**: T-SQL grammar walk that also records column types
//! - **Batch runs** over a request list with a bounded worker pool
//! - **Atomic writes** so a failed render never leaves a partial file
//!
//! ## Example
//!
//! ```rust,no_run
//! use jobmapping_gen::{Config, GeneratorOptions, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> jobmapping_gen::Result<()> {
//!     let config = Config::load("requests.json")?;
//!     let options = GeneratorOptions::new("workflow_testdata").with_auto_tuning();
//!     let result = Orchestrator::new(config, options)?
//!         .run(CancellationToken::new())
//!         .await?;
//!     println!("Generated {} mappings", result.mappings_written);
//!     Ok(())
//! }
//! ```

pub mod codegen;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod mapping;
pub mod orchestrator;

// Re-exports for convenient access
pub use codegen::Template;
pub use config::{Config, GeneratorOptions, ParseRequest};
pub use core::{Column, DdlParser, Diagnostic, JobMapping, ParseOutput, Table, TransformerKind};
pub use drivers::{dispatch, Driver, ParserImpl};
pub use error::{GenError, Result};
pub use mapping::generate_job_mappings;
pub use orchestrator::{BatchResult, Orchestrator, RequestOutcome, RequestStatus};
