//! Go code generation for job mapping artifacts.
//!
//! - [`package`]: Go package name derivation from request folders
//! - [`template`]: renders `job_mappings.go` in memory
//! - [`literal`]: reads the literal data back out of a rendered file
//! - [`writer`]: atomic write of the rendered text

pub mod literal;
pub mod package;
pub mod template;
pub mod writer;

pub use literal::{parse_job_mappings, parse_type_map, TypeMap};
pub use package::{derive_package_name, tool_package, validate_package_name};
pub use template::{go_quote, Template, DEFAULT_MAPPINGS_IMPORT};
pub use writer::write_atomic;
