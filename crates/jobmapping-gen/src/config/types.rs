//! Configuration type definitions with auto-tuning based on system resources.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::info;

use crate::codegen::{tool_package, DEFAULT_MAPPINGS_IMPORT};

/// Default name of the generated file inside each request folder.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "job_mappings.go";

/// Upper bound for auto-tuned workers.
const MAX_AUTO_WORKERS: usize = 16;

/// System resource information for auto-tuning.
#[derive(Debug, Clone)]
pub struct SystemResources {
    /// Total RAM in GB.
    pub total_memory_gb: f64,
    /// Number of CPU cores.
    pub cpu_cores: usize,
}

impl SystemResources {
    /// Detect system resources.
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            total_memory_gb: sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0),
            cpu_cores: sys.cpus().len(),
        }
    }

    /// Log detected system resources.
    pub fn log(&self) {
        info!(
            "System resources: {:.1} GB RAM, {} CPU cores",
            self.total_memory_gb, self.cpu_cores
        );
    }
}

/// The request list: one entry per DDL file to process.
///
/// Serialized as a bare array, e.g.
/// `[{"folder": "postgres/alltypes", "sql_file": "create.sql", "driver": "postgres"}]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub requests: Vec<ParseRequest>,
}

/// One DDL file to parse and the folder its artifact is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseRequest {
    /// Folder holding the DDL file; also receives the generated file.
    pub folder: String,

    /// DDL file name, relative to `folder`.
    pub sql_file: String,

    /// Driver identifier. Kept as text so an unknown driver loads and is
    /// handled at dispatch time.
    pub driver: String,
}

impl ParseRequest {
    pub fn new(
        folder: impl Into<String>,
        sql_file: impl Into<String>,
        driver: impl Into<String>,
    ) -> Self {
        Self {
            folder: folder.into(),
            sql_file: sql_file.into(),
            driver: driver.into(),
        }
    }

    /// Path of the DDL source file.
    pub fn source_path(&self) -> PathBuf {
        Path::new(&self.folder).join(&self.sql_file)
    }

    /// Path of the generated artifact.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.folder).join(file_name)
    }
}

/// Run-wide generator settings, mostly from the command line.
///
/// `workers` uses `Option` to distinguish "not set" (auto-tuned) from an
/// explicit value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Tool package, the prefix for single-segment folder packages.
    pub tool_package: String,

    /// Concurrent requests. Auto-tuned from CPU cores if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Fail requests with an unknown driver instead of skipping them.
    #[serde(default)]
    pub strict_drivers: bool,

    /// Render everything but write nothing.
    #[serde(default)]
    pub dry_run: bool,

    /// Generated file name (default: job_mappings.go).
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,

    /// Go import path of the package defining `JobMapping`.
    #[serde(default = "default_mappings_import")]
    pub mappings_import: String,
}

impl GeneratorOptions {
    /// Options for a package argument such as `workflow_testdata`.
    pub fn new(package_arg: &str) -> Self {
        Self {
            tool_package: tool_package(package_arg).to_string(),
            workers: None,
            strict_drivers: false,
            dry_run: false,
            output_file_name: default_output_file_name(),
            mappings_import: default_mappings_import(),
        }
    }

    /// Fill in `workers` from detected resources if not explicitly set.
    pub fn with_auto_tuning(self) -> Self {
        let resources = SystemResources::detect();
        resources.log();
        self.with_resources(&resources)
    }

    /// Fill in `workers` from the given resources if not explicitly set.
    pub fn with_resources(mut self, resources: &SystemResources) -> Self {
        if self.workers.is_none() {
            let workers = resources.cpu_cores.clamp(1, MAX_AUTO_WORKERS);
            info!("Auto-tuned workers={}", workers);
            self.workers = Some(workers);
        }
        self
    }

    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or(4)
    }
}

fn default_output_file_name() -> String {
    DEFAULT_OUTPUT_FILE_NAME.to_string()
}

fn default_mappings_import() -> String {
    DEFAULT_MAPPINGS_IMPORT.to_string()
}
