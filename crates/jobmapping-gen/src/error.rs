//! Error types for the job mapping generator.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for configuration problems (unreadable or invalid request list).
pub const EXIT_CONFIG_ERROR: u8 = 1;

/// Exit code when one or more requests in a batch failed.
pub const EXIT_REQUEST_FAILED: u8 = 2;

/// Exit code for I/O failures outside a single request.
pub const EXIT_IO_ERROR: u8 = 7;

/// Exit code after Ctrl-C.
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for generator operations.
#[derive(Error, Debug)]
pub enum GenError {
    /// The request list cannot be read, parsed or validated.
    #[error("Configuration error: {0}")]
    ConfigRead(String),

    /// A DDL source file cannot be opened or read.
    #[error("Failed to read DDL file {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Postgres AST parser rejected the input.
    #[error("Malformed DDL: {0}")]
    MalformedDdl(String),

    /// The Postgres document never declared a schema.
    #[error("Unable to determine schema: no CREATE SCHEMA statement found")]
    SchemaUndetermined,

    /// Driver identifier outside the supported set (strict mode only).
    #[error("Unknown driver '{0}' (expected one of: postgres, mysql, sqlserver)")]
    UnknownDriver(String),

    /// Rendering the generated artifact failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Writing the generated artifact failed.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more requests in a batch failed.
    #[error("{failed} of {total} requests failed")]
    RequestsFailed { failed: usize, total: usize },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Run was cancelled (SIGINT)
    #[error("Generation cancelled")]
    Cancelled,
}

impl GenError {
    /// Create a SourceRead error for the given path.
    pub fn source_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::SourceRead {
            path: path.into(),
            source,
        }
    }

    /// Create a Write error for the given path.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Write {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            GenError::ConfigRead(_) | GenError::Json(_) | GenError::Yaml(_) => EXIT_CONFIG_ERROR,
            GenError::Io(_) => EXIT_IO_ERROR,
            GenError::Cancelled => EXIT_CANCELLED,
            _ => EXIT_REQUEST_FAILED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GenError>;
