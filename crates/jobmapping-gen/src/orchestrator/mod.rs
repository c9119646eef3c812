//! Batch orchestrator - runs every request in the request list.
//!
//! Requests share no state, so each one runs on the blocking pool behind a
//! semaphore of `workers` permits. A failing request is recorded in its
//! outcome and never stops the others. Cancellation stops new requests from
//! starting; requests already running finish their file.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codegen::{derive_package_name, write_atomic, Template};
use crate::config::{validate_options, Config, GeneratorOptions, ParseRequest};
use crate::core::traits::DdlParser;
use crate::core::Diagnostic;
use crate::drivers::{dispatch, Driver};
use crate::error::{GenError, Result};
use crate::mapping::generate_job_mappings;

/// Batch orchestrator.
pub struct Orchestrator {
    config: Config,
    options: GeneratorOptions,
}

/// What happened to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Artifact written.
    Written,
    /// Artifact rendered but not written.
    DryRun,
    /// Nothing produced: unknown driver, or cancelled before start.
    Skipped,
    /// The request failed; see `error`.
    Failed,
}

/// Outcome of a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub folder: String,
    pub sql_file: String,
    pub driver: String,
    pub status: RequestStatus,

    /// Artifact path, set when written or dry-run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Tables parsed.
    pub tables: usize,

    /// Job mappings rendered.
    pub mappings: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestOutcome {
    fn new(request: &ParseRequest, status: RequestStatus) -> Self {
        Self {
            folder: request.folder.clone(),
            sql_file: request.sql_file.clone(),
            driver: request.driver.clone(),
            status,
            output_path: None,
            tables: 0,
            mappings: 0,
            diagnostics: Vec::new(),
            error: None,
        }
    }

    fn skipped(request: &ParseRequest, reason: impl Into<String>) -> Self {
        let mut outcome = Self::new(request, RequestStatus::Skipped);
        outcome.diagnostics.push(Diagnostic::new(reason));
        outcome
    }

    fn failed(request: &ParseRequest, error: impl Into<String>) -> Self {
        let mut outcome = Self::new(request, RequestStatus::Failed);
        outcome.error = Some(error.into());
        outcome
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: completed, failed or cancelled.
    pub status: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    pub requests_total: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_skipped: usize,

    /// Job mappings across all written or dry-run artifacts.
    pub mappings_written: usize,

    /// Per-request outcomes, in request list order.
    pub outcomes: Vec<RequestOutcome>,
}

impl BatchResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The error the process should exit with, if any.
    pub fn check(&self) -> Result<()> {
        if self.requests_failed > 0 {
            return Err(GenError::RequestsFailed {
                failed: self.requests_failed,
                total: self.requests_total,
            });
        }
        if self.status == "cancelled" {
            return Err(GenError::Cancelled);
        }
        Ok(())
    }
}

impl Orchestrator {
    /// Create a new orchestrator. Validates both inputs.
    pub fn new(config: Config, options: GeneratorOptions) -> Result<Self> {
        config.validate()?;
        validate_options(&options)?;
        Ok(Self { config, options })
    }

    /// Process every request, at most `workers` at a time.
    pub async fn run(&self, cancel: CancellationToken) -> Result<BatchResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let workers = self.options.get_workers();
        let total = self.config.requests.len();

        info!(
            "Starting generation run {}: {} requests with {} workers",
            run_id, total, workers
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let options = Arc::new(self.options.clone());
        let mut handles = Vec::with_capacity(total);
        let mut cancel_logged = false;

        for request in &self.config.requests {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                if !cancel_logged {
                    info!("Cancellation requested, stopping new requests");
                    cancel_logged = true;
                }
                handles.push((request.clone(), None));
                continue;
            };

            let task_request = request.clone();
            let task_options = options.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let outcome = process_request(&task_request, &task_options);
                drop(permit);
                outcome
            });
            handles.push((request.clone(), Some(handle)));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (request, handle) in handles {
            let outcome = match handle {
                None => RequestOutcome::skipped(&request, "cancelled before start"),
                Some(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("{}: task panicked - {}", request.folder, e);
                        RequestOutcome::failed(&request, format!("Task panicked: {}", e))
                    }
                },
            };
            outcomes.push(outcome);
        }

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let count = |status: RequestStatus| outcomes.iter().filter(|o| o.status == status).count();
        let requests_failed = count(RequestStatus::Failed);
        let requests_skipped = count(RequestStatus::Skipped);
        let requests_succeeded = count(RequestStatus::Written) + count(RequestStatus::DryRun);
        let mappings_written = outcomes
            .iter()
            .filter(|o| matches!(o.status, RequestStatus::Written | RequestStatus::DryRun))
            .map(|o| o.mappings)
            .sum();

        let status = if requests_failed > 0 {
            "failed"
        } else if cancel.is_cancelled() {
            "cancelled"
        } else {
            "completed"
        };

        let result = BatchResult {
            run_id,
            status: status.to_string(),
            started_at,
            completed_at,
            duration_seconds,
            requests_total: total,
            requests_succeeded,
            requests_failed,
            requests_skipped,
            mappings_written,
            outcomes,
        };

        info!(
            "Generation {}: {} of {} requests succeeded, {} failed, {} skipped, {} mappings in {:.2}s",
            result.status,
            result.requests_succeeded,
            result.requests_total,
            result.requests_failed,
            result.requests_skipped,
            result.mappings_written,
            result.duration_seconds
        );

        Ok(result)
    }
}

/// Run one request to completion, folding any error into the outcome.
pub fn process_request(request: &ParseRequest, options: &GeneratorOptions) -> RequestOutcome {
    match generate(request, options) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{}: failed - {}", request.folder, e);
            RequestOutcome::failed(request, e.to_string())
        }
    }
}

fn generate(request: &ParseRequest, options: &GeneratorOptions) -> Result<RequestOutcome> {
    // The source of an unknown driver is never read.
    let driver = match request.driver.parse::<Driver>() {
        Ok(driver) => driver,
        Err(e) if options.strict_drivers => return Err(e),
        Err(_) => {
            let output = dispatch(&request.driver, "")?;
            let mut outcome = RequestOutcome::new(request, RequestStatus::Skipped);
            outcome.diagnostics = output.diagnostics;
            return Ok(outcome);
        }
    };

    let source_path = request.source_path();
    let sql = std::fs::read_to_string(&source_path)
        .map_err(|e| GenError::source_read(&source_path, e))?;

    let parser = driver.parser();
    let output = parser.parse(&sql)?;
    for diagnostic in &output.diagnostics {
        warn!("{}/{}: {}", request.folder, request.sql_file, diagnostic);
    }

    let mappings = generate_job_mappings(&output.tables);
    let package_name = derive_package_name(&options.tool_package, &request.folder);
    let text = Template::new(&package_name, &request.sql_file, &mappings, &output.tables)
        .with_type_map(parser.provides_types())
        .with_mappings_import(&options.mappings_import)
        .render()?;

    let output_path = request.output_path(&options.output_file_name);
    let status = if options.dry_run {
        debug!("{}: dry run, not writing {}", request.folder, output_path.display());
        RequestStatus::DryRun
    } else {
        write_atomic(&output_path, &text)?;
        RequestStatus::Written
    };

    info!(
        "{}: {} tables, {} mappings ({}) -> {}",
        request.folder,
        output.tables.len(),
        mappings.len(),
        driver,
        output_path.display()
    );

    Ok(RequestOutcome {
        status,
        output_path: Some(output_path),
        tables: output.tables.len(),
        mappings: mappings.len(),
        diagnostics: output.diagnostics,
        ..RequestOutcome::new(request, status)
    })
}
