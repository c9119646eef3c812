//! jobmapping-gen CLI - default job mapping generation from DDL files.

use clap::Parser;
use jobmapping_gen::{BatchResult, Config, GenError, GeneratorOptions, Orchestrator, RequestStatus};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "jobmapping-gen")]
#[command(about = "Generate default job mappings from SQL DDL files")]
#[command(version)]
struct Cli {
    /// Path to the request list (JSON, or YAML for .yaml/.yml)
    config: PathBuf,

    /// Go package of the generating tool, e.g. workflow_testdata
    package: String,

    /// Number of requests processed concurrently [default: CPU cores]
    #[arg(long)]
    workers: Option<usize>,

    /// Fail requests whose driver is not postgres, mysql or sqlserver
    #[arg(long)]
    strict_drivers: bool,

    /// Parse and render without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), GenError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!(
        "Loaded {} requests from {:?}",
        config.requests.len(),
        cli.config
    );

    let mut options = GeneratorOptions::new(&cli.package);
    options.workers = cli.workers;
    options.strict_drivers = cli.strict_drivers;
    options.dry_run = cli.dry_run;
    let options = options.with_auto_tuning();

    let cancel_token = setup_signal_handler();

    let result = Orchestrator::new(config, options)?
        .run(cancel_token)
        .await?;

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        print_summary(&result, cli.dry_run);
    }

    result.check()
}

fn print_summary(result: &BatchResult, dry_run: bool) {
    let status_msg = match (result.status.as_str(), dry_run) {
        ("completed", true) => "Dry run completed!",
        ("completed", false) => "Generation completed!",
        ("cancelled", _) => "Generation cancelled.",
        _ => "Generation finished with failures.",
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!(
        "  Requests: {}/{} ({} skipped)",
        result.requests_succeeded, result.requests_total, result.requests_skipped
    );
    println!("  Mappings: {}", result.mappings_written);

    for outcome in &result.outcomes {
        match outcome.status {
            RequestStatus::Failed => println!(
                "  Failed: {} ({})",
                outcome.folder,
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
            RequestStatus::Skipped => println!("  Skipped: {}", outcome.folder),
            RequestStatus::Written | RequestStatus::DryRun => {}
        }
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };

    // RUST_LOG wins over --verbosity when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Cancel the run on SIGINT (Ctrl-C) or SIGTERM.
/// Requests already running finish; the rest are skipped.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(e) => {
                    eprintln!("Failed to setup {} handler: {}", name, e);
                    return;
                }
            };
            stream.recv().await;
            eprintln!("\nReceived {}. Finishing running requests...", name);
            token.cancel();
        });
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to setup Ctrl-C handler: {}", e);
            return;
        }
        eprintln!("\nReceived Ctrl-C. Finishing running requests...");
        token.cancel();
    });

    cancel_token
}
