//! Canvass Import - voter file import pipeline for the Canvass platform
//!
//! Validates voter files client-side, submits them to the Canvass REST
//! backend (raw upload or pre-parsed JSON batch), and tracks the resulting
//! import job to completion with adaptive polling.

mod cli;
mod config;
mod services;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use cli::{Cli, Command, MappingOverrideArg};
use config::Config;
use services::api_client::{CanvassApi, ImportBackend};
use services::importer::{build_parse_plan, ImportSession, MappingOverride};
use services::poller::{build_report, JobPoller, PollHandle, ProgressReport};
use services::progress::{format_eta, ProgressWindow};
use types::{ImportError, ImportJob};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "canvass-import.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - diagnostics to stderr, persistent copy to file.
    // Stdout stays clean for progress output.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,canvass_import=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let backend: Arc<dyn ImportBackend> =
        Arc::new(CanvassApi::new(&config.api_url, config.api_token.clone()));

    let result = match args.command {
        Command::Import {
            file,
            client_parse,
            overrides,
        } => run_import(backend, &file, client_parse, &overrides).await,
        Command::Status { job_id, watch } => run_status(backend, job_id, watch).await,
        Command::MapPreview { file } => run_map_preview(&file).await,
    };

    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}

async fn run_import(
    backend: Arc<dyn ImportBackend>,
    file: &Path,
    client_parse: bool,
    overrides: &[MappingOverrideArg],
) -> Result<()> {
    let session = ImportSession::new(Arc::clone(&backend));
    let started = if client_parse {
        let overrides: Vec<MappingOverride> = overrides
            .iter()
            .map(|o| (o.header.clone(), o.field))
            .collect();
        session.import_parsed(file, &overrides).await?
    } else {
        session.upload_file(file).await?
    };

    debug!(
        "Import session {} attached to job {}",
        started.session_id, started.job_id
    );
    println!(
        "Job {} accepted ({})",
        started.job_id,
        started.initial_status.as_str()
    );
    if let Some(original) = &started.duplicate_of_job_id {
        println!(
            "Note: this file looks previously uploaded (job {original}). Re-importing updates \
             existing voters without duplicating their interaction history."
        );
    }

    let job = match watch_to_completion(started.handle).await {
        Ok(job) => job,
        Err(ImportError::Cancelled) => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    println!("Import completed (job {}).", job.id);

    match backend.open_merge_alert_count().await {
        Ok(0) => {}
        Ok(count) => {
            println!("{count} possible duplicate record(s) are waiting in merge alerts.")
        }
        Err(err) => warn!("Could not fetch merge-alert count: {}", err),
    }

    Ok(())
}

async fn run_status(backend: Arc<dyn ImportBackend>, job_id: String, watch: bool) -> Result<()> {
    if watch {
        let handle = JobPoller::spawn(Arc::clone(&backend), Uuid::new_v4(), job_id);
        let job = match watch_to_completion(handle).await {
            Ok(job) => job,
            Err(ImportError::Cancelled) => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        println!("Import completed (job {}).", job.id);
        return Ok(());
    }

    let job = backend.get_job(&job_id).await?;
    // One-shot read renders the same line the watcher would, minus an ETA
    // (no throughput window exists for a single observation).
    println!("{}", render_progress(&build_report(&job, &ProgressWindow::new(), 0)));
    if let Some(error) = &job.error {
        println!("Error: {error}");
    }
    if !job.status.is_terminal() {
        println!("Tip: use --watch to follow this job to completion.");
    }
    Ok(())
}

async fn run_map_preview(file: &Path) -> Result<()> {
    let size = tokio::fs::metadata(file).await?.len();
    services::validator::validate_parse_size(size)?;

    let text = tokio::fs::read_to_string(file).await?;
    let plan = build_parse_plan(&text, &[])?;

    if plan.smart_matched > 0 {
        println!(
            "Smart Match paired {} of {} columns:",
            plan.smart_matched,
            plan.headers.len()
        );
    } else {
        println!("No columns auto-matched — manual mapping required:");
    }
    for (idx, header) in plan.headers.iter().enumerate() {
        let target = plan
            .mapping
            .get(header)
            .map(|f| f.label())
            .unwrap_or("(ignored)");
        match plan.raw_headers.get(idx) {
            Some(raw) if raw != header => println!("  {header:<32} -> {target}  (raw: {raw:?})"),
            _ => println!("  {header:<32} -> {target}"),
        }
    }
    println!("{} data row(s) would be submitted.", plan.drafts.len());
    Ok(())
}

/// Drain the poll handle's reports to stdout until the job finishes or the
/// user interrupts. Enter forces an immediate status refresh; Ctrl-C cancels
/// the pending poll (the backend job itself keeps running server-side).
async fn watch_to_completion(mut handle: PollHandle) -> Result<ImportJob, ImportError> {
    println!("Watching import job (Enter refreshes now, Ctrl-C stops watching)...");

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            report = handle.next_report() => {
                match report {
                    Some(report) => {
                        debug!(
                            "Poll attempt {} reported status {}",
                            report.attempt,
                            report.status.as_str()
                        );
                        println!("{}", render_progress(&report));
                    }
                    None => break,
                }
            }
            line = stdin_lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => handle.refresh(),
                    // EOF or a read error: stop selecting on stdin.
                    _ => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                match handle.latest() {
                    Some(last) => println!(
                        "Stopped watching at [{}]. The import job keeps running server-side.",
                        last.status.as_str()
                    ),
                    None => println!("Stopped watching. The import job keeps running server-side."),
                }
                break;
            }
        }
    }
    handle.outcome().await
}

fn render_progress(report: &ProgressReport) -> String {
    let percent = match report.percent {
        Some(p) => format!("{p:>3}%"),
        None => "  …".to_string(),
    };
    let counts = match (report.processed_rows, report.total_rows) {
        (Some(processed), Some(total)) => format!(" ({processed}/{total} rows)"),
        _ => String::new(),
    };
    let eta = report
        .eta
        .map(|eta| format!(", ETA {}", format_eta(eta)))
        .unwrap_or_default();

    format!(
        "[{}] {} {}{}{}",
        report.status.as_str(),
        percent,
        report.phase,
        counts,
        eta
    )
}
