//! Hops Console command-line harness.
//!
//! Feeds payload files through the console core the way the HTTP layer
//! would, and prints the display-ready result as JSON on stdout.

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hops_console::config::{AppConfig, Cli, Command};
use hops_console::tasks::{Param, TaskCatalog, TaskRunResponse};

/// Exit status for a submission that failed validation.
const EXIT_REJECTED: u8 = 2;

fn main() -> ExitCode {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!(name: "console.failed", error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing (M-LOG-STRUCTURED). Logs go to stderr so stdout stays JSON.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = AppConfig::load_from_cli(cli).context("failed to load configuration")?;

    info!(
        name: "config.loaded",
        locale = %config.display.locale,
        utc_offset_minutes = config.display.utc_offset_minutes,
        max_rows = config.events.max_rows,
        "Configuration loaded"
    );

    match &cli.command {
        Command::Events { file } => {
            let projector = config.projector()?;
            let projection = projector.project_value(read_json(file)?)?;

            info!(
                name: "events.projected",
                file = %file.display(),
                rows = projection.rows().len(),
                "Event payload projected"
            );
            print_json(&projection)?;
        }
        Command::Tasks { file } => {
            let catalog = load_catalog(file)?;
            print_json(&catalog.summaries())?;
        }
        Command::Describe { file, task } => {
            let catalog = load_catalog(file)?;
            let descriptions: Vec<_> = catalog.get(task)?.params.iter().map(Param::describe).collect();
            print_json(&descriptions)?;
        }
        Command::Run { tasks, task, input } => {
            let catalog = load_catalog(tasks)?;
            let response = TaskRunResponse::from(catalog.submit(task, read_json(input)?)?);
            print_json(&response)?;

            if !response.is_accepted() {
                warn!(
                    name: "task.run.rejected",
                    task = %task,
                    fields = response.errors.len(),
                    "Task run rejected"
                );
                return Ok(ExitCode::from(EXIT_REJECTED));
            }

            info!(
                name: "task.run.accepted",
                task = %task,
                sequence_id = %response.sequence_id,
                "Task run accepted"
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_catalog(path: &Path) -> Result<TaskCatalog> {
    let catalog = TaskCatalog::from_value(read_json(path)?)
        .with_context(|| format!("invalid task list in {}", path.display()))?;

    info!(name: "tasks.loaded", file = %path.display(), tasks = catalog.len(), "Task list loaded");
    Ok(catalog)
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
