//! treemirror CLI - mirror local trees onto a remote host
//!
//! Usage: treemirror [COMMAND]
//!
//! Commands:
//!   run     Full pipeline (default)
//!   check   Connectivity probe only
//!   status  Supervisor state of the configured services
//!   plan    Print what each stage would run, without connecting
//!
//! Exit codes: 0 success, 1 aborted run or failed check, 2 configuration or
//! setup error.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

use treemirror::application::describe_plan;
use treemirror::config::{load_settings, resolve_config_path, Settings};
use treemirror::domain::value_objects::RunStamp;
use treemirror::presentation::factory::{create_executor, create_transfer};
use treemirror::presentation::{
    create_orchestrator, create_renderer, Cli, Commands, OutputFormat, Renderer,
};

const EXIT_ABORTED: u8 = 1;
const EXIT_SETUP: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match dispatch(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(EXIT_SETUP)
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run the selected command; `Err` means the run never started.
fn dispatch(cli: &Cli) -> Result<u8> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let unicode = !cli.ascii;
    let color = !cli.json && io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let renderer = create_renderer(format, color, unicode);

    let path = resolve_config_path(cli.config.as_deref());
    let (settings, warnings) = load_settings(&path)
        .with_context(|| format!("cannot load configuration from {}", path.display()))?;
    for warning in &warnings {
        eprintln!("Warning: {}", warning);
    }
    tracing::debug!(config = %path.display(), trees = settings.trees.len(), "configuration loaded");

    match cli.command() {
        Commands::Plan => cmd_plan(&settings, renderer.as_ref()),
        remote => cmd_remote(remote, &settings, format, unicode, renderer.as_ref()),
    }
}

/// Commands that talk to the host.
fn cmd_remote(
    command: Commands,
    settings: &Settings,
    format: OutputFormat,
    unicode: bool,
    renderer: &dyn Renderer,
) -> Result<u8> {
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(error = %err, "cannot install Ctrl+C handler");
    }

    let orchestrator = create_orchestrator(settings, format, unicode, interrupt)?;
    let destination = settings.target.destination();

    let code = match command {
        Commands::Check => {
            let result = orchestrator.check(settings);
            emit(&renderer.check(&destination, &result))?;
            if result.is_reachable() {
                0
            } else {
                EXIT_ABORTED
            }
        }
        Commands::Status => match orchestrator.status(settings) {
            Ok(status) => {
                emit(&renderer.status(&destination, &status))?;
                0
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                EXIT_ABORTED
            }
        },
        _ => {
            let report = orchestrator.run(settings);
            emit(&renderer.report(&report))?;
            if let (Some(err), OutputFormat::Text) = (&report.error, format) {
                eprintln!("Error: {}", err);
            }
            report.exit_code() as u8
        }
    };
    Ok(code)
}

/// Print the plan. Never contacts the host; the transport name comes from
/// local tool detection.
fn cmd_plan(settings: &Settings, renderer: &dyn Renderer) -> Result<u8> {
    let transfer = create_transfer(settings, create_executor(settings))?;
    let stamp = RunStamp::now();
    let plan = describe_plan(settings, &stamp, transfer.name());
    emit(&renderer.plan(
        &settings.target.destination(),
        &stamp,
        transfer.name(),
        &plan,
    ))?;
    Ok(0)
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text).context("cannot write to stdout")?;
    stdout.flush().context("cannot write to stdout")
}
