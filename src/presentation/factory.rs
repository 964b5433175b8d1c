//! Pipeline Factory
//!
//! Creates the orchestrator with infrastructure dependencies wired up.
//! This is the dependency injection point for the application.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::application::PipelineOrchestrator;
use crate::config::Settings;
use crate::domain::ports::{PipelineEventSink, RemoteExecutor, TransferError, TreeTransfer};
use crate::infrastructure::{
    detect_strategy, ConsoleEventSink, JsonEventSink, SshExecutor, SshOptions, TransferMode,
};

use super::output::OutputFormat;

/// ssh flags derived from the configured timeouts
pub fn ssh_options(settings: &Settings) -> SshOptions {
    SshOptions {
        connect_timeout: settings.connect_timeout,
        command_timeout: settings.command_timeout,
        ..SshOptions::default()
    }
}

/// Create the ssh-backed remote executor
pub fn create_executor(settings: &Settings) -> Arc<dyn RemoteExecutor> {
    Arc::new(SshExecutor::new(ssh_options(settings)))
}

/// Pick the transfer strategy for the configured mode
pub fn create_transfer(
    settings: &Settings,
    executor: Arc<dyn RemoteExecutor>,
) -> Result<Arc<dyn TreeTransfer>, TransferError> {
    match detect_strategy(settings.transfer, executor, &ssh_options(settings)) {
        Some(transfer) => {
            tracing::debug!(transport = transfer.name(), "transfer strategy selected");
            Ok(Arc::from(transfer))
        }
        None => Err(TransferError::NotAvailable(match settings.transfer {
            TransferMode::Auto => "neither rsync nor scp is installed locally".to_string(),
            TransferMode::Rsync => "rsync is pinned but not installed locally".to_string(),
            TransferMode::Scp => "scp is pinned but not installed locally".to_string(),
        })),
    }
}

/// Progress sink for the chosen output format
pub fn create_event_sink(format: OutputFormat, unicode: bool) -> Arc<dyn PipelineEventSink> {
    match format {
        OutputFormat::Text => Arc::new(ConsoleEventSink::stdout(unicode)),
        OutputFormat::Json => Arc::new(JsonEventSink::stdout()),
    }
}

/// Create an orchestrator with all dependencies wired up
///
/// Fails only when no transfer tool is available locally.
pub fn create_orchestrator(
    settings: &Settings,
    format: OutputFormat,
    unicode: bool,
    interrupt: Arc<AtomicBool>,
) -> Result<PipelineOrchestrator, TransferError> {
    let executor = create_executor(settings);
    let transfer = create_transfer(settings, executor.clone())?;
    Ok(PipelineOrchestrator::new(executor, transfer)
        .with_events(create_event_sink(format, unicode))
        .with_interrupt(interrupt))
}
