//! JSON Event Sink
//!
//! Outputs pipeline events as NDJSON for CI/automation consumption.

use crate::domain::ports::{PipelineEvent, PipelineEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

fn millis(elapsed: std::time::Duration) -> u64 {
    elapsed.as_millis().min(u64::MAX as u128) as u64
}

impl PipelineEventSink for JsonEventSink {
    fn on_event(&self, event: PipelineEvent) {
        let json = match event {
            PipelineEvent::RunStarted {
                destination,
                stamp,
                tree_count,
            } => {
                serde_json::json!({
                    "event": "start",
                    "command": "run",
                    "destination": destination,
                    "stamp": stamp,
                    "tree_count": tree_count,
                })
            }

            PipelineEvent::StageStarted { stage } => {
                serde_json::json!({
                    "event": "stage_start",
                    "stage": stage.name(),
                })
            }

            PipelineEvent::StageCompleted { stage, elapsed } => {
                serde_json::json!({
                    "event": "stage_complete",
                    "stage": stage.name(),
                    "elapsed_ms": millis(elapsed),
                })
            }

            PipelineEvent::StageWarning { stage, message } => {
                serde_json::json!({
                    "event": "stage_warning",
                    "stage": stage.name(),
                    "message": message,
                })
            }

            PipelineEvent::StageFailed { stage, reason } => {
                serde_json::json!({
                    "event": "stage_failed",
                    "stage": stage.name(),
                    "reason": reason,
                })
            }

            PipelineEvent::BackupCreated { record } => {
                let manifest = record.manifest().map(|m| {
                    serde_json::json!({
                        "size_kb": m.size_kb,
                        "file_count": m.file_count,
                    })
                });
                serde_json::json!({
                    "event": "backup",
                    "stamp": record.stamp().to_string(),
                    "path": record.path(),
                    "manifest": manifest,
                })
            }

            PipelineEvent::TreeSynced {
                name,
                destination,
                stats,
            } => {
                serde_json::json!({
                    "event": "tree_synced",
                    "name": name,
                    "destination": destination,
                    "transferred": stats.files_transferred,
                    "deleted": stats.files_deleted,
                    "bytes": stats.bytes_transferred,
                })
            }

            PipelineEvent::RunFinished {
                success,
                failed_stage,
                elapsed,
            } => {
                let status = if success { "success" } else { "aborted" };
                serde_json::json!({
                    "event": "complete",
                    "command": "run",
                    "status": status,
                    "failed_stage": failed_stage.map(|s| s.name()),
                    "elapsed_ms": millis(elapsed),
                })
            }
        };

        self.write_event(json);
    }
}
