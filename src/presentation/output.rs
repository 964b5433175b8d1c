//! Output Rendering
//!
//! Renders run reports, probe results, service status and dry-run plans as
//! text or JSON. Live progress is the event sinks' job; these renderers only
//! produce the final result of a command.

use crossterm::style::Stylize;
use serde_json::json;

use crate::application::{PipelineReport, PlannedStage, ProbeResult, ServiceStatus};
use crate::domain::entities::{Stage, StageOutcome};
use crate::domain::value_objects::RunStamp;

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// Single-line JSON for scripting
    Json,
}

/// Icons for output rendering
struct Icons {
    check: &'static str,
    cross: &'static str,
    warn: &'static str,
    bullet: &'static str,
}

impl Icons {
    fn unicode() -> Self {
        Self {
            check: "✓",
            cross: "✗",
            warn: "⚠",
            bullet: "•",
        }
    }

    fn ascii() -> Self {
        Self {
            check: "[OK]",
            cross: "[FAIL]",
            warn: "[WARN]",
            bullet: "-",
        }
    }
}

/// Renders command results
pub trait Renderer {
    /// Result of a pipeline run
    fn report(&self, report: &PipelineReport) -> String;

    /// Result of `check`
    fn check(&self, destination: &str, result: &ProbeResult) -> String;

    /// Result of `status`
    fn status(&self, destination: &str, status: &ServiceStatus) -> String;

    /// Result of `plan`
    fn plan(
        &self,
        destination: &str,
        stamp: &RunStamp,
        transport: &str,
        plan: &[PlannedStage],
    ) -> String;
}

/// Text renderer
pub struct TextRenderer {
    /// Whether to use colors
    pub color: bool,
    /// Whether to use unicode
    pub unicode: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            color: true,
            unicode: true,
        }
    }
}

impl TextRenderer {
    fn icons(&self) -> Icons {
        if self.unicode {
            Icons::unicode()
        } else {
            Icons::ascii()
        }
    }

    fn ok(&self, s: &str) -> String {
        if self.color {
            s.green().to_string()
        } else {
            s.to_string()
        }
    }

    fn bad(&self, s: &str) -> String {
        if self.color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn warn(&self, s: &str) -> String {
        if self.color {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }
}

fn recovery_hint(report: &PipelineReport) -> String {
    let wiped = report
        .history
        .iter()
        .any(|r| r.stage == Stage::Wipe && !matches!(r.outcome, StageOutcome::Failed(_)));
    match (wiped, report.backup.as_ref().and_then(|b| b.path())) {
        (false, _) => "remote workspace was not modified".to_string(),
        (true, Some(path)) => format!("restore the workspace from {}", path),
        (true, None) => "workspace did not exist before this run; nothing to restore".to_string(),
    }
}

impl Renderer for TextRenderer {
    fn report(&self, report: &PipelineReport) -> String {
        let icons = self.icons();
        let mut lines = Vec::new();

        if report.is_success() {
            lines.push(format!("{} Mirror complete", self.ok(icons.check)));
        } else {
            lines.push(format!("{} Mirror aborted", self.bad(icons.cross)));
        }
        lines.push(String::new());
        lines.push(format!("  target     {}", report.destination));
        lines.push(format!("  run        {}", report.stamp));
        lines.push(format!("  transport  {}", report.transport));
        match report.backup.as_ref() {
            Some(record) => match record.path() {
                Some(path) => lines.push(format!("  backup     {}", path)),
                None => lines.push("  backup     none (first deployment)".to_string()),
            },
            None => lines.push("  backup     not taken".to_string()),
        }
        if !report.synced.is_empty() {
            let total = report.total_synced();
            lines.push(format!(
                "  synced     {} tree(s), {} copied, {} deleted",
                report.synced.len(),
                total.files_transferred,
                total.files_deleted
            ));
        }

        if !report.warnings.is_empty() {
            lines.push(String::new());
            lines.push(format!("  Warnings ({}):", report.warnings.len()));
            for warning in &report.warnings {
                lines.push(format!("    {} {}", self.warn(icons.warn), warning));
            }
        }

        if let Some(err) = &report.error {
            lines.push(String::new());
            lines.push(format!("  failed     {}: {}", err.stage, err.reason));
            lines.push(format!("  recovery   {}", recovery_hint(report)));
        }
        lines.join("\n")
    }

    fn check(&self, destination: &str, result: &ProbeResult) -> String {
        let icons = self.icons();
        match result {
            ProbeResult::Reachable => format!("{} {} reachable", self.ok(icons.check), destination),
            ProbeResult::Unreachable(reason) => format!(
                "{} {} unreachable: {}",
                self.bad(icons.cross),
                destination,
                reason
            ),
        }
    }

    fn status(&self, destination: &str, status: &ServiceStatus) -> String {
        let icons = self.icons();
        if status.is_empty() {
            return format!("{} no services configured", destination);
        }
        let width = status.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        let mut lines = vec![destination.to_string()];
        for (name, state) in status {
            let icon = if state.is_running() {
                self.ok(icons.check)
            } else {
                self.bad(icons.cross)
            };
            lines.push(format!("  {} {:width$}  {}", icon, name, state, width = width));
        }
        lines.join("\n")
    }

    fn plan(
        &self,
        destination: &str,
        stamp: &RunStamp,
        transport: &str,
        plan: &[PlannedStage],
    ) -> String {
        let icons = self.icons();
        let mut lines = vec![format!(
            "Plan for {} (run {}, transport {})",
            destination, stamp, transport
        )];
        for (i, planned) in plan.iter().enumerate() {
            lines.push(String::new());
            lines.push(format!("[{}/{}] {}", i + 1, plan.len(), planned.stage));
            if planned.steps.is_empty() {
                lines.push("    (nothing to do)".to_string());
            }
            for step in &planned.steps {
                let mut step_lines = step.lines();
                if let Some(first) = step_lines.next() {
                    lines.push(format!("  {} {}", icons.bullet, first));
                }
                for rest in step_lines {
                    lines.push(format!("    {}", rest));
                }
            }
        }
        lines.join("\n")
    }
}

/// JSON renderer
pub struct JsonRenderer;

fn millis(elapsed: std::time::Duration) -> u64 {
    elapsed.as_millis().min(u64::MAX as u128) as u64
}

impl Renderer for JsonRenderer {
    fn report(&self, report: &PipelineReport) -> String {
        let stages: Vec<_> = report
            .history
            .iter()
            .map(|r| {
                let (outcome, message) = match &r.outcome {
                    StageOutcome::Succeeded => ("ok", None),
                    StageOutcome::Tolerated(m) => ("warning", Some(m.as_str())),
                    StageOutcome::Failed(m) => ("failed", Some(m.as_str())),
                };
                json!({
                    "stage": r.stage.name(),
                    "outcome": outcome,
                    "message": message,
                    "elapsed_ms": millis(r.elapsed),
                })
            })
            .collect();
        let synced: Vec<_> = report
            .synced
            .iter()
            .map(|(name, stats)| {
                json!({
                    "name": name,
                    "files_transferred": stats.files_transferred,
                    "files_deleted": stats.files_deleted,
                    "bytes_transferred": stats.bytes_transferred,
                })
            })
            .collect();
        let backup = report.backup.as_ref().map(|b| {
            json!({
                "path": b.path(),
                "size_kb": b.manifest().map(|m| m.size_kb),
                "file_count": b.manifest().map(|m| m.file_count),
            })
        });

        json!({
            "event": "report",
            "success": report.is_success(),
            "destination": report.destination,
            "stamp": report.stamp.to_string(),
            "transport": report.transport,
            "failed_stage": report.failed_stage().map(|s| s.name()),
            "error": report.error.as_ref().map(|e| e.reason.to_string()),
            "backup": backup,
            "synced": synced,
            "warnings": report.warnings,
            "stages": stages,
            "elapsed_ms": millis(report.elapsed),
        })
        .to_string()
    }

    fn check(&self, destination: &str, result: &ProbeResult) -> String {
        let reason = match result {
            ProbeResult::Reachable => None,
            ProbeResult::Unreachable(r) => Some(r.as_str()),
        };
        json!({
            "destination": destination,
            "reachable": result.is_reachable(),
            "reason": reason,
        })
        .to_string()
    }

    fn status(&self, destination: &str, status: &ServiceStatus) -> String {
        let services: Vec<_> = status
            .iter()
            .map(|(name, state)| {
                json!({
                    "name": name,
                    "state": state.to_string(),
                    "running": state.is_running(),
                })
            })
            .collect();
        json!({
            "destination": destination,
            "services": services,
        })
        .to_string()
    }

    fn plan(
        &self,
        destination: &str,
        stamp: &RunStamp,
        transport: &str,
        plan: &[PlannedStage],
    ) -> String {
        let stages: Vec<_> = plan
            .iter()
            .map(|p| json!({ "stage": p.stage.name(), "steps": p.steps }))
            .collect();
        json!({
            "destination": destination,
            "stamp": stamp.to_string(),
            "transport": transport,
            "stages": stages,
        })
        .to_string()
    }
}

/// Create a renderer based on format
pub fn create_renderer(format: OutputFormat, color: bool, unicode: bool) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Text => Box::new(TextRenderer { color, unicode }),
        OutputFormat::Json => Box::new(JsonRenderer),
    }
}
