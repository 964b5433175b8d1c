//! Console Event Sink
//!
//! Human-readable progress lines for an operator watching a run.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use crossterm::style::Stylize;
use is_terminal::IsTerminal;

use crate::domain::ports::{PipelineEvent, PipelineEventSink};

struct Icons {
    start: &'static str,
    ok: &'static str,
    fail: &'static str,
    warn: &'static str,
    arrow: &'static str,
}

impl Icons {
    fn unicode() -> Self {
        Self {
            start: "●",
            ok: "✓",
            fail: "✗",
            warn: "⚠",
            arrow: "↳",
        }
    }

    fn ascii() -> Self {
        Self {
            start: "[..]",
            ok: "[OK]",
            fail: "[FAIL]",
            warn: "[WARN]",
            arrow: "->",
        }
    }
}

/// Event sink that prints one line per event
pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    icons: Icons,
    color: bool,
}

impl ConsoleEventSink {
    /// Print to stdout, with color only on a terminal and without `NO_COLOR`.
    pub fn stdout(unicode: bool) -> Self {
        let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::with_writer(io::stdout(), unicode, color)
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W, unicode: bool, color: bool) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            icons: if unicode {
                Icons::unicode()
            } else {
                Icons::ascii()
            },
            color,
        }
    }

    fn line(&self, text: String) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", text);
            let _ = writer.flush();
        }
    }

    fn green(&self, s: &str) -> String {
        if self.color {
            s.green().to_string()
        } else {
            s.to_string()
        }
    }

    fn red(&self, s: &str) -> String {
        if self.color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn yellow(&self, s: &str) -> String {
        if self.color {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }

    fn dim(&self, s: &str) -> String {
        if self.color {
            s.dark_grey().to_string()
        } else {
            s.to_string()
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 60 {
        format!("{}m{:02}s", elapsed.as_secs() / 60, elapsed.as_secs() % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

impl PipelineEventSink for ConsoleEventSink {
    fn on_event(&self, event: PipelineEvent) {
        let text = match event {
            PipelineEvent::RunStarted {
                destination,
                stamp,
                tree_count,
            } => format!(
                "Mirroring {} tree(s) to {} (run {})",
                tree_count, destination, stamp
            ),
            PipelineEvent::StageStarted { stage } => {
                format!("{} {}", self.dim(self.icons.start), stage)
            }
            PipelineEvent::StageCompleted { stage, elapsed } => format!(
                "{} {} {}",
                self.green(self.icons.ok),
                stage,
                self.dim(&format_elapsed(elapsed))
            ),
            PipelineEvent::StageWarning { stage, message } => {
                format!("{} {}: {}", self.yellow(self.icons.warn), stage, message)
            }
            PipelineEvent::StageFailed { stage, reason } => {
                format!("{} {}: {}", self.red(self.icons.fail), stage, reason)
            }
            PipelineEvent::BackupCreated { record } => match record.path() {
                Some(path) => {
                    let size = record
                        .manifest()
                        .map(|m| format!(" ({} files, {} KiB)", m.file_count, m.size_kb))
                        .unwrap_or_default();
                    format!("  {} backup {}{}", self.icons.arrow, path, size)
                }
                None => format!("  {} nothing to back up (first deployment)", self.icons.arrow),
            },
            PipelineEvent::TreeSynced {
                name,
                destination,
                stats,
            } => format!(
                "  {} {} -> {} ({} copied, {} deleted)",
                self.icons.arrow,
                name,
                destination,
                stats.files_transferred,
                stats.files_deleted
            ),
            PipelineEvent::RunFinished {
                success,
                failed_stage,
                elapsed,
            } => {
                if success {
                    format!(
                        "{} Mirror complete in {}",
                        self.green(self.icons.ok),
                        format_elapsed(elapsed)
                    )
                } else {
                    let stage = failed_stage.map(|s| s.name()).unwrap_or("unknown stage");
                    format!("{} Aborted at {}", self.red(self.icons.fail), stage)
                }
            }
        };
        self.line(text);
    }
}
