//! Port doubles shared by the contract tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use treemirror::domain::entities::SyncSpec;
use treemirror::domain::ports::{
    CommandOutput, PipelineEvent, PipelineEventSink, RemoteCommand, RemoteError, RemoteExecutor,
    SyncStats, TransferError, TreeTransfer,
};
use treemirror::domain::value_objects::RemoteTarget;
use treemirror::PipelineOrchestrator;

type Failure = fn() -> RemoteError;

/// Remote host double.
///
/// Answers the probe, `$HOME`, backup and manifest commands like a healthy
/// host, tracks supervisor state across stop/start, and lets a test override
/// any command containing a given needle.
#[derive(Default)]
pub struct ScriptedRemote {
    replies: Vec<(String, CommandOutput)>,
    failures: Vec<(String, Failure)>,
    stopped: Mutex<bool>,
    log: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Reply with `output` to any command containing `needle`.
    pub fn reply(mut self, needle: &str, output: CommandOutput) -> Self {
        self.replies.push((needle.to_string(), output));
        self
    }

    /// Fail any command containing `needle`.
    pub fn fail(mut self, needle: &str, failure: Failure) -> Self {
        self.failures.push((needle.to_string(), failure));
        self
    }

    /// Every command body received, in order
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.log().iter().any(|c| c.contains(needle))
    }

    /// Index of the first command containing `needle`
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.log().iter().position(|c| c.contains(needle))
    }
}

pub fn stdout(text: &str) -> CommandOutput {
    CommandOutput::new(0, text, "")
}

pub fn refused() -> RemoteError {
    RemoteError::ConnectionRefused("deploy@203.0.113.7".to_string())
}

pub fn timed_out() -> RemoteError {
    RemoteError::RemoteTimeout {
        after: Duration::from_secs(900),
    }
}

impl RemoteExecutor for ScriptedRemote {
    fn execute(
        &self,
        _target: &RemoteTarget,
        command: &RemoteCommand,
    ) -> Result<CommandOutput, RemoteError> {
        let body = command.body().to_string();
        self.log.lock().unwrap().push(body.clone());

        if let Some((_, failure)) = self.failures.iter().find(|(n, _)| body.contains(n.as_str())) {
            return Err(failure());
        }
        if let Some((_, out)) = self.replies.iter().find(|(n, _)| body.contains(n.as_str())) {
            return Ok(out.clone());
        }

        if body.contains("echo treemirror-ok") {
            return Ok(stdout("treemirror-ok\n"));
        }
        if body.contains("echo $HOME") {
            return Ok(stdout("/home/deploy\n"));
        }
        if body.contains("cp -a") {
            return Ok(stdout("created\n"));
        }
        if body.contains("du -sk") {
            return Ok(stdout("2048 31\n"));
        }
        if body.contains("supervisorctl") {
            let mut stopped = self.stopped.lock().unwrap();
            if body.contains(" stop ") {
                *stopped = true;
            } else if body.contains(" start ") {
                *stopped = false;
            }
            if body.ends_with(" status") {
                let line = if *stopped {
                    "api      STOPPED   Mar 05 07:15 AM\nworker   STOPPED   Mar 05 07:15 AM\n"
                } else {
                    "api      RUNNING   pid 812, uptime 0:00:03\nworker   RUNNING   pid 813, uptime 0:00:03\n"
                };
                return Ok(stdout(line));
            }
        }
        Ok(stdout(""))
    }
}

/// Transfer double that records destinations and can fail one tree.
#[derive(Default)]
pub struct RecordingTransfer {
    calls: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingTransfer {
    pub fn failing_on(destination: &str) -> Self {
        Self {
            fail_on: Some(destination.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TreeTransfer for RecordingTransfer {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn mirror(&self, _target: &RemoteTarget, spec: &SyncSpec) -> Result<SyncStats, TransferError> {
        self.calls.lock().unwrap().push(spec.destination().to_string());
        if self.fail_on.as_deref() == Some(spec.destination()) {
            return Err(TransferError::CommandFailed {
                program: "rsync",
                status: 12,
                stderr: "rsync: connection unexpectedly closed".to_string(),
            });
        }
        Ok(SyncStats {
            files_transferred: 4,
            bytes_transferred: 1024,
            ..Default::default()
        })
    }
}

/// Event sink that keeps every event.
#[derive(Default)]
pub struct EventLog(Mutex<Vec<PipelineEvent>>);

impl EventLog {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl PipelineEventSink for EventLog {
    fn on_event(&self, event: PipelineEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// Orchestrator wired to the given doubles.
pub fn orchestrator(
    remote: &Arc<ScriptedRemote>,
    transfer: &Arc<RecordingTransfer>,
    events: &Arc<EventLog>,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(remote.clone(), transfer.clone()).with_events(events.clone())
}
