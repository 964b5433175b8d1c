//! Service Controller
//!
//! Stops, starts and queries the remote service set through `supervisorctl`.
//! `supervisorctl` exits non-zero whenever any process is not running, so
//! every decision here is made from parsed `status` output rather than from
//! exit codes.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{ServiceSet, ServiceState};
use crate::domain::ports::{RemoteCommand, RemoteError, RemoteExecutor};
use crate::domain::services::{shell_quote, states_for};
use crate::domain::value_objects::RemoteTarget;

/// Per-service state, in service set order.
pub type ServiceStatus = Vec<(String, ServiceState)>;

/// Result of `stop_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// Services still up after the supervisor's grace period
    PartialFailure(ServiceStatus),
}

/// Result of `start_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Services that did not reach RUNNING
    PartialFailure(ServiceStatus),
}

pub struct ServiceController {
    executor: Arc<dyn RemoteExecutor>,
    services: ServiceSet,
    supervisor_conf: Option<String>,
    timeout: Duration,
}

impl ServiceController {
    pub fn new(
        executor: Arc<dyn RemoteExecutor>,
        services: ServiceSet,
        supervisor_conf: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            executor,
            services,
            supervisor_conf,
            timeout,
        }
    }

    /// `supervisorctl [-c conf] <args>` with the target's privilege prefix.
    pub fn supervisorctl(target: &RemoteTarget, conf: Option<&str>, args: &str) -> String {
        let mut cmd = format!("{}supervisorctl", target.privileged_prefix());
        if let Some(conf) = conf {
            cmd.push_str(" -c ");
            cmd.push_str(&shell_quote(conf));
        }
        cmd.push(' ');
        cmd.push_str(args);
        cmd
    }

    fn ctl(&self, target: &RemoteTarget, args: &str) -> String {
        Self::supervisorctl(target, self.supervisor_conf.as_deref(), args)
    }

    pub fn stop_script(target: &RemoteTarget, conf: Option<&str>, services: &ServiceSet) -> String {
        Self::supervisorctl(target, conf, &format!("stop {}", quoted_names(services)))
    }

    /// Reload supervisor configuration, then start the set.
    pub fn start_script(target: &RemoteTarget, conf: Option<&str>, services: &ServiceSet) -> String {
        format!(
            "{}\n{}\n{}\n",
            Self::supervisorctl(target, conf, "reread"),
            Self::supervisorctl(target, conf, "update"),
            Self::supervisorctl(target, conf, &format!("start {}", quoted_names(services)))
        )
    }

    fn run(&self, target: &RemoteTarget, command: RemoteCommand) -> Result<(), RemoteError> {
        let out = self.executor.execute(target, &command.with_timeout(self.timeout))?;
        if !out.success() {
            tracing::debug!(
                status = out.status,
                stderr = %out.stderr.trim(),
                "supervisorctl reported a non-zero status"
            );
        }
        Ok(())
    }

    /// Current state of every service in the set.
    pub fn status(&self, target: &RemoteTarget) -> Result<ServiceStatus, RemoteError> {
        let command = RemoteCommand::command(self.ctl(target, "status")).with_timeout(self.timeout);
        let out = self.executor.execute(target, &command)?;
        Ok(states_for(&self.services, &out.stdout))
    }

    /// Stop every service; already-stopped services are a no-op.
    ///
    /// A stop command that outlives the timeout is reported as a partial
    /// failure for every service, since their state is unknown.
    pub fn stop_all(&self, target: &RemoteTarget) -> Result<StopOutcome, RemoteError> {
        if self.services.is_empty() {
            return Ok(StopOutcome::Stopped);
        }
        match self.run(target, RemoteCommand::command(Self::stop_script(
            target,
            self.supervisor_conf.as_deref(),
            &self.services,
        ))) {
            Ok(()) => {}
            Err(RemoteError::RemoteTimeout { after }) => {
                tracing::warn!(after_secs = after.as_secs(), "supervisorctl stop timed out");
                let unknown = self
                    .services
                    .iter()
                    .map(|n| (n.to_string(), ServiceState::Unknown("TIMEOUT".to_string())))
                    .collect();
                return Ok(StopOutcome::PartialFailure(unknown));
            }
            Err(e) => return Err(e),
        }

        let still_up: ServiceStatus = self
            .status(target)?
            .into_iter()
            .filter(|(_, state)| !state.is_down())
            .collect();
        if still_up.is_empty() {
            Ok(StopOutcome::Stopped)
        } else {
            Ok(StopOutcome::PartialFailure(still_up))
        }
    }

    /// Reload supervisor config and start every service; all must reach RUNNING.
    pub fn start_all(&self, target: &RemoteTarget) -> Result<StartOutcome, RemoteError> {
        if self.services.is_empty() {
            return Ok(StartOutcome::Started);
        }
        self.run(target, RemoteCommand::script(Self::start_script(
            target,
            self.supervisor_conf.as_deref(),
            &self.services,
        )))?;

        let not_running: ServiceStatus = self
            .status(target)?
            .into_iter()
            .filter(|(_, state)| !state.is_running())
            .collect();
        if not_running.is_empty() {
            Ok(StartOutcome::Started)
        } else {
            Ok(StartOutcome::PartialFailure(not_running))
        }
    }
}

fn quoted_names(services: &ServiceSet) -> String {
    services
        .iter()
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `name (STATE)` labels for messages.
pub fn describe(status: &ServiceStatus) -> Vec<String> {
    status
        .iter()
        .map(|(name, state)| format!("{} ({})", name, state))
        .collect()
}
