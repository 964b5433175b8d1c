//! Application Layer
//!
//! Stage components and the orchestrator that sequences them.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Turns domain decisions into remote commands through the ports
//!
//! ## Stages
//!
//! - `ConnectivityProbe` - Reachability check before anything destructive
//! - `ServiceController` - Stop/start/status through the process supervisor
//! - `BackupManager` - Run-scoped copy of the workspace
//! - `WorkspaceWiper` - Junk sweep and workspace reset
//! - `TreeSynchronizer` - Mirror every sync spec through a `TreeTransfer`
//! - `PermissionFixer` - Ownership and executable bits
//! - `DependencyProvisioner` - Isolated environment + dependency install
//!
//! ## Orchestration
//!
//! - `PipelineOrchestrator` - Fail-fast sequencing, events, report

pub mod backup;
pub mod permissions;
pub mod pipeline;
pub mod probe;
pub mod provisioner;
pub mod services;
pub mod synchronizer;
pub mod wiper;

pub use backup::BackupManager;
pub use permissions::PermissionFixer;
pub use pipeline::{describe_plan, PipelineOrchestrator, PipelineReport, PlannedStage};
pub use probe::{ConnectivityProbe, ProbeResult};
pub use provisioner::DependencyProvisioner;
pub use services::{ServiceController, ServiceStatus, StartOutcome, StopOutcome};
pub use synchronizer::TreeSynchronizer;
pub use wiper::WorkspaceWiper;
