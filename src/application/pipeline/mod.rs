//! Pipeline Module
//!
//! Sequences the stages of a mirroring run.
//!
//! ## Structure
//!
//! - `orchestrator` - Stage sequencing (`PipelineOrchestrator`)
//! - `report` - Result of a run (`PipelineReport`)
//! - `plan` - Dry-run rendering of every stage's remote commands
//!
//! ## Usage
//!
//! ```ignore
//! use treemirror::application::pipeline::PipelineOrchestrator;
//!
//! let orchestrator = PipelineOrchestrator::new(executor, transfer).with_events(sink);
//! let report = orchestrator.run(&settings);
//! std::process::exit(report.exit_code());
//! ```

mod orchestrator;
mod plan;
mod report;

pub use orchestrator::PipelineOrchestrator;
pub use plan::{describe_plan, PlannedStage};
pub use report::PipelineReport;
