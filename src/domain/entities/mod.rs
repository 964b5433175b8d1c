//! Domain Entities

mod backup_record;
mod pipeline_run;
mod service_set;
mod sync_spec;

pub use backup_record::{BackupManifest, BackupRecord};
pub use pipeline_run::{
    PipelineRun, RunState, Stage, StageOutcome, StageRecord, TransitionError,
};
pub use service_set::{ServiceSet, ServiceState};
pub use sync_spec::SyncSpec;
