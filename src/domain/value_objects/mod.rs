//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod exclude_patterns;
mod remote_target;
mod run_stamp;

pub use exclude_patterns::{ExcludeError, ExcludePatterns};
pub use remote_target::{RemoteTarget, DEFAULT_SSH_PORT};
pub use run_stamp::{RunStamp, STAMP_FORMAT};
