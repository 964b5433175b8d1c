//! SSH Infrastructure
//!
//! Remote execution over the system OpenSSH client.

mod executor;
mod options;
mod process;

pub use executor::SshExecutor;
pub use options::{SshOptions, DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
pub(crate) use process::run_captured;
