//! Tree transfer strategies
//!
//! rsync is preferred; scp is the fallback when rsync is not installed.

mod rsync;
mod scp;

pub use rsync::{parse_rsync_output, RsyncTransfer};
pub use scp::{stage_plan, ScpTransfer};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ports::{RemoteExecutor, TreeTransfer};
use crate::infrastructure::ssh::SshOptions;

/// Which transport to use (`[transfer] strategy`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Auto,
    Rsync,
    Scp,
}

impl std::str::FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "rsync" => Ok(Self::Rsync),
            "scp" => Ok(Self::Scp),
            other => Err(format!(
                "unknown transfer strategy '{}' (expected auto, rsync or scp)",
                other
            )),
        }
    }
}

/// Detect and return the best available transfer strategy for `mode`.
///
/// A pinned mode only returns its own transport, so a missing rsync is
/// reported rather than silently replaced.
pub fn detect_strategy(
    mode: TransferMode,
    executor: Arc<dyn RemoteExecutor>,
    options: &SshOptions,
) -> Option<Box<dyn TreeTransfer>> {
    let rsync = || RsyncTransfer::new(executor.clone(), options.clone());
    let scp = || ScpTransfer::new(executor.clone(), options.clone());

    match mode {
        TransferMode::Rsync => {
            let rsync = rsync();
            rsync.is_available().then(|| Box::new(rsync) as Box<dyn TreeTransfer>)
        }
        TransferMode::Scp => {
            let scp = scp();
            scp.is_available().then(|| Box::new(scp) as Box<dyn TreeTransfer>)
        }
        TransferMode::Auto => {
            let rsync = rsync();
            if rsync.is_available() {
                return Some(Box::new(rsync));
            }
            let scp = scp();
            if scp.is_available() {
                return Some(Box::new(scp));
            }
            None
        }
    }
}
