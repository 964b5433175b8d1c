//! Domain Services
//!
//! Stateless logic shared by the stages and the transports.

pub mod mirror_plan;
pub mod shell;
pub mod supervisor_status;

pub use mirror_plan::{MirrorPlan, TreeListing};
pub use shell::{expand_home, quote_path, remote_join, shell_quote};
pub use supervisor_status::{parse_status_lines, states_for};
