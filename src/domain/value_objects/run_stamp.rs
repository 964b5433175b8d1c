//! Run stamp value object
//!
//! A single timestamp captured when a pipeline run starts. Every name derived
//! from "now" during the run (the backup directory in particular) is built
//! from this one value, never from a fresh clock read.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::fmt;

/// Format used in backup directory names (sortable, second resolution)
pub const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Run-scoped timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunStamp(DateTime<Local>);

impl RunStamp {
    /// Capture the current local time.
    pub fn now() -> Self {
        Self(Local::now())
    }

    pub fn from_datetime(at: DateTime<Local>) -> Self {
        Self(at)
    }

    /// Parse a stamp previously rendered with [`STAMP_FORMAT`].
    pub fn parse(s: &str) -> Option<Self> {
        let naive = NaiveDateTime::parse_from_str(s, STAMP_FORMAT).ok()?;
        Local.from_local_datetime(&naive).single().map(Self)
    }

    pub fn datetime(&self) -> DateTime<Local> {
        self.0
    }

    /// RFC 3339 rendering for event streams.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl fmt::Display for RunStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STAMP_FORMAT))
    }
}
