//! Service set entity
//!
//! The ordered group of long-running processes managed by the remote
//! process supervisor.

use std::fmt;

/// Ordered, duplicate-free list of supervisor program names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceSet {
    names: Vec<String>,
}

impl ServiceSet {
    /// Build a set, dropping repeated names while keeping first occurrence order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !name.trim().is_empty() && !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Process state as reported by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Starting,
    Stopping,
    Stopped,
    Exited,
    Backoff,
    Fatal,
    /// Not known to the supervisor at all
    Missing,
    Unknown(String),
}

impl ServiceState {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Self::Running,
            "STARTING" => Self::Starting,
            "STOPPING" => Self::Stopping,
            "STOPPED" => Self::Stopped,
            "EXITED" => Self::Exited,
            "BACKOFF" => Self::Backoff,
            "FATAL" => Self::Fatal,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Nothing is executing for this service.
    pub fn is_down(&self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::Exited | Self::Fatal | Self::Missing
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "RUNNING"),
            Self::Starting => write!(f, "STARTING"),
            Self::Stopping => write!(f, "STOPPING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Exited => write!(f, "EXITED"),
            Self::Backoff => write!(f, "BACKOFF"),
            Self::Fatal => write!(f, "FATAL"),
            Self::Missing => write!(f, "MISSING"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}
