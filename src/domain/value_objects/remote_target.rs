//! Remote target value object
//!
//! The host/user/credential triple that identifies where a pipeline run acts.
//! Built once from configuration and passed by reference into every stage.

use std::fmt;
use std::path::{Path, PathBuf};

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Addressable remote host plus the credentials used to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    host: String,
    user: String,
    key: PathBuf,
    port: u16,
    sudo: bool,
}

impl RemoteTarget {
    pub fn new(host: impl Into<String>, user: impl Into<String>, key: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            key: key.into(),
            port: DEFAULT_SSH_PORT,
            sudo: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Run privileged remote commands through `sudo -n`.
    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Path to the private key used for authentication
    pub fn key(&self) -> &Path {
        &self.key
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn sudo(&self) -> bool {
        self.sudo
    }

    /// SSH destination string (`user@host`)
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Prefix for commands that need elevated privileges.
    pub fn privileged_prefix(&self) -> &'static str {
        if self.sudo {
            "sudo -n "
        } else {
            ""
        }
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == DEFAULT_SSH_PORT {
            write!(f, "{}@{}", self.user, self.host)
        } else {
            write!(f, "{}@{}:{}", self.user, self.host, self.port)
        }
    }
}
