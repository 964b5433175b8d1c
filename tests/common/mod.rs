//! Common test utilities for treemirror contract and scenario tests.
//!
//! This module provides:
//! - `ScriptedRemote` / `RecordingTransfer`: in-process doubles for the ports
//! - `fixtures`: settings and configuration builders
//! - `TestEnv`: a temp project with fake `ssh`/`rsync` on PATH for CLI runs

#![allow(dead_code)]

pub mod doubles;
pub mod env;
pub mod fixtures;

pub use doubles::*;
pub use env::*;
pub use fixtures::*;
