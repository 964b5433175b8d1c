//! Domain Layer
//!
//! Pure types and rules of the mirroring pipeline, without I/O.
//!
//! ## Structure
//!
//! - `entities/` - Core domain entities (SyncSpec, BackupRecord, ServiceSet, PipelineRun)
//! - `value_objects/` - Immutable value types (RemoteTarget, RunStamp, ExcludePatterns)
//! - `services/` - Pure domain services (mirror planning, supervisor status, shell quoting)
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No remote I/O** - This layer never opens a network session
//! 2. **Pure Functions** - Services are stateless and testable
//! 3. **Ports & Adapters** - All remote work goes through trait-defined ports

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
