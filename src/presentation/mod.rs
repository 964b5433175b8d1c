//! Presentation Layer
//!
//! This layer handles:
//! - CLI argument parsing (via clap)
//! - Wiring the orchestrator to its infrastructure dependencies
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `cli` - Command-line interface
//! - `factory` - Creates the orchestrator with proper dependencies (dependency injection)
//! - `output` - Output rendering abstractions
//!
//! ## Usage
//!
//! ```ignore
//! use treemirror::presentation::factory;
//!
//! let orchestrator = factory::create_orchestrator(&settings, format, true, interrupt)?;
//! let report = orchestrator.run(&settings);
//! ```

pub mod cli;
pub mod factory;
pub mod output;

pub use cli::{Cli, Commands};
pub use factory::create_orchestrator;
pub use output::{create_renderer, OutputFormat, Renderer};
