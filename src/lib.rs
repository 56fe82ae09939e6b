//! Agentic legal-document review orchestration core.
//!
//! Six components compose the system: a skill registry & dispatcher, a
//! domain plugin registry, a clause-driven review state machine, an
//! approval coordinator, a per-task event stream, and a persistence
//! adapter. [`commands::ReviewCore`] is the facade that wires all six
//! together for a host process.

pub mod approval;
pub mod collaborators;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod machine;
pub mod model;
pub mod persistence;
pub mod skills;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use commands::{DomainDescriptor, ReviewCore, TaskStatus};
pub use error::{Error, Result};
