//! Approval Coordinator (§4.D).

pub mod coordinator;

pub use coordinator::{ApprovalCoordinator, DiffDecision};
