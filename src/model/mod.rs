//! Core data model (§3): tasks, documents, clause structure, checklists,
//! findings, diffs, snapshots, and the approval audit trail.

pub mod audit;
pub mod checklist;
pub mod diff;
pub mod document;
pub mod findings;
pub mod ids;
pub mod snapshot;
pub mod structure;
pub mod task;

pub use audit::{ApprovalAudit, Decision};
pub use checklist::{Priority, ReviewChecklistItem};
pub use diff::{DiffAction, DiffLocation, DiffStatus, DocumentDiff};
pub use document::{check_singleton_role_admits, DocumentRole, TaskDocument};
pub use findings::{BaselineDeviation, ClauseFindings, CrossReferenceIssue, FinancialTerm, Risk, SkillFailure};
pub use ids::{ClauseId, DiffId, DocumentId, DomainId, SkillCallId, SkillId, TaskId};
pub use snapshot::{GlobalIssue, MachineSnapshot, NodeName};
pub use structure::{ClauseNode, CrossReference, Definition, DocumentStructure, TextSpan};
pub use task::{FailureReason, Task, TaskPhase};
