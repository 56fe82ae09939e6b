//! `TaskDocument`: a document bound to a task (§3).

use serde::{Deserialize, Serialize};

use super::ids::{DocumentId, TaskId};
use super::structure::DocumentStructure;

/// Role a document plays within a task. A task admits at most one
/// `Primary` and one `Standard`; other roles may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Primary,
    Baseline,
    Supplement,
    Reference,
    Standard,
}

impl DocumentRole {
    /// Roles that a task may hold at most one of.
    pub fn is_singleton(&self) -> bool {
        matches!(self, DocumentRole::Primary | DocumentRole::Standard)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDocument {
    pub id: DocumentId,
    pub task_id: TaskId,
    pub role: DocumentRole,
    pub filename: String,
    /// Handle into the blob store (opaque to the core; see `BlobStore`).
    pub blob_handle: String,
    /// Populated once the `DocumentParser` collaborator has run.
    pub structure: Option<DocumentStructure>,
}

impl TaskDocument {
    pub fn new(task_id: TaskId, role: DocumentRole, filename: String, blob_handle: String) -> Self {
        Self {
            id: DocumentId::new(),
            task_id,
            role,
            filename,
            blob_handle,
            structure: None,
        }
    }
}

/// Validates the "at most one primary, at most one standard" invariant
/// before a new document of `role` is admitted.
pub fn check_singleton_role_admits(existing: &[TaskDocument], role: DocumentRole) -> bool {
    if !role.is_singleton() {
        return true;
    }
    !existing.iter().any(|d| d.role == role)
}
