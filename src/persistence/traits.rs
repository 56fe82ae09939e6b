//! Persistence Adapter contract (§4.F): durable storage for tasks,
//! documents, clause findings, diffs, approval audit, and machine
//! snapshots. Transactional guarantee: `record_decision` applies the
//! decision, audit entry, and diff status change atomically.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    ApprovalAudit, ClauseFindings, Decision, DiffId, DocumentDiff, DocumentId, DocumentStructure,
    MachineSnapshot, Task, TaskDocument, TaskId,
};

#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn save_task(&self, task: &Task) -> Result<()>;
    async fn load_task(&self, task_id: TaskId) -> Result<Task>;

    async fn save_document(&self, document: &TaskDocument) -> Result<()>;
    async fn list_documents(&self, task_id: TaskId) -> Result<Vec<TaskDocument>>;
    async fn save_document_structure(
        &self,
        document_id: DocumentId,
        structure: &DocumentStructure,
    ) -> Result<()>;

    async fn save_findings(&self, task_id: TaskId, findings: &ClauseFindings) -> Result<()>;
    async fn load_findings(&self, task_id: TaskId, clause_id: &str) -> Result<Option<ClauseFindings>>;

    async fn save_diff(&self, diff: &DocumentDiff) -> Result<()>;
    async fn load_diff(&self, task_id: TaskId, diff_id: DiffId) -> Result<DocumentDiff>;
    async fn list_pending_diffs(&self, task_id: TaskId) -> Result<Vec<DocumentDiff>>;

    /// Atomically applies a decision to a diff and appends its audit
    /// entry (§4.F: "decision writes and status transitions ... must be
    /// atomic").
    async fn record_decision(
        &self,
        diff: DocumentDiff,
        decision: Decision,
        feedback: Option<String>,
    ) -> Result<()>;

    async fn list_audit(&self, task_id: TaskId) -> Result<Vec<ApprovalAudit>>;

    async fn save_snapshot(&self, snapshot: &MachineSnapshot) -> Result<()>;
    async fn load_snapshot(&self, task_id: TaskId) -> Result<Option<MachineSnapshot>>;
}
