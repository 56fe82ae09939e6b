//! In-memory `PersistenceAdapter`, used by tests and by any deployment
//! that doesn't need durability across restarts. Backed by `dashmap` for
//! the same lock-free-reads-after-startup shape as the skill registry.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::model::{
    ApprovalAudit, ClauseFindings, Decision, DiffId, DiffStatus, DocumentDiff, DocumentId,
    DocumentStructure, MachineSnapshot, Task, TaskDocument, TaskId,
};

use super::traits::PersistenceAdapter;

#[derive(Default)]
pub struct InMemoryPersistenceAdapter {
    tasks: DashMap<TaskId, Task>,
    documents: DashMap<TaskId, Vec<TaskDocument>>,
    structures: DashMap<DocumentId, DocumentStructure>,
    findings: DashMap<(TaskId, String), ClauseFindings>,
    diffs: DashMap<(TaskId, DiffId), DocumentDiff>,
    audit: DashMap<TaskId, Vec<ApprovalAudit>>,
    snapshots: DashMap<TaskId, MachineSnapshot>,
    /// Serializes the read-modify-write in `record_decision`, mirroring
    /// §4.F's single-transaction guarantee without a real transactional
    /// store behind it.
    decision_lock: Mutex<()>,
}

impl InMemoryPersistenceAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryPersistenceAdapter {
    async fn save_task(&self, task: &Task) -> Result<()> {
        self.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn load_task(&self, task_id: TaskId) -> Result<Task> {
        self.tasks
            .get(&task_id)
            .map(|t| t.clone())
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    async fn save_document(&self, document: &TaskDocument) -> Result<()> {
        let mut docs = self.documents.entry(document.task_id).or_default();
        if let Some(existing) = docs.iter_mut().find(|d| d.id == document.id) {
            *existing = document.clone();
        } else {
            docs.push(document.clone());
        }
        Ok(())
    }

    async fn list_documents(&self, task_id: TaskId) -> Result<Vec<TaskDocument>> {
        Ok(self.documents.get(&task_id).map(|d| d.clone()).unwrap_or_default())
    }

    async fn save_document_structure(
        &self,
        document_id: DocumentId,
        structure: &DocumentStructure,
    ) -> Result<()> {
        self.structures.insert(document_id, structure.clone());
        Ok(())
    }

    async fn save_findings(&self, task_id: TaskId, findings: &ClauseFindings) -> Result<()> {
        self.findings.insert((task_id, findings.clause_id.clone()), findings.clone());
        Ok(())
    }

    async fn load_findings(&self, task_id: TaskId, clause_id: &str) -> Result<Option<ClauseFindings>> {
        Ok(self.findings.get(&(task_id, clause_id.to_string())).map(|f| f.clone()))
    }

    async fn save_diff(&self, diff: &DocumentDiff) -> Result<()> {
        self.diffs.insert((diff.task_id, diff.id), diff.clone());
        Ok(())
    }

    async fn load_diff(&self, task_id: TaskId, diff_id: DiffId) -> Result<DocumentDiff> {
        self.diffs
            .get(&(task_id, diff_id))
            .map(|d| d.clone())
            .ok_or_else(|| Error::DiffNotFound {
                task: task_id.to_string(),
                diff: diff_id.to_string(),
            })
    }

    async fn list_pending_diffs(&self, task_id: TaskId) -> Result<Vec<DocumentDiff>> {
        Ok(self
            .diffs
            .iter()
            .filter(|e| e.key().0 == task_id && e.value().status == DiffStatus::Pending)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn record_decision(
        &self,
        diff: DocumentDiff,
        decision: Decision,
        feedback: Option<String>,
    ) -> Result<()> {
        let _guard = self.decision_lock.lock();
        let task_id = diff.task_id;
        let diff_id = diff.id;
        self.diffs.insert((task_id, diff_id), diff);
        let audit_entry = ApprovalAudit::new(task_id, diff_id, decision, feedback);
        self.audit.entry(task_id).or_default().push(audit_entry);
        Ok(())
    }

    async fn list_audit(&self, task_id: TaskId) -> Result<Vec<ApprovalAudit>> {
        Ok(self.audit.get(&task_id).map(|a| a.clone()).unwrap_or_default())
    }

    async fn save_snapshot(&self, snapshot: &MachineSnapshot) -> Result<()> {
        self.snapshots.insert(snapshot.task_id, snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self, task_id: TaskId) -> Result<Option<MachineSnapshot>> {
        Ok(self.snapshots.get(&task_id).map(|s| s.clone()))
    }
}
