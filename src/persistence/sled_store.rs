//! `sled`-backed `PersistenceAdapter` (feature `storage`), for deployments
//! that need the core's state to survive a process restart (§4.F, §9:
//! durable suspension across `human_approval`). Enriches the teacher's
//! own filesystem-based config persistence (`config/loader.rs`) with a
//! transactional embedded store, since plain files can't give §4.F's
//! atomic decision-plus-audit-plus-status write.

use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::error::{Error, Result};
use crate::model::{
    ApprovalAudit, ClauseFindings, Decision, DiffId, DiffStatus, DocumentDiff, DocumentId,
    DocumentStructure, MachineSnapshot, Task, TaskDocument, TaskId,
};

use super::traits::PersistenceAdapter;

const TREE_TASKS: &str = "tasks";
const TREE_DOCUMENTS: &str = "task_documents";
const TREE_STRUCTURES: &str = "document_structures";
const TREE_FINDINGS: &str = "clause_findings";
const TREE_DIFFS: &str = "diffs";
const TREE_AUDIT: &str = "approval_audit";
const TREE_SNAPSHOTS: &str = "machine_snapshots";

pub struct SledPersistenceAdapter {
    db: sled::Db,
}

impl SledPersistenceAdapter {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self, name: &str) -> Result<sled::Tree> {
        self.db.open_tree(name).map_err(Error::from)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

#[async_trait]
impl PersistenceAdapter for SledPersistenceAdapter {
    async fn save_task(&self, task: &Task) -> Result<()> {
        let tree = self.tree(TREE_TASKS)?;
        tree.insert(task.id.to_string(), encode(task)?)?;
        Ok(())
    }

    async fn load_task(&self, task_id: TaskId) -> Result<Task> {
        let tree = self.tree(TREE_TASKS)?;
        let bytes = tree
            .get(task_id.to_string())?
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        decode(&bytes)
    }

    async fn save_document(&self, document: &TaskDocument) -> Result<()> {
        let tree = self.tree(TREE_DOCUMENTS)?;
        let mut docs: Vec<TaskDocument> = match tree.get(document.task_id.to_string())? {
            Some(bytes) => decode(&bytes)?,
            None => Vec::new(),
        };
        if let Some(existing) = docs.iter_mut().find(|d| d.id == document.id) {
            *existing = document.clone();
        } else {
            docs.push(document.clone());
        }
        tree.insert(document.task_id.to_string(), encode(&docs)?)?;
        Ok(())
    }

    async fn list_documents(&self, task_id: TaskId) -> Result<Vec<TaskDocument>> {
        let tree = self.tree(TREE_DOCUMENTS)?;
        match tree.get(task_id.to_string())? {
            Some(bytes) => decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn save_document_structure(
        &self,
        document_id: DocumentId,
        structure: &DocumentStructure,
    ) -> Result<()> {
        let tree = self.tree(TREE_STRUCTURES)?;
        tree.insert(document_id.to_string(), encode(structure)?)?;
        Ok(())
    }

    async fn save_findings(&self, task_id: TaskId, findings: &ClauseFindings) -> Result<()> {
        let tree = self.tree(TREE_FINDINGS)?;
        let key = format!("{task_id}:{}", findings.clause_id);
        tree.insert(key, encode(findings)?)?;
        Ok(())
    }

    async fn load_findings(&self, task_id: TaskId, clause_id: &str) -> Result<Option<ClauseFindings>> {
        let tree = self.tree(TREE_FINDINGS)?;
        let key = format!("{task_id}:{clause_id}");
        match tree.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_diff(&self, diff: &DocumentDiff) -> Result<()> {
        let tree = self.tree(TREE_DIFFS)?;
        let key = format!("{}:{}", diff.task_id, diff.id);
        tree.insert(key, encode(diff)?)?;
        Ok(())
    }

    async fn load_diff(&self, task_id: TaskId, diff_id: DiffId) -> Result<DocumentDiff> {
        let tree = self.tree(TREE_DIFFS)?;
        let key = format!("{task_id}:{diff_id}");
        let bytes = tree.get(key)?.ok_or_else(|| Error::DiffNotFound {
            task: task_id.to_string(),
            diff: diff_id.to_string(),
        })?;
        decode(&bytes)
    }

    async fn list_pending_diffs(&self, task_id: TaskId) -> Result<Vec<DocumentDiff>> {
        let tree = self.tree(TREE_DIFFS)?;
        let prefix = format!("{task_id}:");
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item?;
            let diff: DocumentDiff = decode(&bytes)?;
            if diff.status == DiffStatus::Pending {
                out.push(diff);
            }
        }
        Ok(out)
    }

    async fn record_decision(
        &self,
        diff: DocumentDiff,
        decision: Decision,
        feedback: Option<String>,
    ) -> Result<()> {
        let diffs = self.tree(TREE_DIFFS)?;
        let audit = self.tree(TREE_AUDIT)?;

        let diff_key = format!("{}:{}", diff.task_id, diff.id);
        let diff_bytes = encode(&diff)?;

        let mut existing_audit: Vec<ApprovalAudit> = match audit.get(diff.task_id.to_string())? {
            Some(bytes) => decode(&bytes)?,
            None => Vec::new(),
        };
        existing_audit.push(ApprovalAudit::new(diff.task_id, diff.id, decision, feedback));
        let audit_bytes = encode(&existing_audit)?;

        let result: std::result::Result<(), TransactionError<Error>> =
            (&diffs, &audit).transaction(|(diffs, audit)| {
                diffs.insert(diff_key.as_bytes(), diff_bytes.clone())?;
                audit.insert(diff.task_id.to_string().as_bytes(), audit_bytes.clone())?;
                Ok(())
            });

        result.map_err(|e| Error::Persistence(e.to_string()))
    }

    async fn list_audit(&self, task_id: TaskId) -> Result<Vec<ApprovalAudit>> {
        let tree = self.tree(TREE_AUDIT)?;
        match tree.get(task_id.to_string())? {
            Some(bytes) => decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn save_snapshot(&self, snapshot: &MachineSnapshot) -> Result<()> {
        let tree = self.tree(TREE_SNAPSHOTS)?;
        tree.insert(snapshot.task_id.to_string(), encode(snapshot)?)?;
        Ok(())
    }

    async fn load_snapshot(&self, task_id: TaskId) -> Result<Option<MachineSnapshot>> {
        let tree = self.tree(TREE_SNAPSHOTS)?;
        match tree.get(task_id.to_string())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl From<ConflictableTransactionError<Error>> for Error {
    fn from(err: ConflictableTransactionError<Error>) -> Self {
        match err {
            ConflictableTransactionError::Abort(e) => e,
            other => Error::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_load_task_round_trips_through_sled() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledPersistenceAdapter::open(dir.path()).unwrap();
        let task = Task::new("Acme Corp".into(), "en".into(), None);
        store.save_task(&task).await.unwrap();
        let loaded = store.load_task(task.id).await.unwrap();
        assert_eq!(loaded.id, task.id);
    }
}
