//! Typed event kinds pushed by the Event Stream (§4.E).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ClauseId, DiffId, DocumentDiff, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    TaskStarted,
    ClauseStarted { clause_id: ClauseId },
    SkillInvoked { skill_id: String, clause_id: ClauseId },
    SkillCompleted { skill_id: String, clause_id: ClauseId, elapsed_ms: u64 },
    DiffProposed { diff: DocumentDiff },
    ApprovalRequired { pending_diff_ids: Vec<DiffId> },
    DiffResolved { diff_id: DiffId, approved: bool },
    ClauseCompleted { clause_id: ClauseId },
    ReviewComplete { applied_diffs: usize, rejected_diffs: usize },
    TaskFailed { reason: String },
    Heartbeat,
}

/// An event as it appears on the wire: kind-tagged body plus the
/// per-task sequencing metadata clients rely on for ordering (§4.E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub task_id: TaskId,
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(task_id: TaskId, sequence: u64, kind: EventKind) -> Self {
        Self {
            task_id,
            sequence,
            emitted_at: Utc::now(),
            kind,
        }
    }
}
