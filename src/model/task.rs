//! `Task`: the top-level unit of review work (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DomainId, TaskId};

/// Task lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Created,
    Uploading,
    Reviewing,
    Interrupted,
    Complete,
    Failed,
}

impl TaskPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TaskPhase::Created => "created",
            TaskPhase::Uploading => "uploading",
            TaskPhase::Reviewing => "reviewing",
            TaskPhase::Interrupted => "interrupted",
            TaskPhase::Complete => "complete",
            TaskPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a task entered `failed`, for the `task_failed` event and audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    MissingPrimaryDocument,
    StructureParseFailed { detail: String },
    SnapshotCorrupted { detail: String },
    Cancelled,
    Internal { detail: String },
}

/// A contract review task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Declared reviewing-party label (e.g. "Acme Corp (Buyer)").
    pub our_party: String,
    /// BCP-47-ish language tag (e.g. "en", "en-GB").
    pub language: String,
    /// Selected domain plugin, if any (§4.B: absence is a valid mode).
    pub domain_id: Option<DomainId>,
    pub phase: TaskPhase,
    /// Failure reason, set only once `phase == Failed`.
    pub failure_reason: Option<FailureReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(our_party: String, language: String, domain_id: Option<DomainId>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            our_party,
            language,
            domain_id,
            phase: TaskPhase::Created,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition_to(&mut self, phase: TaskPhase) {
        self.phase = phase;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, reason: FailureReason) {
        self.failure_reason = Some(reason);
        self.transition_to(TaskPhase::Failed);
    }
}
