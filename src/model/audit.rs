//! `ApprovalAudit`: the immutable trail of every decision made on a
//! [`super::diff::DocumentDiff`] (§3, §4.D, §7: approval decisions are
//! never lost on restart).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DiffId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    ApprovedWithEdit,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalAudit {
    pub task_id: TaskId,
    pub diff_id: DiffId,
    pub decision: Decision,
    /// Free-text feedback accompanying a rejection, fed back into the
    /// next `generate_diffs` pass for the same clause (§4.C, §4.D).
    pub feedback: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl ApprovalAudit {
    pub fn new(task_id: TaskId, diff_id: DiffId, decision: Decision, feedback: Option<String>) -> Self {
        Self {
            task_id,
            diff_id,
            decision,
            feedback,
            decided_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_carries_feedback() {
        let audit = ApprovalAudit::new(
            TaskId::new(),
            DiffId::new(),
            Decision::Rejected,
            Some("keep the original cap".into()),
        );
        assert_eq!(audit.decision, Decision::Rejected);
        assert!(audit.feedback.is_some());
    }
}
