//! Approval Coordinator (§4.D): the only writer of decisions on
//! suspended machines. Grounded on the teacher's `ExecutionTracker`
//! (`validation_agent/tracker.rs`) for the "record first, query later"
//! durability shape, generalized from a SQLite execution log to the
//! `PersistenceAdapter`'s transactional decision write.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::events::{EventKind, EventStream};
use crate::machine::{ReviewMachine, ReviewOutcome};
use crate::model::{Decision, DiffId, DiffStatus, TaskId, TaskPhase};
use crate::persistence::PersistenceAdapter;

/// One decision in an `approve_batch` call.
#[derive(Debug, Clone)]
pub struct DiffDecision {
    pub diff_id: DiffId,
    pub decision: Decision,
    pub feedback: Option<String>,
    pub user_modified_text: Option<String>,
}

pub struct ApprovalCoordinator {
    persistence: Arc<dyn PersistenceAdapter>,
    events: Arc<EventStream>,
    machine: Arc<ReviewMachine>,
}

impl ApprovalCoordinator {
    pub fn new(persistence: Arc<dyn PersistenceAdapter>, events: Arc<EventStream>, machine: Arc<ReviewMachine>) -> Self {
        Self { persistence, events, machine }
    }

    /// Records one decision. Does not resume the machine (§4.D).
    pub async fn approve(&self, task_id: TaskId, decision: DiffDecision) -> Result<()> {
        let task = self.persistence.load_task(task_id).await?;
        if task.phase != TaskPhase::Interrupted {
            return Err(Error::InvalidPhase {
                task: task_id.to_string(),
                expected: TaskPhase::Interrupted.to_string(),
                actual: task.phase.to_string(),
            });
        }

        let mut diff = self.persistence.load_diff(task_id, decision.diff_id).await?;
        if diff.status != DiffStatus::Pending {
            return Err(Error::DiffNotPending {
                diff: decision.diff_id.to_string(),
                status: format!("{:?}", diff.status),
            });
        }

        match decision.decision {
            Decision::Approved | Decision::ApprovedWithEdit => diff.approve(decision.user_modified_text.clone()),
            Decision::Rejected => diff.reject(decision.feedback.clone()),
        }

        self.persistence
            .record_decision(diff, decision.decision, decision.feedback)
            .await?;
        self.events.emit(
            task_id,
            EventKind::DiffResolved { diff_id: decision.diff_id, approved: decision.decision != Decision::Rejected },
        );
        Ok(())
    }

    /// Applies each decision independently; one invalid decision doesn't
    /// block the others (§4.D: "atomic per-diff").
    pub async fn approve_batch(&self, task_id: TaskId, decisions: Vec<DiffDecision>) -> Result<Vec<Result<()>>> {
        let mut results = Vec::with_capacity(decisions.len());
        for decision in decisions {
            results.push(self.approve(task_id, decision).await);
        }
        Ok(results)
    }

    /// Completeness check, then signals the machine to continue from
    /// `save_clause` (§4.D, §4.C).
    pub async fn resume(&self, task_id: TaskId) -> Result<ReviewOutcome> {
        let task = self.persistence.load_task(task_id).await?;
        if task.phase != TaskPhase::Interrupted {
            return Err(Error::InvalidPhase {
                task: task_id.to_string(),
                expected: TaskPhase::Interrupted.to_string(),
                actual: task.phase.to_string(),
            });
        }

        let pending = self.persistence.list_pending_diffs(task_id).await?;
        if !pending.is_empty() {
            return Err(Error::ApprovalIncomplete { task: task_id.to_string(), missing: pending.len() });
        }

        self.machine.resume_after_approval(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainPluginRegistry;
    use crate::machine::MachineConfig;
    use crate::model::{DiffAction, DiffLocation, DocumentId, Priority, TaskId as ModelTaskId, TextSpan};
    use crate::persistence::InMemoryPersistenceAdapter;
    use crate::skills::SkillRegistry;

    fn coordinator() -> (Arc<dyn PersistenceAdapter>, ApprovalCoordinator) {
        let persistence: Arc<dyn PersistenceAdapter> = Arc::new(InMemoryPersistenceAdapter::new());
        let events = Arc::new(EventStream::new());
        let skills = Arc::new(SkillRegistry::new());
        let domains = Arc::new(DomainPluginRegistry::new(vec![], Arc::clone(&skills)));
        let machine = Arc::new(ReviewMachine::new(
            skills,
            domains,
            Arc::clone(&persistence),
            Arc::clone(&events),
            MachineConfig::default(),
        ));
        (Arc::clone(&persistence), ApprovalCoordinator::new(persistence, events, machine))
    }

    async fn seed_pending_diff(persistence: &Arc<dyn PersistenceAdapter>, task_id: ModelTaskId) -> DiffId {
        use crate::model::DocumentDiff;
        let diff = DocumentDiff::new(
            task_id,
            DiffLocation {
                document_id: DocumentId::new(),
                clause_id: "4.1".into(),
                span: TextSpan { start: 0, end: 1 },
                paragraph_id: None,
            },
            DiffAction::Replace,
            None,
            Some("shall not be".into()),
            Priority::High,
            "risk".into(),
        );
        let diff_id = diff.id;
        persistence.save_diff(&diff).await.unwrap();
        diff_id
    }

    #[tokio::test]
    async fn resume_fails_when_decisions_incomplete() {
        let (persistence, coordinator) = coordinator();
        let mut task = crate::model::Task::new("Acme".into(), "en".into(), None);
        task.transition_to(TaskPhase::Interrupted);
        persistence.save_task(&task).await.unwrap();
        seed_pending_diff(&persistence, task.id).await;

        let err = coordinator.resume(task.id).await.unwrap_err();
        assert!(matches!(err, Error::ApprovalIncomplete { .. }));
    }

    #[tokio::test]
    async fn approving_a_non_pending_diff_is_rejected() {
        let (persistence, coordinator) = coordinator();
        let mut task = crate::model::Task::new("Acme".into(), "en".into(), None);
        task.transition_to(TaskPhase::Interrupted);
        persistence.save_task(&task).await.unwrap();
        let diff_id = seed_pending_diff(&persistence, task.id).await;

        coordinator
            .approve(task.id, DiffDecision { diff_id, decision: Decision::Approved, feedback: None, user_modified_text: None })
            .await
            .unwrap();

        let err = coordinator
            .approve(task.id, DiffDecision { diff_id, decision: Decision::Approved, feedback: None, user_modified_text: None })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DiffNotPending { .. }));
    }
}
