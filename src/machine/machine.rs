//! Review State Machine (§4.C): drives the per-task clause loop,
//! suspending at `human_approval` and resuming from a durable snapshot.
//! Grounded on the teacher's `TaskScheduler` (`task_scheduler/scheduler.rs`):
//! same shape of plan + mutable execution state + monitor-style event
//! emission, generalized from a sprint DAG to a linear clause checklist
//! with one genuine suspension point instead of parallel agent dispatch.

use std::sync::Arc;

use serde_json::json;
use tracing::instrument;

use crate::domain::DomainPluginRegistry;
use crate::error::{Error, Result};
use crate::events::{EventKind, EventStream};
use crate::model::{
    ClauseFindings, DiffId, DiffStatus, DocumentStructure, ReviewChecklistItem, SkillFailure, Task,
    TaskDocument, TaskId, TaskPhase,
};
use crate::persistence::PersistenceAdapter;
use crate::skills::SkillRegistry;

use super::config::MachineConfig;
use super::context::{ClauseContext, ExecutionPlan, PlannedClause};
use super::node::{Node, ValidateOutcome};
use super::strategy::{ClauseValidator, DefaultClauseValidator, DefaultDiffGenerator, DiffGenerator};

/// Result of driving a task as far as it can go without a new decision.
#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    /// Halted at `human_approval`; these diffs need decisions before
    /// `resume` can proceed.
    Suspended { pending_diff_ids: Vec<DiffId> },
    Complete,
    Failed { reason: String },
}

pub struct ReviewMachine {
    skills: Arc<SkillRegistry>,
    domains: Arc<DomainPluginRegistry>,
    persistence: Arc<dyn PersistenceAdapter>,
    events: Arc<EventStream>,
    config: MachineConfig,
    validator: Arc<dyn ClauseValidator>,
    diff_generator: Arc<dyn DiffGenerator>,
}

impl ReviewMachine {
    pub fn new(
        skills: Arc<SkillRegistry>,
        domains: Arc<DomainPluginRegistry>,
        persistence: Arc<dyn PersistenceAdapter>,
        events: Arc<EventStream>,
        config: MachineConfig,
    ) -> Self {
        Self {
            skills,
            domains,
            persistence,
            events,
            config,
            validator: Arc::new(DefaultClauseValidator),
            diff_generator: Arc::new(DefaultDiffGenerator),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn ClauseValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_diff_generator(mut self, generator: Arc<dyn DiffGenerator>) -> Self {
        self.diff_generator = generator;
        self
    }

    /// Checks every skill a clause in `plan` requires is registered and
    /// available to `domain_id` (§4.B: `effective_skills`), returning the
    /// first one that isn't. Catches a misconfigured domain plugin or
    /// checklist up front instead of failing deep into the clause loop.
    fn first_unregistered_skill(&self, plan: &ExecutionPlan, domain_id: Option<&str>) -> Option<String> {
        let available = self.domains.effective_skills(domain_id);
        plan.iter()
            .flat_map(|clause| &clause.skill_ids)
            .find(|skill_id| !available.contains_key(*skill_id))
            .cloned()
    }

    async fn fail_task(&self, mut task: Task, reason: crate::model::FailureReason) -> Result<ReviewOutcome> {
        let message = reason_message(&reason);
        task.fail(reason);
        self.persistence.save_task(&task).await?;
        self.events.emit(task.id, EventKind::TaskFailed { reason: message.clone() });
        Ok(ReviewOutcome::Failed { reason: message })
    }

    /// `setup` + `plan`, then drives the clause loop (§4.C nodes 1-2
    /// followed by the clause cycle).
    #[instrument(skip(self))]
    pub async fn start_review(&self, task_id: TaskId) -> Result<ReviewOutcome> {
        let mut task = self.persistence.load_task(task_id).await?;
        if task.phase != TaskPhase::Uploading {
            return Err(Error::InvalidPhase {
                task: task_id.to_string(),
                expected: TaskPhase::Uploading.to_string(),
                actual: task.phase.to_string(),
            });
        }

        // setup
        let documents = self.persistence.list_documents(task_id).await?;
        let primary = match documents.iter().find(|d| d.role == crate::model::DocumentRole::Primary) {
            Some(doc) => doc.clone(),
            None => return self.fail_task(task, crate::model::FailureReason::MissingPrimaryDocument).await,
        };
        let structure = match &primary.structure {
            Some(structure) => structure.clone(),
            None => {
                return self
                    .fail_task(
                        task,
                        crate::model::FailureReason::StructureParseFailed {
                            detail: "primary document has no parsed structure".into(),
                        },
                    )
                    .await
            }
        };

        task.transition_to(TaskPhase::Reviewing);
        self.persistence.save_task(&task).await?;
        self.events.emit(task_id, EventKind::TaskStarted);

        // plan
        let effective = self.domains.effective_config(task.domain_id.as_deref());
        let plan = build_execution_plan(&effective.checklist, &structure);
        if let Some(missing) = self.first_unregistered_skill(&plan, task.domain_id.as_deref()) {
            return self
                .fail_task(
                    task,
                    crate::model::FailureReason::Internal {
                        detail: format!("checklist requires unregistered skill '{missing}'"),
                    },
                )
                .await;
        }

        let mut snapshot = crate::model::MachineSnapshot::new(task_id, Node::ClauseContext.name().into());
        snapshot.pending_clauses = plan.iter().map(|p| p.clause_id.clone()).collect();
        self.persistence.save_snapshot(&snapshot).await?;

        self.run_clause_loop(task, plan, snapshot, documents, structure, effective.baseline_blob_handle)
            .await
    }

    /// Continues a suspended task from `save_clause`, applying whatever
    /// decisions the Approval Coordinator has already recorded against
    /// this clause's diffs (§4.C routing table, §4.D).
    #[instrument(skip(self))]
    pub async fn resume_after_approval(&self, task_id: TaskId) -> Result<ReviewOutcome> {
        let mut task = self.persistence.load_task(task_id).await?;
        if task.phase != TaskPhase::Interrupted {
            return Err(Error::InvalidPhase {
                task: task_id.to_string(),
                expected: TaskPhase::Interrupted.to_string(),
                actual: task.phase.to_string(),
            });
        }
        let mut snapshot = self
            .persistence
            .load_snapshot(task_id)
            .await?
            .ok_or_else(|| Error::SnapshotCorrupted { task: task_id.to_string(), reason: "no snapshot".into() })?;

        let documents = self.persistence.list_documents(task_id).await?;
        let primary = documents
            .iter()
            .find(|d| d.role == crate::model::DocumentRole::Primary)
            .cloned()
            .ok_or_else(|| Error::MissingPrimaryDocument(task_id.to_string()))?;
        let structure = primary
            .structure
            .clone()
            .ok_or_else(|| Error::StructureParseFailed("primary document has no parsed structure".into()))?;

        let effective = self.domains.effective_config(task.domain_id.as_deref());
        let plan = build_execution_plan(&effective.checklist, &structure);
        if let Some(missing) = self.first_unregistered_skill(&plan, task.domain_id.as_deref()) {
            return self
                .fail_task(
                    task,
                    crate::model::FailureReason::Internal {
                        detail: format!("checklist requires unregistered skill '{missing}'"),
                    },
                )
                .await;
        }

        task.transition_to(TaskPhase::Reviewing);
        self.persistence.save_task(&task).await?;

        let outcome = self.save_clause(&mut task, &mut snapshot, &documents).await?;

        match outcome {
            ClauseStepOutcome::Suspend(pending) => Ok(ReviewOutcome::Suspended { pending_diff_ids: pending }),
            ClauseStepOutcome::Continue => {
                self.run_clause_loop(task, plan, snapshot, documents, structure, effective.baseline_blob_handle)
                    .await
            }
        }
    }

    async fn run_clause_loop(
        &self,
        mut task: Task,
        plan: ExecutionPlan,
        mut snapshot: crate::model::MachineSnapshot,
        documents: Vec<TaskDocument>,
        structure: DocumentStructure,
        baseline_blob_handle: Option<String>,
    ) -> Result<ReviewOutcome> {
        loop {
            let Some(clause_id) = snapshot.pending_clauses.first().cloned() else {
                return self.finalize(task, snapshot).await;
            };
            let planned = plan
                .iter()
                .find(|p| p.clause_id == clause_id)
                .expect("pending_clauses is derived from plan");

            // clause_context
            self.events.emit(task.id, EventKind::ClauseStarted { clause_id: clause_id.clone() });
            let context = build_clause_context(&structure, &documents, planned, baseline_blob_handle.as_deref());

            // clause_analyze (+ validate_strategy retry loop). Findings are
            // persisted after every pass, not just the final one, so a
            // crash mid-retry doesn't lose skill output already gathered
            // and a skipped clause still keeps its recorded failures.
            let (findings, passed) = loop {
                let findings = self.clause_analyze(task.id, planned, &context).await?;
                self.persistence.save_findings(task.id, &findings).await?;
                let retry_count = snapshot.clause_retry_count(&clause_id);
                match self.validator.evaluate(&findings, retry_count, self.config.clause_retry_limit) {
                    ValidateOutcome::Pass => break (findings, true),
                    ValidateOutcome::Retry => {
                        snapshot.increment_clause_retry(&clause_id);
                        self.persistence.save_snapshot(&snapshot).await?;
                        continue;
                    }
                    ValidateOutcome::SkipClause => break (findings, false),
                }
            };

            let Some(findings) = passed.then_some(findings) else {
                self.events.emit(task.id, EventKind::ClauseCompleted { clause_id: clause_id.clone() });
                snapshot.pending_clauses.remove(0);
                snapshot.current_node = Node::ClauseContext.name().into();
                self.persistence.save_snapshot(&snapshot).await?;
                continue;
            };

            // generate_diffs
            let diffs = self.diff_generator.generate(task.id, primary_document_id(&documents), &findings, None);
            for diff in &diffs {
                self.persistence.save_diff(diff).await?;
                self.events.emit(task.id, EventKind::DiffProposed { diff: diff.clone() });
            }
            snapshot.current_clause_diff_ids = diffs.iter().map(|d| d.id).collect();
            snapshot.current_node = Node::HumanApproval.name().into();
            self.persistence.save_snapshot(&snapshot).await?;

            // human_approval
            if !diffs.is_empty() {
                task.transition_to(TaskPhase::Interrupted);
                self.persistence.save_task(&task).await?;
                let pending_diff_ids: Vec<DiffId> = diffs.iter().map(|d| d.id).collect();
                self.events.emit(
                    task.id,
                    EventKind::ApprovalRequired { pending_diff_ids: pending_diff_ids.clone() },
                );
                return Ok(ReviewOutcome::Suspended { pending_diff_ids });
            }

            // No diffs proposed: save_clause has nothing to decide, advance directly.
            self.events.emit(task.id, EventKind::ClauseCompleted { clause_id: clause_id.clone() });
            snapshot.pending_clauses.remove(0);
            snapshot.current_node = Node::ClauseContext.name().into();
            self.persistence.save_snapshot(&snapshot).await?;
        }
    }

    async fn clause_analyze(
        &self,
        task_id: TaskId,
        planned: &PlannedClause,
        context: &ClauseContext,
    ) -> Result<ClauseFindings> {
        let mut findings = self
            .persistence
            .load_findings(task_id, &planned.clause_id)
            .await?
            .unwrap_or_else(|| ClauseFindings::new(planned.clause_id.clone()));

        for skill_id in &planned.skill_ids {
            self.events.emit(
                task_id,
                EventKind::SkillInvoked { skill_id: skill_id.clone(), clause_id: planned.clause_id.clone() },
            );
            let input = json!({
                "clause_id": planned.clause_id,
                "text": context.merged_text(),
                "scratchpad": findings.scratchpad,
            });
            match self.skills.call(skill_id, input).await {
                Ok(outcome) => {
                    self.events.emit(
                        task_id,
                        EventKind::SkillCompleted {
                            skill_id: skill_id.clone(),
                            clause_id: planned.clause_id.clone(),
                            elapsed_ms: outcome.elapsed.as_millis() as u64,
                        },
                    );
                    merge_skill_output(&mut findings, &outcome.output);
                }
                Err(err) => {
                    // Skill failure is non-fatal at this layer (§4.C): record it
                    // in findings and keep going with whatever succeeded.
                    findings.skill_failures.push(SkillFailure { skill_id: skill_id.clone(), reason: err.to_string() });
                }
            }
        }

        Ok(findings)
    }

    async fn save_clause(
        &self,
        task: &mut Task,
        snapshot: &mut crate::model::MachineSnapshot,
        documents: &[TaskDocument],
    ) -> Result<ClauseStepOutcome> {
        let Some(clause_id) = snapshot.pending_clauses.first().cloned() else {
            return Ok(ClauseStepOutcome::Continue);
        };

        let mut rejection_feedback: Option<String> = None;
        let mut all_decided_or_exhausted = true;

        for diff_id in snapshot.current_clause_diff_ids.clone() {
            let diff = self.persistence.load_diff(task.id, diff_id).await?;
            match diff.status {
                DiffStatus::Pending => return Err(Error::ApprovalIncomplete { task: task.id.to_string(), missing: 1 }),
                DiffStatus::Approved => snapshot.applied_diff_ids.push(diff_id),
                DiffStatus::Rejected => {
                    // Keyed by clause, not diff id: each regeneration mints a
                    // fresh `DiffId`, so counting against that id would never
                    // accumulate and the cap would never bind.
                    let retry_count = snapshot.reject_retry_count(&clause_id);
                    if retry_count < self.config.reject_retry_limit {
                        snapshot.increment_reject_retry(&clause_id);
                        rejection_feedback = diff.feedback.clone();
                        all_decided_or_exhausted = false;
                    } else {
                        snapshot.rejected_diff_ids.push(diff_id);
                    }
                }
            }
        }

        if !all_decided_or_exhausted {
            // Regenerate diffs for this clause with the rejection feedback
            // injected (§4.C routing: save_clause -> generate_diffs).
            let findings = self
                .persistence
                .load_findings(task.id, &clause_id)
                .await?
                .unwrap_or_else(|| ClauseFindings::new(clause_id.clone()));

            let diffs = self.diff_generator.generate(
                task.id,
                primary_document_id(documents),
                &findings,
                rejection_feedback.as_deref(),
            );
            for diff in &diffs {
                self.persistence.save_diff(diff).await?;
                self.events.emit(task.id, EventKind::DiffProposed { diff: diff.clone() });
            }
            snapshot.current_clause_diff_ids = diffs.iter().map(|d| d.id).collect();
            snapshot.current_node = Node::HumanApproval.name().into();
            self.persistence.save_snapshot(&snapshot).await?;

            if !diffs.is_empty() {
                task.transition_to(TaskPhase::Interrupted);
                self.persistence.save_task(task).await?;
                let pending_diff_ids: Vec<DiffId> = diffs.iter().map(|d| d.id).collect();
                self.events.emit(task.id, EventKind::ApprovalRequired { pending_diff_ids: pending_diff_ids.clone() });
                return Ok(ClauseStepOutcome::Suspend(pending_diff_ids));
            }
        }

        for diff_id in &snapshot.current_clause_diff_ids {
            let approved = matches!(
                self.persistence.load_diff(task.id, *diff_id).await?.status,
                DiffStatus::Approved
            );
            self.events.emit(task.id, EventKind::DiffResolved { diff_id: *diff_id, approved });
        }

        self.events.emit(task.id, EventKind::ClauseCompleted { clause_id: clause_id.clone() });
        snapshot.current_clause_diff_ids.clear();
        snapshot.pending_clauses.remove(0);
        snapshot.current_node = Node::ClauseContext.name().into();
        self.persistence.save_snapshot(snapshot).await?;
        Ok(ClauseStepOutcome::Continue)
    }

    async fn finalize(&self, mut task: Task, mut snapshot: crate::model::MachineSnapshot) -> Result<ReviewOutcome> {
        snapshot.current_node = Node::Finalize.name().into();
        self.persistence.save_snapshot(&snapshot).await?;
        task.transition_to(TaskPhase::Complete);
        self.persistence.save_task(&task).await?;
        self.events.emit(
            task.id,
            EventKind::ReviewComplete {
                applied_diffs: snapshot.applied_diff_ids.len(),
                rejected_diffs: snapshot.rejected_diff_ids.len(),
            },
        );
        Ok(ReviewOutcome::Complete)
    }
}

enum ClauseStepOutcome {
    Suspend(Vec<DiffId>),
    Continue,
}

fn reason_message(reason: &crate::model::FailureReason) -> String {
    use crate::model::FailureReason::*;
    match reason {
        MissingPrimaryDocument => "task has no primary document".into(),
        StructureParseFailed { detail } => format!("structure parse failed: {detail}"),
        SnapshotCorrupted { detail } => format!("snapshot corrupted: {detail}"),
        Cancelled => "cancelled".into(),
        Internal { detail } => format!("internal error: {detail}"),
    }
}

fn primary_document_id(documents: &[TaskDocument]) -> crate::model::DocumentId {
    documents
        .iter()
        .find(|d| d.role == crate::model::DocumentRole::Primary)
        .map(|d| d.id)
        .expect("caller has already verified a primary document exists")
}

/// `plan` node: checklist items filtered by document contents, expanded
/// to one `(clause_id, [skill_ids])` pair per clause the checklist
/// actually reaches. A wildcard checklist item (`clause_id: None`)
/// applies to every clause in the structure.
fn build_execution_plan(checklist: &[ReviewChecklistItem], structure: &DocumentStructure) -> ExecutionPlan {
    let mut plan: Vec<PlannedClause> = Vec::new();
    for clause in structure.clauses() {
        let skill_ids: Vec<String> = checklist
            .iter()
            .filter(|item| item.clause_id.as_deref() == Some(clause.clause_id.as_str()) || item.is_wildcard())
            .flat_map(|item| item.required_skill_ids.clone())
            .collect();
        if !skill_ids.is_empty() {
            plan.push(PlannedClause { clause_id: clause.clause_id.clone(), skill_ids });
        }
    }
    plan
}

fn build_clause_context(
    structure: &DocumentStructure,
    documents: &[TaskDocument],
    planned: &PlannedClause,
    baseline_blob_handle: Option<&str>,
) -> ClauseContext {
    let clause_text = structure
        .find_clause(&planned.clause_id)
        .map(|c| format!("[{}] {}", c.clause_id, c.title))
        .unwrap_or_default();

    let baseline_text = baseline_blob_handle.map(|handle| format!("baseline:{handle}"));

    let supplement_texts = documents
        .iter()
        .filter(|d| d.role == crate::model::DocumentRole::Supplement)
        .map(|d| format!("supplement:{}", d.filename))
        .collect();

    ClauseContext { clause_text, baseline_text, supplement_texts }
}

/// Merges a skill's JSON output into accumulated findings. Skills are
/// free to return any subset of these keys; unrecognized keys are
/// ignored (§4.A: output is only validated against the skill's own
/// declared schema, not against this shape).
fn merge_skill_output(findings: &mut ClauseFindings, output: &serde_json::Value) {
    if let Some(risks) = output.get("risks").and_then(|v| v.as_array()) {
        for risk in risks {
            if let Ok(risk) = serde_json::from_value::<crate::model::Risk>(risk.clone()) {
                findings.risks.push(risk);
            }
        }
    }
    if let Some(note) = output.get("note").and_then(|v| v.as_str()) {
        findings.scratchpad.push(note.to_string());
    }
}
