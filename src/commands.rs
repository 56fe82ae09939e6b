//! External command surface (§6). `ReviewCore` is the single entry point
//! a host process (HTTP handler, CLI, test) drives the system through;
//! no wire protocol is prescribed, so this is a plain async API.

use std::sync::Arc;

use crate::approval::{ApprovalCoordinator, DiffDecision};
use crate::collaborators::{BlobStore, DocumentParser};
use crate::domain::DomainPluginRegistry;
use crate::error::{Error, Result};
use crate::events::EventStream;
use crate::machine::{ClauseValidator, DiffGenerator, MachineConfig, ReviewMachine, ReviewOutcome};
use crate::model::{Decision, DiffId, DocumentId, DocumentRole, DomainId, Task, TaskDocument, TaskId, TaskPhase};
use crate::persistence::PersistenceAdapter;
use crate::skills::{SkillBackend, SkillBackendKind, SkillRegistration, SkillRegistry};

pub struct DomainDescriptor {
    pub id: DomainId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TaskStatus {
    pub phase: TaskPhase,
    pub current_clause: Option<String>,
    pub pending_count: usize,
}

/// Facade over the six components, exposing the command surface of §6.
pub struct ReviewCore {
    persistence: Arc<dyn PersistenceAdapter>,
    events: Arc<EventStream>,
    skills: Arc<SkillRegistry>,
    domains: Arc<DomainPluginRegistry>,
    machine: Arc<ReviewMachine>,
    approvals: ApprovalCoordinator,
    blob_store: Arc<dyn BlobStore>,
    parser: Arc<dyn DocumentParser>,
}

impl ReviewCore {
    pub fn new(
        persistence: Arc<dyn PersistenceAdapter>,
        events: Arc<EventStream>,
        skills: Arc<SkillRegistry>,
        domains: Arc<DomainPluginRegistry>,
        blob_store: Arc<dyn BlobStore>,
        parser: Arc<dyn DocumentParser>,
        machine_config: MachineConfig,
    ) -> Self {
        Self::with_strategies(persistence, events, skills, domains, blob_store, parser, machine_config, None, None)
    }

    /// As [`Self::new`], but lets a caller plug in a [`ClauseValidator`]
    /// and/or [`DiffGenerator`] other than the defaults — primarily for
    /// tests that need deterministic clause-pass/diff-proposal behavior
    /// without real skill-quality NLP output.
    #[allow(clippy::too_many_arguments)]
    pub fn with_strategies(
        persistence: Arc<dyn PersistenceAdapter>,
        events: Arc<EventStream>,
        skills: Arc<SkillRegistry>,
        domains: Arc<DomainPluginRegistry>,
        blob_store: Arc<dyn BlobStore>,
        parser: Arc<dyn DocumentParser>,
        machine_config: MachineConfig,
        validator: Option<Arc<dyn ClauseValidator>>,
        diff_generator: Option<Arc<dyn DiffGenerator>>,
    ) -> Self {
        let mut machine = ReviewMachine::new(
            Arc::clone(&skills),
            Arc::clone(&domains),
            Arc::clone(&persistence),
            Arc::clone(&events),
            machine_config,
        );
        if let Some(validator) = validator {
            machine = machine.with_validator(validator);
        }
        if let Some(diff_generator) = diff_generator {
            machine = machine.with_diff_generator(diff_generator);
        }
        let machine = Arc::new(machine);
        let approvals = ApprovalCoordinator::new(Arc::clone(&persistence), Arc::clone(&events), Arc::clone(&machine));
        Self { persistence, events, skills, domains, machine, approvals, blob_store, parser }
    }

    pub fn register_skill(&self, registration: SkillRegistration, backend: SkillBackend) -> Result<()> {
        self.skills.register(registration, backend)
    }

    pub async fn create_task(&self, domain_id: Option<DomainId>, our_party: String, language: String) -> Result<TaskId> {
        let mut task = Task::new(our_party, language, domain_id);
        task.transition_to(TaskPhase::Uploading);
        self.persistence.save_task(&task).await?;
        Ok(task.id)
    }

    pub async fn upload_document(
        &self,
        task_id: TaskId,
        role: DocumentRole,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<DocumentId> {
        let task = self.persistence.load_task(task_id).await?;
        if task.phase != TaskPhase::Uploading {
            return Err(Error::InvalidPhase {
                task: task_id.to_string(),
                expected: TaskPhase::Uploading.to_string(),
                actual: task.phase.to_string(),
            });
        }

        let existing = self.persistence.list_documents(task_id).await?;
        if !crate::model::check_singleton_role_admits(&existing, role) {
            return Err(Error::InvalidRequest(format!("task already has a {role:?} document")));
        }

        let blob_handle = self.blob_store.put(bytes).await?;
        let mut document = TaskDocument::new(task_id, role, filename, blob_handle.clone());

        match self.parser.parse(&blob_handle).await {
            Ok(structure) => {
                self.persistence.save_document_structure(document.id, &structure).await?;
                document.structure = Some(structure);
            }
            Err(_) if role != DocumentRole::Primary => {
                // Non-primary documents (e.g. reference material) may
                // legitimately have no extractable structure.
            }
            Err(err) => return Err(err),
        }

        self.persistence.save_document(&document).await?;
        Ok(document.id)
    }

    pub async fn start_review(&self, task_id: TaskId) -> Result<ReviewOutcome> {
        self.machine.start_review(task_id).await
    }

    pub async fn get_status(&self, task_id: TaskId) -> Result<TaskStatus> {
        let task = self.persistence.load_task(task_id).await?;
        let snapshot = self.persistence.load_snapshot(task_id).await?;
        let pending_count = self.persistence.list_pending_diffs(task_id).await?.len();
        Ok(TaskStatus {
            phase: task.phase,
            current_clause: snapshot.and_then(|s| s.pending_clauses.first().cloned()),
            pending_count,
        })
    }

    pub async fn approve_diff(
        &self,
        task_id: TaskId,
        diff_id: DiffId,
        decision: Decision,
        feedback: Option<String>,
        user_modified_text: Option<String>,
    ) -> Result<()> {
        self.approvals
            .approve(task_id, DiffDecision { diff_id, decision, feedback, user_modified_text })
            .await
    }

    pub async fn approve_batch(&self, task_id: TaskId, decisions: Vec<DiffDecision>) -> Result<Vec<Result<()>>> {
        self.approvals.approve_batch(task_id, decisions).await
    }

    pub async fn resume(&self, task_id: TaskId) -> Result<ReviewOutcome> {
        self.approvals.resume(task_id).await
    }

    pub async fn cancel_task(&self, task_id: TaskId) -> Result<()> {
        let mut task = self.persistence.load_task(task_id).await?;
        task.fail(crate::model::FailureReason::Cancelled);
        self.persistence.save_task(&task).await?;
        self.events.emit(task_id, crate::events::EventKind::TaskFailed { reason: "cancelled".into() });
        Ok(())
    }

    pub fn list_domains(&self) -> Vec<DomainDescriptor> {
        self.domains
            .list_ids()
            .into_iter()
            .filter_map(|id| self.domains.get(&id).map(|p| DomainDescriptor { id: p.id, name: p.name }))
            .collect()
    }

    pub fn list_skills(&self, domain_filter: Option<&str>, backend_filter: Option<SkillBackendKind>) -> Vec<SkillRegistration> {
        self.skills.list(domain_filter, backend_filter)
    }
}
