//! Skill Registry & Dispatcher (§4.A): `register`, `call`, `list`. Backed
//! by a `dashmap` for lock-free concurrent reads after startup, mirroring
//! the teacher's `Arc<RwLock<HashMap<...>>>` registry shape (see
//! `agent_network.rs`) generalized to a finer-grained concurrent map.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::model::{DomainId, SkillId};

use super::remote::RemoteSkillClient;
use super::types::{SkillBackend, SkillBackendKind, SkillOutcome, SkillRegistration, SkillTimeout};

struct Entry {
    registration: SkillRegistration,
    backend: SkillBackend,
}

/// Central registry of callable skills, dispatching to whichever backend
/// (`Local` or `Remote`) the skill was registered against.
pub struct SkillRegistry {
    entries: DashMap<SkillId, Entry>,
    /// Domain a skill was tagged as belonging to by
    /// [`DomainPluginRegistry::register`](crate::domain::DomainPluginRegistry::register),
    /// if any. Untagged skills are generic -- available to every domain.
    domain_tags: DashMap<SkillId, DomainId>,
    remote_client: RemoteSkillClient,
    default_timeout: SkillTimeout,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::with_default_timeout(SkillTimeout::default())
    }

    /// As [`Self::new`], but with a default per-skill timeout other than
    /// `SkillTimeout::default()` -- used to plumb `per_skill_timeout_local_s`/
    /// `per_skill_timeout_remote_s` (§6) into the dispatcher.
    pub fn with_default_timeout(default_timeout: SkillTimeout) -> Self {
        Self {
            entries: DashMap::new(),
            domain_tags: DashMap::new(),
            remote_client: RemoteSkillClient::new(),
            default_timeout,
        }
    }

    /// As [`Self::with_default_timeout`], but also replaces the remote
    /// dispatcher's poll policy -- used to plumb `remote_skill_service`'s
    /// `poll_interval_s`/`max_poll_attempts` (§6) in from
    /// [`RemoteSkillClient::from_config`].
    pub fn with_remote_client(mut self, remote_client: RemoteSkillClient) -> Self {
        self.remote_client = remote_client;
        self
    }

    /// Registers a skill. Rejects a second registration of the same id
    /// within one process (§4.A), and rejects a registration whose
    /// declared `backend` kind doesn't match the backend actually supplied.
    pub fn register(&self, registration: SkillRegistration, backend: SkillBackend) -> Result<()> {
        if self.entries.contains_key(&registration.id) {
            return Err(Error::DuplicateSkill(registration.id.clone()));
        }
        if registration.backend != backend.kind() {
            return Err(Error::InvalidRequest(format!(
                "skill '{}' declared backend {:?} but was registered with a {:?} backend",
                registration.id,
                registration.backend,
                backend.kind()
            )));
        }
        self.entries.insert(registration.id.clone(), Entry { registration, backend });
        Ok(())
    }

    /// Tags `skill_id` as belonging to `domain_id`, so it's included in
    /// that domain's [`effective_for_domain`](Self::effective_for_domain)
    /// set and matched by `list(Some(domain_id), _)`. Called by
    /// [`DomainPluginRegistry::register`](crate::domain::DomainPluginRegistry::register)
    /// for each of a plugin's domain-specific skills.
    pub fn tag_domain(&self, skill_id: &str, domain_id: DomainId) {
        self.domain_tags.insert(skill_id.to_string(), domain_id);
    }

    /// Lists registrations, optionally narrowed to skills tagged for one
    /// domain and/or one backend kind (§4.A: `list(domain_filter,
    /// backend_filter)`).
    pub fn list(&self, domain_filter: Option<&str>, backend_filter: Option<SkillBackendKind>) -> Vec<SkillRegistration> {
        self.entries
            .iter()
            .filter(|e| match domain_filter {
                Some(domain_id) => self.domain_tags.get(e.key()).map(|tag| tag.as_str() == domain_id).unwrap_or(false),
                None => true,
            })
            .filter(|e| backend_filter.map_or(true, |kind| e.registration.backend == kind))
            .map(|e| e.registration.clone())
            .collect()
    }

    /// Generic skills (untagged) union the skills tagged for `domain_id`
    /// (§4.B: `effective_skills`). `None` returns only the generic set.
    pub fn effective_for_domain(&self, domain_id: Option<&str>) -> HashMap<SkillId, SkillRegistration> {
        self.entries
            .iter()
            .filter(|e| match (domain_id, self.domain_tags.get(e.key())) {
                (_, None) => true,
                (Some(wanted), Some(tag)) => tag.as_str() == wanted,
                (None, Some(_)) => false,
            })
            .map(|e| (e.key().clone(), e.registration.clone()))
            .collect()
    }

    pub fn is_registered(&self, skill_id: &str) -> bool {
        self.entries.contains_key(skill_id)
    }

    /// Validates input against the skill's input schema, dispatches to the
    /// appropriate backend, times the call, and validates the output.
    #[instrument(skip(self, input), fields(skill_id))]
    pub async fn call(&self, skill_id: &str, input: Value) -> Result<SkillOutcome> {
        let entry = self
            .entries
            .get(skill_id)
            .ok_or_else(|| Error::SkillNotRegistered(skill_id.to_string()))?;

        entry
            .registration
            .input_schema
            .validate(&input)
            .map_err(|reason| Error::InputInvalid {
                skill: skill_id.to_string(),
                reason,
            })?;

        let timeout = entry.registration.timeout.unwrap_or(self.default_timeout);
        let started = Instant::now();
        let output = match &entry.backend {
            SkillBackend::Local(handler) => {
                let handler = Arc::clone(handler);
                tokio::time::timeout(timeout.local, handler.invoke(input))
                    .await
                    .map_err(|_| Error::SkillTimeout(skill_id.to_string()))??
            }
            SkillBackend::Remote(target) => {
                self.remote_client.call(target, skill_id, input, timeout.remote).await?
            }
        };
        let elapsed = started.elapsed();

        entry
            .registration
            .output_schema
            .validate(&output)
            .map_err(|reason| Error::OutputInvalid {
                skill: skill_id.to_string(),
                reason,
            })?;

        Ok(SkillOutcome { output, elapsed })
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::local::FnSkillHandler;
    use crate::skills::types::SkillSchema;
    use serde_json::json;

    fn registration(id: &str) -> SkillRegistration {
        SkillRegistration {
            id: id.to_string(),
            name: id.to_string(),
            description: "test skill".into(),
            input_schema: SkillSchema { required_fields: vec!["clause_id".into()] },
            output_schema: SkillSchema::empty(),
            backend: SkillBackendKind::Local,
            timeout: None,
        }
    }

    fn echo_backend() -> SkillBackend {
        SkillBackend::Local(Arc::new(FnSkillHandler::new(|input: Value| async move {
            Ok(json!({ "received": input }))
        })))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = SkillRegistry::new();
        registry.register(registration("get_clause_context"), echo_backend()).unwrap();
        let err = registry
            .register(registration("get_clause_context"), echo_backend())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSkill(_)));
    }

    #[tokio::test]
    async fn call_validates_input_schema() {
        let registry = SkillRegistry::new();
        registry.register(registration("get_clause_context"), echo_backend()).unwrap();
        let err = registry.call("get_clause_context", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::InputInvalid { .. }));
    }

    #[tokio::test]
    async fn call_dispatches_to_local_handler() {
        let registry = SkillRegistry::new();
        registry.register(registration("get_clause_context"), echo_backend()).unwrap();
        let outcome = registry
            .call("get_clause_context", json!({"clause_id": "14.2"}))
            .await
            .unwrap();
        assert_eq!(outcome.output, json!({"received": {"clause_id": "14.2"}}));
    }

    #[tokio::test]
    async fn call_on_unknown_skill_fails() {
        let registry = SkillRegistry::new();
        let err = registry.call("nonexistent", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::SkillNotRegistered(_)));
    }

    #[test]
    fn register_rejects_backend_kind_mismatch() {
        let registry = SkillRegistry::new();
        let mut declared_remote = registration("workflow_skill");
        declared_remote.backend = SkillBackendKind::Remote;
        let err = registry.register(declared_remote, echo_backend()).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn list_filters_by_domain_and_backend() {
        let registry = SkillRegistry::new();
        registry.register(registration("generic_skill"), echo_backend()).unwrap();
        registry.register(registration("nda_skill"), echo_backend()).unwrap();
        registry.tag_domain("nda_skill", "nda".into());

        assert_eq!(registry.list(None, None).len(), 2);
        let nda_only = registry.list(Some("nda"), None);
        assert_eq!(nda_only.len(), 1);
        assert_eq!(nda_only[0].id, "nda_skill");
        assert!(registry.list(Some("msa"), None).is_empty());
        assert_eq!(registry.list(None, Some(SkillBackendKind::Local)).len(), 2);
    }

    #[test]
    fn effective_for_domain_unions_generic_and_tagged_skills() {
        let registry = SkillRegistry::new();
        registry.register(registration("generic_skill"), echo_backend()).unwrap();
        registry.register(registration("nda_skill"), echo_backend()).unwrap();
        registry.tag_domain("nda_skill", "nda".into());

        let for_nda = registry.effective_for_domain(Some("nda"));
        assert_eq!(for_nda.len(), 2);
        assert!(for_nda.contains_key("generic_skill"));
        assert!(for_nda.contains_key("nda_skill"));

        let generic_only = registry.effective_for_domain(None);
        assert_eq!(generic_only.len(), 1);
        assert!(generic_only.contains_key("generic_skill"));
    }

    #[tokio::test]
    async fn call_falls_back_to_registry_default_timeout() {
        let registry = SkillRegistry::with_default_timeout(SkillTimeout {
            local: Duration::from_millis(1),
            remote: Duration::from_secs(300),
        });
        let slow = SkillBackend::Local(Arc::new(FnSkillHandler::new(|_input: Value| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(json!({}))
        })));
        registry.register(registration("slow_skill"), slow).unwrap();
        let err = registry.call("slow_skill", json!({"clause_id": "1"})).await.unwrap_err();
        assert!(matches!(err, Error::SkillTimeout(_)));
    }
}
