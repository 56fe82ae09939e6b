//! Types shared by the skill registry and its two execution backends (§4.A).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::SkillId;

/// A skill's declared input/output contract. Validation here is
/// structural (JSON schema shape), not full JSON Schema compliance --
/// the registry checks the required top-level keys and their JSON types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSchema {
    pub required_fields: Vec<String>,
}

impl SkillSchema {
    pub fn empty() -> Self {
        Self { required_fields: Vec::new() }
    }

    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "expected a JSON object".to_string())?;
        for field in &self.required_fields {
            if !obj.contains_key(field) {
                return Err(format!("missing required field: {field}"));
            }
        }
        Ok(())
    }
}

/// Where a registered skill actually executes.
#[derive(Clone)]
pub enum SkillBackend {
    /// In-process handler, invoked directly.
    Local(std::sync::Arc<dyn LocalSkillHandler>),
    /// Out-of-process workflow service, invoked over HTTP.
    Remote(RemoteSkillTarget),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSkillTarget {
    pub base_url: String,
    pub route: String,
}

/// A local skill's executable body. One discriminator (`SkillBackend`),
/// one payload per variant -- no handler is ever both local and remote.
#[async_trait]
pub trait LocalSkillHandler: Send + Sync {
    async fn invoke(&self, input: Value) -> Result<Value>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRegistration {
    pub id: SkillId,
    /// Human-readable name, distinct from `id` (§3).
    pub name: String,
    pub description: String,
    pub input_schema: SkillSchema,
    pub output_schema: SkillSchema,
    pub backend: SkillBackendKind,
    /// Per-skill override of the registry's default timeout. `None` uses
    /// whatever [`SkillRegistry`](super::registry::SkillRegistry) was
    /// configured with (§6: `per_skill_timeout_local_s`/`_remote_s`).
    pub timeout: Option<SkillTimeout>,
}

/// Discriminator mirrored onto the registration for introspection
/// (`list(domain_filter, backend_filter)`, §4.A) -- the registry's
/// `Entry` still holds the real callable `SkillBackend`, which carries a
/// handler/target that isn't itself serializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillBackendKind {
    Local,
    Remote,
}

impl SkillBackend {
    pub fn kind(&self) -> SkillBackendKind {
        match self {
            SkillBackend::Local(_) => SkillBackendKind::Local,
            SkillBackend::Remote(_) => SkillBackendKind::Remote,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkillTimeout {
    pub local: Duration,
    pub remote: Duration,
}

impl Default for SkillTimeout {
    fn default() -> Self {
        Self {
            local: Duration::from_secs(60),
            remote: Duration::from_secs(300),
        }
    }
}

/// A single skill invocation's result, carrying timing for the event
/// stream's `skill_invoked` event (§4.E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub output: Value,
    pub elapsed: Duration,
}
