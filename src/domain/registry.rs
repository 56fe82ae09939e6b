//! Domain Plugin Registry (§4.B): register plugins, resolve a task's
//! effective checklist and skills, with a whole-document fallback when no
//! plugin matches. Grounded on the teacher's `DomainRoutingTable`
//! (`domain_router.rs`) generalized from keyword-scored classification to
//! direct lookup by `domain_id`, since task domain selection is explicit
//! (§6: `create_task` takes an optional `domain_id`), not inferred.

use std::sync::{Arc, RwLock};
use std::collections::HashMap;

use crate::model::{DomainId, ReviewChecklistItem, SkillId};
use crate::skills::SkillRegistry;

use super::plugin::DomainPlugin;

/// Checklist and baseline a review actually runs with: either a
/// registered domain's configuration, or the whole-document fallback.
/// The skill set a task runs with is resolved separately, through
/// [`DomainPluginRegistry::effective_skills`], since it's a registry
/// lookup rather than plugin-owned state.
pub struct EffectiveReviewConfig {
    pub checklist: Vec<ReviewChecklistItem>,
    pub baseline_blob_handle: Option<String>,
}

pub struct DomainPluginRegistry {
    plugins: RwLock<HashMap<DomainId, DomainPlugin>>,
    /// Checklist applied when a task has no `domain_id` or the id isn't
    /// registered (§4.B: "absence of a plugin is a valid mode, not an
    /// error").
    fallback_checklist: Vec<ReviewChecklistItem>,
    skills: Arc<SkillRegistry>,
}

impl DomainPluginRegistry {
    pub fn new(fallback_checklist: Vec<ReviewChecklistItem>, skills: Arc<SkillRegistry>) -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
            fallback_checklist,
            skills,
        }
    }

    /// Registers `plugin`, tagging each of its `skill_ids` into the
    /// dispatcher's [`SkillRegistry`] as belonging to this domain (§4.B:
    /// "associates the plugin's domain-specific skills into the
    /// dispatcher"). The skills themselves must already be registered, or
    /// be registered afterwards -- tagging doesn't require the id to
    /// exist yet, since plugin and skill registration order isn't fixed.
    pub fn register(&self, plugin: DomainPlugin) {
        for skill_id in &plugin.skill_ids {
            self.skills.tag_domain(skill_id, plugin.id.clone());
        }
        self.plugins.write().unwrap().insert(plugin.id.clone(), plugin);
    }

    pub fn get(&self, domain_id: &str) -> Option<DomainPlugin> {
        self.plugins.read().unwrap().get(domain_id).cloned()
    }

    pub fn list_ids(&self) -> Vec<DomainId> {
        self.plugins.read().unwrap().keys().cloned().collect()
    }

    /// Resolves the checklist/baseline a review should run with, falling
    /// back to the whole-document configuration when `domain_id` is
    /// absent or unregistered.
    pub fn effective_config(&self, domain_id: Option<&str>) -> EffectiveReviewConfig {
        let plugin = domain_id.and_then(|id| self.get(id));
        match plugin {
            Some(plugin) => EffectiveReviewConfig {
                checklist: plugin.checklist,
                baseline_blob_handle: plugin.baseline_blob_handle,
            },
            None => EffectiveReviewConfig {
                checklist: self.fallback_checklist.clone(),
                baseline_blob_handle: None,
            },
        }
    }

    /// Generic skills (registered but not tagged to any domain) union
    /// `domain_id`'s domain-specific skills (§4.B: `effective_skills`).
    pub fn effective_skills(&self, domain_id: Option<&str>) -> HashMap<SkillId, crate::skills::SkillRegistration> {
        self.skills.effective_for_domain(domain_id)
    }
}
