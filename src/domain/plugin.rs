//! `DomainPlugin`: a per-contract-type bundle of checklist items, the
//! skills that evaluate them, and a baseline document to diff against
//! (§4.B).

use crate::model::{DomainId, ReviewChecklistItem};

/// A registered domain's review configuration. One plugin per `domain_id`
/// (e.g. `"nda"`, `"msa"`); a task with no matching plugin falls back to a
/// whole-document generic review (§4.B).
#[derive(Debug, Clone)]
pub struct DomainPlugin {
    pub id: DomainId,
    pub name: String,
    pub checklist: Vec<ReviewChecklistItem>,
    /// Skill ids this domain additionally relies on, beyond the core set
    /// every review uses. Must already be (or be about to be) registered
    /// in the [`SkillRegistry`](crate::skills::SkillRegistry) this plugin
    /// is registered against -- `DomainPluginRegistry::register` tags
    /// each of these ids with this plugin's `id` in that registry.
    pub skill_ids: Vec<String>,
    /// Blob handle of the baseline/standard-form document used for
    /// deviation detection, if the domain has one.
    pub baseline_blob_handle: Option<String>,
}

impl DomainPlugin {
    pub fn new(id: DomainId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            checklist: Vec::new(),
            skill_ids: Vec::new(),
            baseline_blob_handle: None,
        }
    }
}
