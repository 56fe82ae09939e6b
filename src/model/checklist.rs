//! `ReviewChecklistItem`: one entry of a domain's ordered review plan
//! (§3, §4.B). `clause_id: None` is the wildcard entry used for
//! non-structured fallback review.

use serde::{Deserialize, Serialize};

use super::ids::{ClauseId, SkillId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewChecklistItem {
    pub id: String,
    /// `None` means "applies to the whole document" (wildcard entry).
    pub clause_id: Option<ClauseId>,
    pub priority: Priority,
    /// Skills called in order for this checklist entry (§4.C `plan`).
    pub required_skill_ids: Vec<SkillId>,
    pub rationale: String,
}

impl ReviewChecklistItem {
    pub fn is_wildcard(&self) -> bool {
        self.clause_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_low_to_critical() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn item_without_clause_id_is_wildcard() {
        let item = ReviewChecklistItem {
            id: "fallback".into(),
            clause_id: None,
            priority: Priority::Medium,
            required_skill_ids: vec!["get_clause_context".into()],
            rationale: "whole-document fallback".into(),
        };
        assert!(item.is_wildcard());
    }
}
