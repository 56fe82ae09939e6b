//! Execution plan and per-clause working context threaded through the
//! machine's node handlers (§4.C `plan`, `clause_context`).

use crate::model::{ClauseId, SkillId};

/// One entry of the `plan` node's output: a clause plus the skills its
/// checklist items require, in call order.
#[derive(Debug, Clone)]
pub struct PlannedClause {
    pub clause_id: ClauseId,
    pub skill_ids: Vec<SkillId>,
}

/// The ordered list produced by `plan`, consumed clause-by-clause by the
/// `clause_context` → `next_clause` loop.
pub type ExecutionPlan = Vec<PlannedClause>;

/// Merged text `clause_context` hands to `clause_analyze`: the clause's
/// own text plus whatever baseline/supplement text applies to it.
#[derive(Debug, Clone, Default)]
pub struct ClauseContext {
    pub clause_text: String,
    pub baseline_text: Option<String>,
    pub supplement_texts: Vec<String>,
}

impl ClauseContext {
    /// Text handed to skills as their primary analysis input.
    pub fn merged_text(&self) -> String {
        let mut out = self.clause_text.clone();
        if let Some(baseline) = &self.baseline_text {
            out.push_str("\n\n--- baseline ---\n");
            out.push_str(baseline);
        }
        for supplement in &self.supplement_texts {
            out.push_str("\n\n--- supplement ---\n");
            out.push_str(supplement);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_text_appends_baseline_and_supplements() {
        let ctx = ClauseContext {
            clause_text: "The parties agree...".into(),
            baseline_text: Some("standard form text".into()),
            supplement_texts: vec!["side letter clause".into()],
        };
        let merged = ctx.merged_text();
        assert!(merged.contains("The parties agree"));
        assert!(merged.contains("standard form text"));
        assert!(merged.contains("side letter clause"));
    }
}
