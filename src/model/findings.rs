//! `ClauseFindings`: the accumulated analysis attached to one clause during
//! `review_document` (§3).

use serde::{Deserialize, Serialize};

use super::checklist::Priority;
use super::ids::ClauseId;
use super::structure::TextSpan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    pub checklist_item_id: String,
    pub severity: Priority,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialTerm {
    pub label: String,
    pub amount: String,
    pub span: TextSpan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineDeviation {
    pub baseline_clause_id: ClauseId,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReferenceIssue {
    pub referenced_clause: ClauseId,
    pub problem: String,
}

/// A non-fatal skill failure recorded against a clause (§4.C: "skill
/// failure, degraded outcome" — the clause advances using whatever
/// skills did succeed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFailure {
    pub skill_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClauseFindings {
    pub clause_id: ClauseId,
    pub risks: Vec<Risk>,
    pub financial_terms: Vec<FinancialTerm>,
    pub baseline_deviations: Vec<BaselineDeviation>,
    pub cross_reference_issues: Vec<CrossReferenceIssue>,
    pub skill_failures: Vec<SkillFailure>,
    /// Free-form notes a skill attaches for a later skill in the same
    /// clause's pipeline to read back (§4.A: skills may share scratchpad state).
    pub scratchpad: Vec<String>,
}

impl ClauseFindings {
    pub fn new(clause_id: ClauseId) -> Self {
        Self {
            clause_id,
            ..Default::default()
        }
    }

    pub fn has_critical_risk(&self) -> bool {
        self.risks.iter().any(|r| r.severity == Priority::Critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_critical_risk_detects_only_critical_severity() {
        let mut findings = ClauseFindings::new("1".into());
        findings.risks.push(Risk {
            checklist_item_id: "chk-1".into(),
            severity: Priority::Medium,
            summary: "minor".into(),
        });
        assert!(!findings.has_critical_risk());

        findings.risks.push(Risk {
            checklist_item_id: "chk-2".into(),
            severity: Priority::Critical,
            summary: "uncapped liability".into(),
        });
        assert!(findings.has_critical_risk());
    }
}
