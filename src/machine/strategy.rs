//! Pluggable policies the Review State Machine delegates to at
//! `validate_strategy` and `generate_diffs` (§4.C). The node graph and
//! its routing are fixed; what counts as "pass" and how findings become
//! diffs is domain-specific, so both are trait seams rather than baked
//! into the machine -- mirroring the teacher's `DomainAgent` trait
//! boundary (`domain_agent.rs`) between fixed orchestration and
//! pluggable per-domain behavior.

use crate::model::{ClauseFindings, DiffAction, DiffLocation, DocumentDiff, DocumentId, Priority, TaskId};

use super::node::ValidateOutcome;

/// Decides whether a clause's accumulated findings justify proposing
/// diffs, need another analysis pass, or should be skipped (§4.C).
pub trait ClauseValidator: Send + Sync {
    fn evaluate(&self, findings: &ClauseFindings, retry_count: u32, retry_limit: u32) -> ValidateOutcome;
}

/// Converts a clause's findings (plus any rejection feedback from a
/// prior round) into zero or more proposed diffs (§4.C `generate_diffs`).
pub trait DiffGenerator: Send + Sync {
    fn generate(
        &self,
        task_id: TaskId,
        document_id: DocumentId,
        findings: &ClauseFindings,
        rejection_feedback: Option<&str>,
    ) -> Vec<DocumentDiff>;
}

/// Default validator: passes once any risk, deviation, or cross-reference
/// issue has been found; otherwise retries up to the cap, then gives up
/// on the clause without proposing diffs.
pub struct DefaultClauseValidator;

impl ClauseValidator for DefaultClauseValidator {
    fn evaluate(&self, findings: &ClauseFindings, retry_count: u32, retry_limit: u32) -> ValidateOutcome {
        let has_signal = !findings.risks.is_empty()
            || !findings.baseline_deviations.is_empty()
            || !findings.cross_reference_issues.is_empty();
        if has_signal {
            ValidateOutcome::Pass
        } else if retry_count < retry_limit {
            ValidateOutcome::Retry
        } else {
            ValidateOutcome::SkipClause
        }
    }
}

/// Default generator: one `replace` diff per risk at `High` priority or
/// above, carrying the risk summary as rationale. A deployment wanting
/// richer drafting plugs in a [`DiffGenerator`] backed by a
/// [`crate::collaborators::LanguageModel`].
pub struct DefaultDiffGenerator;

impl DiffGenerator for DefaultDiffGenerator {
    fn generate(
        &self,
        task_id: TaskId,
        document_id: DocumentId,
        findings: &ClauseFindings,
        rejection_feedback: Option<&str>,
    ) -> Vec<DocumentDiff> {
        findings
            .risks
            .iter()
            .filter(|risk| risk.severity >= Priority::High)
            .map(|risk| {
                let mut rationale = format!("risk: {}", risk.summary);
                if let Some(feedback) = rejection_feedback {
                    rationale.push_str(&format!(" (revised per feedback: {feedback})"));
                }
                DocumentDiff::new(
                    task_id,
                    DiffLocation {
                        document_id,
                        clause_id: findings.clause_id.clone(),
                        span: crate::model::TextSpan { start: 0, end: 0 },
                        paragraph_id: None,
                    },
                    DiffAction::Replace,
                    None,
                    None,
                    risk.severity,
                    rationale,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Risk;

    #[test]
    fn default_validator_passes_when_risks_present() {
        let mut findings = ClauseFindings::new("4.1".into());
        findings.risks.push(Risk {
            checklist_item_id: "chk".into(),
            severity: Priority::High,
            summary: "overbroad obligation".into(),
        });
        let outcome = DefaultClauseValidator.evaluate(&findings, 0, 2);
        assert_eq!(outcome, ValidateOutcome::Pass);
    }

    #[test]
    fn default_validator_retries_then_skips() {
        let findings = ClauseFindings::new("4.1".into());
        assert_eq!(DefaultClauseValidator.evaluate(&findings, 0, 2), ValidateOutcome::Retry);
        assert_eq!(DefaultClauseValidator.evaluate(&findings, 1, 2), ValidateOutcome::Retry);
        assert_eq!(DefaultClauseValidator.evaluate(&findings, 2, 2), ValidateOutcome::SkipClause);
    }

    #[test]
    fn default_generator_only_proposes_high_severity_risks() {
        let mut findings = ClauseFindings::new("4.1".into());
        findings.risks.push(Risk {
            checklist_item_id: "chk".into(),
            severity: Priority::Low,
            summary: "cosmetic".into(),
        });
        let diffs = DefaultDiffGenerator.generate(TaskId::new(), DocumentId::new(), &findings, None);
        assert!(diffs.is_empty());
    }
}
