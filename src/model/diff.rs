//! `DocumentDiff`: a proposed edit awaiting human approval (§3, §4.D).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checklist::Priority;
use super::ids::{ClauseId, DiffId, DocumentId, TaskId};
use super::structure::TextSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAction {
    Insert,
    Replace,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffLocation {
    pub document_id: DocumentId,
    pub clause_id: ClauseId,
    pub span: TextSpan,
    pub paragraph_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDiff {
    pub id: DiffId,
    pub task_id: TaskId,
    pub location: DiffLocation,
    pub action: DiffAction,
    pub original_text: Option<String>,
    pub proposed_text: Option<String>,
    pub risk_level: Priority,
    pub rationale: String,
    pub status: DiffStatus,
    /// Feedback attached when `status == Rejected` (§4.D).
    pub feedback: Option<String>,
    /// Overrides `proposed_text` when the reviewer edits the suggestion
    /// in place of a flat approve/reject; treated as the canonical
    /// proposed text once set (§9: resolved open question).
    pub user_modified_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl DocumentDiff {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_id: TaskId,
        location: DiffLocation,
        action: DiffAction,
        original_text: Option<String>,
        proposed_text: Option<String>,
        risk_level: Priority,
        rationale: String,
    ) -> Self {
        Self {
            id: DiffId::new(),
            task_id,
            location,
            action,
            original_text,
            proposed_text,
            risk_level,
            rationale,
            status: DiffStatus::Pending,
            feedback: None,
            user_modified_text: None,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    /// Text that will actually land in the document: the reviewer's edit
    /// if they supplied one, otherwise the proposed text.
    pub fn effective_text(&self) -> Option<&str> {
        self.user_modified_text
            .as_deref()
            .or(self.proposed_text.as_deref())
    }

    pub fn approve(&mut self, user_modified_text: Option<String>) {
        self.user_modified_text = user_modified_text;
        self.status = DiffStatus::Approved;
        self.decided_at = Some(Utc::now());
    }

    pub fn reject(&mut self, feedback: Option<String>) {
        self.feedback = feedback;
        self.status = DiffStatus::Rejected;
        self.decided_at = Some(Utc::now());
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self.status, DiffStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff() -> DocumentDiff {
        DocumentDiff::new(
            TaskId::new(),
            DiffLocation {
                document_id: DocumentId::new(),
                clause_id: "14.2".into(),
                span: TextSpan { start: 0, end: 10 },
                paragraph_id: None,
            },
            DiffAction::Replace,
            Some("shall be".into()),
            Some("shall not be".into()),
            Priority::High,
            "deviates from baseline".into(),
        )
    }

    #[test]
    fn effective_text_prefers_user_modification() {
        let mut d = diff();
        assert_eq!(d.effective_text(), Some("shall not be"));
        d.approve(Some("reviewer-edited text".into()));
        assert_eq!(d.effective_text(), Some("reviewer-edited text"));
    }

    #[test]
    fn reject_marks_decided_and_records_feedback() {
        let mut d = diff();
        assert!(!d.is_decided());
        d.reject(Some("prefer deletion over replacement".into()));
        assert!(d.is_decided());
        assert_eq!(d.status, DiffStatus::Rejected);
        assert_eq!(d.feedback.as_deref(), Some("prefer deletion over replacement"));
    }

    proptest::proptest! {
        /// §8 universal invariant: a diff starts `Pending`, and whichever
        /// of `approve`/`reject` runs first decides it -- for arbitrary
        /// reviewer-supplied text/feedback, never leaving it `Pending`.
        #[test]
        fn arbitrary_decision_always_leaves_the_diff_decided(
            approved in proptest::bool::ANY,
            text in ".{0,64}",
        ) {
            let mut d = diff();
            proptest::prop_assert_eq!(d.status, DiffStatus::Pending);
            proptest::prop_assert!(d.decided_at.is_none());

            if approved {
                d.approve(Some(text.clone()));
                proptest::prop_assert_eq!(d.status, DiffStatus::Approved);
                proptest::prop_assert_eq!(d.effective_text(), Some(text.as_str()));
            } else {
                d.reject(Some(text.clone()));
                proptest::prop_assert_eq!(d.status, DiffStatus::Rejected);
                proptest::prop_assert_eq!(d.feedback.as_deref(), Some(text.as_str()));
            }
            proptest::prop_assert!(d.is_decided());
            proptest::prop_assert!(d.decided_at.is_some());
        }
    }
}
