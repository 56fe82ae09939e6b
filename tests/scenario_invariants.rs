//! Universal invariants (§8) exercised end-to-end rather than per-unit:
//! event sequencing, the diff status transition graph, and the
//! ordering/completeness laws over a full clause cycle.

mod support;

use review_core::events::EventKind;
use review_core::machine::ReviewOutcome;
use review_core::model::{Decision, DiffStatus, DocumentRole};
use support::{build_harness, SkillScript};

#[tokio::test]
async fn event_sequence_numbers_increase_strictly_and_cover_every_proposed_diff() {
    let harness = build_harness(vec![SkillScript::Risk]);
    let core = &harness.core;

    let task_id = core.create_task(None, "Acme Corp".into(), "en".into()).await.unwrap();
    core.upload_document(task_id, DocumentRole::Primary, "contract.txt".into(), b"text".to_vec())
        .await
        .unwrap();
    let outcome = core.start_review(task_id).await.unwrap();
    let diff_id = match outcome {
        ReviewOutcome::Suspended { pending_diff_ids } => pending_diff_ids[0],
        other => panic!("expected suspension, got {other:?}"),
    };
    core.approve_diff(task_id, diff_id, Decision::Approved, None, None).await.unwrap();
    core.resume(task_id).await.unwrap();

    let (backlog, _rx) = harness.events.subscribe(task_id, Some(0));
    let sequences: Vec<u64> = backlog.iter().map(|e| e.sequence).collect();
    let mut sorted = sequences.clone();
    sorted.sort_unstable();
    assert_eq!(sequences, sorted, "sequence numbers must already be strictly increasing in emission order");
    assert_eq!(sequences.len(), sequences.iter().collect::<std::collections::HashSet<_>>().len());

    let proposed_diff_ids: Vec<_> = backlog
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::DiffProposed { diff } => Some(diff.id),
            _ => None,
        })
        .collect();
    let required_diff_ids: Vec<_> = backlog
        .iter()
        .flat_map(|e| match &e.kind {
            EventKind::ApprovalRequired { pending_diff_ids } => pending_diff_ids.clone(),
            _ => Vec::new(),
        })
        .collect();
    for id in &required_diff_ids {
        assert!(proposed_diff_ids.contains(id), "every diff referenced by approval_required must have been proposed first");
    }
}

#[tokio::test]
async fn diff_status_only_ever_moves_pending_to_approved_or_rejected() {
    let harness = build_harness(vec![SkillScript::Risk]);
    let core = &harness.core;

    let task_id = core.create_task(None, "Acme Corp".into(), "en".into()).await.unwrap();
    core.upload_document(task_id, DocumentRole::Primary, "contract.txt".into(), b"text".to_vec())
        .await
        .unwrap();
    let outcome = core.start_review(task_id).await.unwrap();
    let diff_id = match outcome {
        ReviewOutcome::Suspended { pending_diff_ids } => pending_diff_ids[0],
        other => panic!("expected suspension, got {other:?}"),
    };

    let before = harness.persistence.load_diff(task_id, diff_id).await.unwrap();
    assert_eq!(before.status, DiffStatus::Pending);

    core.approve_diff(task_id, diff_id, Decision::Approved, None, None).await.unwrap();
    let after = harness.persistence.load_diff(task_id, diff_id).await.unwrap();
    assert_eq!(after.status, DiffStatus::Approved);

    // No edge back to pending, and re-deciding an already-decided diff is rejected.
    let err = core.approve_diff(task_id, diff_id, Decision::Rejected, None, None).await.unwrap_err();
    assert!(matches!(err, review_core::error::Error::DiffNotPending { .. }));
}

#[tokio::test]
async fn completeness_law_resume_succeeds_exactly_when_every_pending_diff_is_decided() {
    let harness = build_harness(vec![SkillScript::TwoRisks]);
    let core = &harness.core;

    let task_id = core.create_task(None, "Acme Corp".into(), "en".into()).await.unwrap();
    core.upload_document(task_id, DocumentRole::Primary, "contract.txt".into(), b"text".to_vec())
        .await
        .unwrap();
    let outcome = core.start_review(task_id).await.unwrap();
    let pending = match outcome {
        ReviewOutcome::Suspended { pending_diff_ids } => pending_diff_ids,
        other => panic!("expected suspension, got {other:?}"),
    };
    assert_eq!(pending.len(), 2);

    assert!(core.resume(task_id).await.is_err());

    core.approve_diff(task_id, pending[0], Decision::Approved, None, None).await.unwrap();
    assert!(core.resume(task_id).await.is_err(), "one diff still undecided");

    core.approve_diff(task_id, pending[1], Decision::Approved, None, None).await.unwrap();
    assert!(core.resume(task_id).await.is_ok(), "every diff now decided");
}
