//! Scenario 6 (§8): `resume` refuses to advance a suspended task while
//! any of its pending diffs still lack a decision.

mod support;

use review_core::error::Error;
use review_core::model::{Decision, DocumentRole};
use support::{build_harness, SkillScript};

#[tokio::test]
async fn resume_before_all_decisions_are_made_is_rejected() {
    // Two risks in one pass produce two diffs pending in the same
    // suspension, matching the two-pending-diff setup of scenario 6.
    let harness = build_harness(vec![SkillScript::TwoRisks]);
    let core = &harness.core;

    let task_id = core.create_task(None, "Acme Corp".into(), "en".into()).await.unwrap();
    core.upload_document(task_id, DocumentRole::Primary, "contract.txt".into(), b"text".to_vec())
        .await
        .unwrap();
    let outcome = core.start_review(task_id).await.unwrap();
    let pending = match outcome {
        review_core::machine::ReviewOutcome::Suspended { pending_diff_ids } => pending_diff_ids,
        other => panic!("expected suspension, got {other:?}"),
    };
    assert_eq!(pending.len(), 2);

    core.approve_diff(task_id, pending[0], Decision::Approved, None, None).await.unwrap();

    let err = core.resume(task_id).await.unwrap_err();
    assert!(matches!(err, Error::ApprovalIncomplete { missing: 1, .. }));

    core.approve_diff(task_id, pending[1], Decision::Approved, None, None).await.unwrap();

    let outcome = core.resume(task_id).await.unwrap();
    assert!(matches!(outcome, review_core::machine::ReviewOutcome::Complete));
}

#[tokio::test]
async fn approve_batch_applies_each_decision_independently() {
    // Only one clause/diff exists in this fixture, but approve_batch
    // should still tolerate a second, invalid decision in the same call
    // without rolling back the first.
    let harness = build_harness(vec![SkillScript::Risk]);
    let core = &harness.core;

    let task_id = core.create_task(None, "Acme Corp".into(), "en".into()).await.unwrap();
    core.upload_document(task_id, DocumentRole::Primary, "contract.txt".into(), b"text".to_vec())
        .await
        .unwrap();
    let outcome = core.start_review(task_id).await.unwrap();
    let diff_id = match outcome {
        review_core::machine::ReviewOutcome::Suspended { pending_diff_ids } => pending_diff_ids[0],
        other => panic!("expected suspension, got {other:?}"),
    };

    let results = core
        .approve_batch(
            task_id,
            vec![
                review_core::approval::DiffDecision {
                    diff_id,
                    decision: Decision::Approved,
                    feedback: None,
                    user_modified_text: None,
                },
                review_core::approval::DiffDecision {
                    diff_id,
                    decision: Decision::Approved,
                    feedback: None,
                    user_modified_text: None,
                },
            ],
        )
        .await
        .unwrap();

    assert!(results[0].is_ok());
    assert!(results[1].is_err(), "re-approving an already-decided diff must fail");

    let outcome = core.resume(task_id).await.unwrap();
    assert!(matches!(outcome, review_core::machine::ReviewOutcome::Complete));
}
