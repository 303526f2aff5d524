// nursery-client/tests/bulk_transition.rs
// Bulk status change scenarios against an in-memory backend

mod common;

use async_trait::async_trait;
use common::{FakeRemote, ZONE, config, orchestrator, tag_row};
use nursery_client::{
    ConfirmationPrompt, Confirmer, PolicyViolation, ReportKind, TagEvent, TagStatus,
    TagStatusOrchestrator, TransitionError, TransitionMode,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

async fn loaded(remote: &Arc<FakeRemote>) -> TagStatusOrchestrator {
    let orch = orchestrator(remote.clone());
    orch.load_zone(ZONE).await.unwrap();
    orch
}

#[tokio::test]
async fn test_three_in_zone_tags_to_dig_ordered_with_one_failure() {
    let remote = Arc::new(FakeRemote::with_rows(vec![
        tag_row("t1", "OAK-001", "in_zone"),
        tag_row("t2", "OAK-002", "in_zone"),
        tag_row("t3", "OAK-003", "in_zone"),
    ]));
    remote.fail_tag("t3", "network timeout");
    let orch = loaded(&remote).await;
    let mut events = orch.subscribe();
    orch.select_all().await;
    let queries_before = remote.query_count();

    let report = orch
        .request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None)
        .await
        .unwrap();

    assert_eq!(remote.calls().len(), 3);
    assert_eq!(report.kind, ReportKind::PartialSuccess);
    assert_eq!(report.message, "2 succeeded, 1 failed");
    assert_eq!(report.sampled_errors, vec!["OAK-003: network timeout".to_string()]);
    assert!(orch.selection().await.is_empty());
    // exactly one reload
    assert_eq!(remote.query_count(), queries_before + 1);

    let TagEvent::TagsChanged { zone_id, mut tag_ids } = events.try_recv().unwrap();
    tag_ids.sort();
    assert_eq!(zone_id, ZONE);
    assert_eq!(tag_ids, vec!["t1".to_string(), "t2".to_string()]);

    // reloaded store reflects the backend
    let tags = orch.tags().await;
    let status = |id: &str| tags.iter().find(|t| t.id == id).unwrap().status;
    assert_eq!(status("t1"), TagStatus::DigOrdered);
    assert_eq!(status("t3"), TagStatus::InZone);
}

#[tokio::test]
async fn test_normal_call_arguments() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "dug")]));
    let orch = loaded(&remote).await;
    orch.toggle("t1").await;

    orch.request_transition(TagStatus::ReadyForSale, TransitionMode::Normal, Some("graded A"))
        .await
        .unwrap();

    let calls = remote.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].procedure, config().status_procedure);
    assert_eq!(calls[0].args["p_tag_id"], "t1");
    assert_eq!(calls[0].args["p_target_status"], "ready_for_sale");
    assert_eq!(calls[0].args["p_note"], "graded A");
    assert_eq!(calls[0].args["p_source_tag"], "bulk_status_update");
    assert!(calls[0].args["p_changed_by"].is_null());
}

#[tokio::test]
async fn test_mixed_statuses_rejected_without_calls() {
    let remote = Arc::new(FakeRemote::with_rows(vec![
        tag_row("t1", "OAK-001", "in_zone"),
        tag_row("t2", "OAK-002", "dug"),
    ]));
    let orch = loaded(&remote).await;
    orch.select_all().await;
    let queries_before = remote.query_count();

    let err = orch
        .request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None)
        .await
        .unwrap_err();

    match err {
        TransitionError::Policy(PolicyViolation::PriorStatusMismatch { offenders, .. }) => {
            assert_eq!(offenders.len(), 1);
            assert_eq!(offenders[0].tag_code, "OAK-002");
            assert_eq!(offenders[0].status, TagStatus::Dug);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(remote.calls().is_empty());
    assert_eq!(remote.query_count(), queries_before);
    // the user can fix the selection instead of starting over
    assert_eq!(orch.selection().await.len(), 2);
}

#[tokio::test]
async fn test_legacy_available_status_counts_as_in_zone() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "available")]));
    let orch = loaded(&remote).await;
    orch.toggle("t1").await;

    let report = orch
        .request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None)
        .await
        .unwrap();

    assert_eq!(report.kind, ReportKind::FullSuccess);
    assert_eq!(remote.status_of("t1").as_deref(), Some("dig_ordered"));
}

#[tokio::test]
async fn test_correction_mode_requires_note() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "planted")]));
    let orch = loaded(&remote).await;
    orch.toggle("t1").await;

    let err = orch
        .request_transition(TagStatus::InZone, TransitionMode::Correction, Some(""))
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::Policy(PolicyViolation::NoteRequired)));
    assert!(remote.calls().is_empty());

    let report = orch
        .request_transition(
            TagStatus::InZone,
            TransitionMode::Correction,
            Some("admin correction per audit #4"),
        )
        .await
        .unwrap();

    let calls = remote.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].procedure, config().correction_procedure);
    assert_eq!(calls[0].args["p_note"], "admin correction per audit #4");
    assert_eq!(calls[0].args["p_source_tag"], "admin_correction");
    assert_eq!(report.kind, ReportKind::FullSuccess);
    assert_eq!(report.mode, TransitionMode::Correction);
}

#[tokio::test]
async fn test_total_failure_leaves_selection_and_store_untouched() {
    let remote = Arc::new(FakeRemote::with_rows(vec![
        tag_row("t1", "OAK-001", "dig_ordered"),
        tag_row("t2", "OAK-002", "dig_ordered"),
    ]));
    remote.fail_tag("t1", "permission denied");
    remote.fail_tag("t2", "permission denied");
    let orch = loaded(&remote).await;
    let mut events = orch.subscribe();
    orch.select_all().await;
    let queries_before = remote.query_count();

    let report = orch
        .request_transition(TagStatus::Dug, TransitionMode::Normal, None)
        .await
        .unwrap();

    assert_eq!(report.kind, ReportKind::TotalFailure);
    assert_eq!(report.failure_count(), 2);
    assert_eq!(report.sampled_errors.len(), 2);
    assert_eq!(orch.selection().await.len(), 2);
    assert_eq!(remote.query_count(), queries_before);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_stale_selection_is_rejected_and_cleared() {
    let remote = Arc::new(FakeRemote::with_rows(vec![
        tag_row("A", "OAK-A", "in_zone"),
        tag_row("B", "OAK-B", "in_zone"),
        tag_row("C", "OAK-C", "in_zone"),
        tag_row("D", "OAK-D", "in_zone"),
    ]));
    let orch = loaded(&remote).await;
    orch.toggle("B").await;
    orch.toggle("D").await;

    // D disappears from the visible set
    remote.remove_row("D");
    orch.reload().await.unwrap();

    let err = orch
        .request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionError::StaleSelection { stale_count: 1 }));
    assert!(orch.selection().await.is_empty());
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_empty_selection_is_rejected() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "in_zone")]));
    let orch = loaded(&remote).await;

    let err = orch
        .request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionError::EmptySelection));
}

#[tokio::test]
async fn test_selecting_a_tag_twice_keeps_it_selected() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "in_zone")]));
    let orch = loaded(&remote).await;

    assert!(orch.select("t1").await);
    assert!(!orch.select("t1").await);

    let report = orch
        .request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None)
        .await
        .unwrap();
    assert_eq!(report.succeeded, vec!["t1".to_string()]);
}

#[tokio::test]
async fn test_second_request_while_running_is_busy() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "in_zone")]).gated());
    let orch = loaded(&remote).await;
    orch.toggle("t1").await;

    let first = orch.request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None);
    let second = async {
        let gate = remote.gate.as_ref().unwrap();
        gate.started.notified().await;

        assert!(orch.is_busy());
        let err = orch
            .request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::Busy));

        gate.release.notify_one();
    };

    let (first, ()) = tokio::join!(first, second);

    assert_eq!(first.unwrap().kind, ReportKind::FullSuccess);
    assert_eq!(remote.calls().len(), 1);
    assert!(!orch.is_busy());
}

#[tokio::test]
async fn test_all_calls_are_in_flight_together() {
    // each call blocks until all three have started
    let remote = Arc::new(
        FakeRemote::with_rows(vec![
            tag_row("t1", "OAK-001", "in_zone"),
            tag_row("t2", "OAK-002", "in_zone"),
            tag_row("t3", "OAK-003", "in_zone"),
        ])
        .with_barrier(3),
    );
    let orch = loaded(&remote).await;
    orch.select_all().await;

    let report = tokio::time::timeout(
        Duration::from_secs(2),
        orch.request_transition(TagStatus::DigOrdered, TransitionMode::Normal, None),
    )
    .await
    .expect("calls were issued one at a time")
    .unwrap();

    assert_eq!(report.kind, ReportKind::FullSuccess);
    assert_eq!(remote.calls().len(), 3);
}

struct CountingDecline(AtomicUsize);

#[async_trait]
impl Confirmer for CountingDecline {
    async fn confirm(&self, prompt: &ConfirmationPrompt) -> bool {
        assert_eq!(prompt.count, 2);
        assert_eq!(prompt.target, TagStatus::Dug);
        self.0.fetch_add(1, Ordering::SeqCst);
        false
    }
}

#[tokio::test]
async fn test_declined_confirmation_issues_no_calls() {
    let remote = Arc::new(FakeRemote::with_rows(vec![
        tag_row("t1", "OAK-001", "dig_ordered"),
        tag_row("t2", "OAK-002", "dig_ordered"),
    ]));
    let confirmer = Arc::new(CountingDecline(AtomicUsize::new(0)));
    let orch = TagStatusOrchestrator::new(remote.clone(), &config(), confirmer.clone());
    orch.load_zone(ZONE).await.unwrap();
    orch.select_all().await;

    let err = orch
        .request_transition(TagStatus::Dug, TransitionMode::Normal, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TransitionError::Cancelled));
    assert_eq!(confirmer.0.load(Ordering::SeqCst), 1);
    assert!(remote.calls().is_empty());
    assert!(!orch.is_busy());

    // correction mode never prompts
    orch.request_transition(TagStatus::Dug, TransitionMode::Correction, Some("recount"))
        .await
        .unwrap();
    assert_eq!(confirmer.0.load(Ordering::SeqCst), 1);
    assert_eq!(remote.calls().len(), 2);
}

#[tokio::test]
async fn test_ready_for_sale_report_carries_stock_notice() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "dug")]));
    let orch = loaded(&remote).await;
    orch.select_all().await;

    let report = orch
        .request_transition(TagStatus::ReadyForSale, TransitionMode::Normal, None)
        .await
        .unwrap();

    let notice = report.notice.expect("ready-for-sale notice");
    assert_eq!(notice.dismiss_after, config().notice_dismiss_after);
}

#[tokio::test]
async fn test_reload_failure_after_success_is_reported_not_raised() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "in_zone")]));
    let orch = loaded(&remote).await;
    orch.toggle("t1").await;
    remote.fail_queries(true);

    let report = orch
        .request_transition(TagStatus::Reserved, TransitionMode::Normal, None)
        .await
        .unwrap();

    assert_eq!(report.kind, ReportKind::FullSuccess);
    assert!(report.reload_error.unwrap().contains("connection refused"));
    assert!(orch.selection().await.is_empty());
}

#[tokio::test]
async fn test_zone_change_clears_selection() {
    let remote = Arc::new(FakeRemote::with_rows(vec![tag_row("t1", "OAK-001", "in_zone")]));
    let orch = loaded(&remote).await;
    orch.toggle("t1").await;

    orch.load_zone(ZONE).await.unwrap();
    assert_eq!(orch.selection().await.len(), 1);

    orch.load_zone("zone-2").await.unwrap();
    assert!(orch.selection().await.is_empty());
    assert!(orch.tags().await.is_empty());
}
