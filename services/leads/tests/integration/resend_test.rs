use std::sync::Arc;

use chrono::{Duration, Utc};

use intake_domain::lead::NotificationStatus;
use intake_domain::pagination::PageRequest;

use intake_leads::dispatch::message::STAFF_SUBJECT;
use intake_leads::domain::types::ResendOutcome;
use intake_leads::error::LeadsServiceError;
use intake_leads::usecase::failed_notification::{
    DeleteFailedNotificationUseCase, ListFailedNotificationsUseCase,
    ResendFailedNotificationUseCase,
};

use crate::helpers::{
    MockFailedNotificationRepo, MockTransport, staff_recipients, test_failed_notification,
};

fn failed_row(id: i64) -> MockFailedNotificationRepo {
    MockFailedNotificationRepo::new(vec![test_failed_notification(
        id,
        NotificationStatus::Failed,
        Utc::now() - Duration::minutes(1),
    )])
}

// ── ResendFailedNotificationUseCase ──────────────────────────────────────────

#[tokio::test]
async fn should_delete_record_after_successful_resend() {
    let failures = failed_row(7);
    let transport = MockTransport::healthy();
    let uc = ResendFailedNotificationUseCase {
        failures: failures.clone(),
        transport: transport.clone(),
    };

    let outcome = uc.execute(7).await.unwrap();

    assert_eq!(outcome, ResendOutcome::Sent);
    assert!(failures.snapshot().is_empty());
    let delivered = transport.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].subject, STAFF_SUBJECT);
    assert_eq!(delivered[0].recipients, staff_recipients());
}

#[tokio::test]
async fn should_keep_id_and_store_new_error_when_resend_fails() {
    let failures = failed_row(7);
    let before = failures.snapshot()[0].updated_at;
    let transport = MockTransport::always_failing_staff();
    let uc = ResendFailedNotificationUseCase {
        failures: failures.clone(),
        transport: transport.clone(),
    };

    let outcome = uc.execute(7).await.unwrap();

    let error = "relay unavailable (attempt 1)".to_owned();
    assert_eq!(outcome, ResendOutcome::StillFailing { error: error.clone() });
    assert_eq!(transport.staff_attempts(), 1);
    let rows = failures.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 7);
    assert_eq!(rows[0].status, NotificationStatus::Failed);
    assert_eq!(rows[0].last_error, error);
    assert!(rows[0].updated_at > before);
}

#[tokio::test]
async fn should_reject_resend_while_another_is_in_flight() {
    let failures = MockFailedNotificationRepo::new(vec![test_failed_notification(
        3,
        NotificationStatus::Pending,
        Utc::now(),
    )]);
    let transport = MockTransport::healthy();
    let uc = ResendFailedNotificationUseCase {
        failures: failures.clone(),
        transport: transport.clone(),
    };

    let result = uc.execute(3).await;

    assert!(
        matches!(result, Err(LeadsServiceError::ResendInProgress)),
        "expected ResendInProgress, got {result:?}"
    );
    assert!(transport.delivered().is_empty());
    assert_eq!(failures.snapshot().len(), 1);
}

#[tokio::test]
async fn should_reclaim_pending_record_after_lease_expires() {
    let failures = MockFailedNotificationRepo::new(vec![test_failed_notification(
        3,
        NotificationStatus::Pending,
        Utc::now() - Duration::minutes(10),
    )]);
    let uc = ResendFailedNotificationUseCase {
        failures: failures.clone(),
        transport: MockTransport::healthy(),
    };

    assert_eq!(uc.execute(3).await.unwrap(), ResendOutcome::Sent);
    assert!(failures.snapshot().is_empty());
}

#[tokio::test]
async fn should_report_not_found_when_deleted_during_failed_resend() {
    let failures = failed_row(5);
    let rows = Arc::clone(&failures.rows);
    let transport = MockTransport {
        on_staff_send: Some(Arc::new(move || rows.lock().unwrap().retain(|r| r.id != 5))),
        ..MockTransport::always_failing_staff()
    };
    let uc = ResendFailedNotificationUseCase {
        failures: failures.clone(),
        transport,
    };

    let result = uc.execute(5).await;

    assert!(
        matches!(result, Err(LeadsServiceError::FailedNotificationNotFound)),
        "expected FailedNotificationNotFound, got {result:?}"
    );
    assert!(failures.snapshot().is_empty());
}

#[tokio::test]
async fn should_return_not_found_for_unknown_record() {
    let uc = ResendFailedNotificationUseCase {
        failures: failed_row(1),
        transport: MockTransport::healthy(),
    };

    let result = uc.execute(99).await;
    assert!(
        matches!(result, Err(LeadsServiceError::FailedNotificationNotFound)),
        "expected FailedNotificationNotFound, got {result:?}"
    );
}

// ── DeleteFailedNotificationUseCase ──────────────────────────────────────────

#[tokio::test]
async fn should_delete_failed_notification() {
    let failures = failed_row(4);
    let uc = DeleteFailedNotificationUseCase {
        failures: failures.clone(),
    };

    uc.execute(4).await.unwrap();
    assert!(failures.snapshot().is_empty());

    let again = uc.execute(4).await;
    assert!(
        matches!(again, Err(LeadsServiceError::FailedNotificationNotFound)),
        "expected FailedNotificationNotFound, got {again:?}"
    );
}

// ── ListFailedNotificationsUseCase ───────────────────────────────────────────

#[tokio::test]
async fn should_list_newest_first_with_paging() {
    let now = Utc::now();
    let failures = MockFailedNotificationRepo::new(vec![
        test_failed_notification(1, NotificationStatus::Failed, now - Duration::minutes(3)),
        test_failed_notification(2, NotificationStatus::Failed, now - Duration::minutes(2)),
        test_failed_notification(3, NotificationStatus::Failed, now - Duration::minutes(1)),
    ]);
    let uc = ListFailedNotificationsUseCase { failures };

    let first = uc
        .execute(PageRequest {
            per_page: 2,
            page: 1,
        })
        .await
        .unwrap();
    let second = uc
        .execute(PageRequest {
            per_page: 2,
            page: 2,
        })
        .await
        .unwrap();

    assert_eq!(first.iter().map(|n| n.id).collect::<Vec<_>>(), vec![3, 2]);
    assert_eq!(second.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1]);
}
