use std::time::Duration;

use tokio::sync::{mpsc, watch};

use intake_leads::dispatch::backoff::RetryPolicy;
use intake_leads::dispatch::dispatcher::{
    DispatchConfig, DispatchOutcome, DispatchPhase, DispatchQueue, NotificationDispatcher,
    SHUTDOWN_BEFORE_DELIVERY, SHUTDOWN_DURING_DELIVERY, spawn_dispatcher,
};
use intake_leads::dispatch::message::{APPLICANT_SUBJECT, STAFF_SUBJECT};
use intake_leads::domain::repository::NotificationQueue;

use crate::helpers::{
    MockFailedNotificationRepo, MockTransport, staff_recipients, test_contact, test_job,
};

fn build_dispatcher(
    transport: MockTransport,
    failures: MockFailedNotificationRepo,
) -> (
    NotificationDispatcher<MockTransport, MockFailedNotificationRepo>,
    watch::Sender<DispatchPhase>,
) {
    let (phase_tx, phase_rx) = watch::channel(DispatchPhase::Running);
    let dispatcher = NotificationDispatcher {
        transport,
        failures,
        retry: RetryPolicy::default(),
        phase: phase_rx,
    };
    (dispatcher, phase_tx)
}

async fn wait_for_records(failures: &MockFailedNotificationRepo, count: usize) {
    for _ in 0..100 {
        if failures.snapshot().len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {count} failure records");
}

// ── Automatic retries ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn should_deliver_after_transient_failures() {
    let transport = MockTransport::failing_staff(2);
    let failures = MockFailedNotificationRepo::default();
    let (dispatcher, _shutdown) = build_dispatcher(transport.clone(), failures.clone());

    let outcome = dispatcher
        .notify(&test_contact(), &staff_recipients())
        .await;

    assert_eq!(outcome, DispatchOutcome::Sent { attempts: 3 });
    assert_eq!(transport.staff_attempts(), 3);
    assert!(failures.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_record_exactly_once_when_retries_run_out() {
    let transport = MockTransport::always_failing_staff();
    let failures = MockFailedNotificationRepo::default();
    let (dispatcher, _shutdown) = build_dispatcher(transport.clone(), failures.clone());
    let job = test_job();
    let public_id = job.contact.public_id;

    dispatcher.deliver(job).await;

    assert_eq!(transport.staff_attempts(), 3);
    let rows = failures.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].contact.public_id, public_id);
    assert_eq!(rows[0].last_error, "relay unavailable (attempt 3)");
    assert_eq!(rows[0].recipients, staff_recipients());
}

#[tokio::test(start_paused = true)]
async fn should_confirm_to_applicant_before_notifying_staff() {
    let transport = MockTransport::healthy();
    let failures = MockFailedNotificationRepo::default();
    let (dispatcher, _shutdown) = build_dispatcher(transport.clone(), failures.clone());
    let job = test_job();
    let applicant = job.contact.email.clone();

    dispatcher.deliver(job).await;

    let delivered = transport.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].subject, APPLICANT_SUBJECT);
    assert_eq!(delivered[0].recipients, vec![applicant]);
    assert_eq!(delivered[1].subject, STAFF_SUBJECT);
    assert_eq!(delivered[1].recipients, staff_recipients());
    assert!(failures.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_notify_staff_when_applicant_confirmation_fails() {
    let transport = MockTransport {
        fail_applicant: true,
        ..MockTransport::healthy()
    };
    let failures = MockFailedNotificationRepo::default();
    let (dispatcher, _shutdown) = build_dispatcher(transport.clone(), failures.clone());

    dispatcher.deliver(test_job()).await;

    assert_eq!(transport.staff_attempts(), 1);
    assert!(failures.snapshot().is_empty());
}

// ── Shutdown ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn should_record_job_abandoned_during_backoff() {
    let transport = MockTransport::always_failing_staff();
    let failures = MockFailedNotificationRepo::default();
    let config = DispatchConfig {
        workers: 1,
        queue_capacity: 8,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
        },
    };
    let (queue, handle) = spawn_dispatcher(transport.clone(), failures.clone(), config);

    queue.enqueue(test_job());
    while transport.staff_attempts() == 0 {
        tokio::task::yield_now().await;
    }
    let drained = handle.shutdown(Duration::from_secs(5)).await;

    assert_eq!(drained, 0);
    assert_eq!(transport.staff_attempts(), 1);
    let rows = failures.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].last_error, "relay unavailable (attempt 1)");
}

#[tokio::test(start_paused = true)]
async fn should_record_jobs_still_queued_at_shutdown() {
    let transport = MockTransport::healthy();
    let failures = MockFailedNotificationRepo::default();
    let config = DispatchConfig {
        workers: 1,
        ..DispatchConfig::default()
    };
    let (queue, handle) = spawn_dispatcher(transport.clone(), failures.clone(), config);

    // Workers have not been polled yet on the current-thread runtime.
    queue.enqueue(test_job());
    queue.enqueue(test_job());
    let drained = handle.shutdown(Duration::from_secs(5)).await;

    assert_eq!(drained, 2);
    assert_eq!(transport.staff_attempts(), 0);
    let rows = failures.snapshot();
    assert_eq!(rows.len(), 2);
    assert!(
        rows.iter()
            .all(|r| r.last_error == SHUTDOWN_BEFORE_DELIVERY)
    );
}

#[tokio::test(start_paused = true)]
async fn should_record_in_flight_and_queued_jobs_when_send_hangs() {
    let transport = MockTransport {
        hang: true,
        ..MockTransport::healthy()
    };
    let failures = MockFailedNotificationRepo::default();
    let config = DispatchConfig {
        workers: 1,
        ..DispatchConfig::default()
    };
    let (queue, handle) = spawn_dispatcher(transport.clone(), failures.clone(), config);

    for _ in 0..3 {
        queue.enqueue(test_job());
    }
    while transport.calls() == 0 {
        tokio::task::yield_now().await;
    }
    let drained = handle.shutdown(Duration::from_millis(50)).await;

    assert_eq!(drained, 2);
    let rows = failures.snapshot();
    assert_eq!(rows.len(), 3);
    assert!(
        rows.iter()
            .all(|r| r.last_error == SHUTDOWN_BEFORE_DELIVERY)
    );
}

#[tokio::test(start_paused = true)]
async fn should_abandon_staff_send_halted_by_shutdown() {
    let transport = MockTransport {
        hang: true,
        ..MockTransport::healthy()
    };
    let (phase_tx, phase_rx) = watch::channel(DispatchPhase::Running);
    let dispatcher = NotificationDispatcher {
        transport: transport.clone(),
        failures: MockFailedNotificationRepo::default(),
        retry: RetryPolicy::default(),
        phase: phase_rx,
    };

    let contact = test_contact();
    let recipients = staff_recipients();
    let notify = dispatcher.notify(&contact, &recipients);
    tokio::pin!(notify);
    tokio::select! {
        _ = &mut notify => panic!("send should still be in flight"),
        () = tokio::time::sleep(Duration::from_millis(10)) => {}
    }
    phase_tx.send_replace(DispatchPhase::Halted);

    assert_eq!(
        notify.await,
        DispatchOutcome::Abandoned {
            last_error: SHUTDOWN_DURING_DELIVERY.to_owned(),
            attempts: 1,
        }
    );
    assert_eq!(transport.staff_attempts(), 1);
}

// ── Queue hand-off ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_record_job_when_queue_is_full() {
    let failures = MockFailedNotificationRepo::default();
    let (tx, _rx) = mpsc::channel(1);
    let queue = DispatchQueue {
        tx,
        failures: failures.clone(),
    };

    queue.enqueue(test_job());
    queue.enqueue(test_job());
    wait_for_records(&failures, 1).await;

    let rows = failures.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].last_error,
        "dispatch queue full; notification not attempted"
    );
}

#[tokio::test]
async fn should_record_job_when_dispatcher_is_gone() {
    let failures = MockFailedNotificationRepo::default();
    let (tx, rx) = mpsc::channel(8);
    drop(rx);
    let queue = DispatchQueue {
        tx,
        failures: failures.clone(),
    };

    queue.enqueue(test_job());
    wait_for_records(&failures, 1).await;

    assert_eq!(
        failures.snapshot()[0].last_error,
        "dispatcher stopped; notification not attempted"
    );
}
