//! Background delivery of staff notifications.
//!
//! Jobs flow through a bounded queue into a fixed pool of worker tasks. A job
//! whose attempts run out, or that is cut short by shutdown, is written to the
//! failure store. A job is never dropped silently.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatch::backoff::{RetryPolicy, with_jitter};
use crate::dispatch::message::{applicant_confirmation, staff_notification};
use crate::domain::repository::{FailedNotificationRepository, MailTransport, NotificationQueue};
use crate::domain::types::{LeadContact, NewFailedNotification, NotificationJob, TransportError};

/// Error stored for a job that was never attempted before shutdown.
pub const SHUTDOWN_BEFORE_DELIVERY: &str = "service shut down before delivery";
/// Error stored for a job whose send was still in flight when shutdown halted it.
pub const SHUTDOWN_DURING_DELIVERY: &str = "service shut down during delivery";

/// Lifecycle of the worker pool, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DispatchPhase {
    Running,
    /// Take no new jobs and abandon backoff waits. Sends in flight may finish.
    Draining,
    /// Give up on sends in flight.
    Halted,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of the automatic attempt sequence for one staff notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { attempts: u32 },
    Exhausted { last_error: String, attempts: u32 },
    /// Shutdown arrived while waiting to retry or while a send was in flight.
    Abandoned { last_error: String, attempts: u32 },
}

/// One delivery attempt of the staff notification. Also used by manual resend.
pub async fn send_staff_notification<T: MailTransport>(
    transport: &T,
    contact: &LeadContact,
    recipients: &[String],
) -> Result<(), TransportError> {
    transport
        .send(&staff_notification(contact, recipients))
        .await
}

/// Park a staff notification in the failure store.
///
/// A store error is logged; there is nowhere further to hand the job.
pub async fn record_failure<F: FailedNotificationRepository>(
    failures: &F,
    job: &NotificationJob,
    last_error: String,
) {
    let notification = NewFailedNotification {
        contact: job.contact.clone(),
        recipients: job.recipients.clone(),
        last_error,
        created_at: Utc::now(),
    };
    match failures.record(&notification).await {
        Ok(stored) => info!(
            lead_public_id = %job.contact.public_id,
            failed_notification_id = stored.id,
            "staff notification parked in failure store"
        ),
        Err(e) => error!(
            lead_public_id = %job.contact.public_id,
            error = ?e,
            "failed to record undelivered staff notification"
        ),
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

pub struct NotificationDispatcher<T, F> {
    pub transport: T,
    pub failures: F,
    pub retry: RetryPolicy,
    pub phase: watch::Receiver<DispatchPhase>,
}

impl<T: MailTransport, F: FailedNotificationRepository> NotificationDispatcher<T, F> {
    /// Try the staff notification until it is delivered or the retry budget runs out.
    pub async fn notify(&self, contact: &LeadContact, recipients: &[String]) -> DispatchOutcome {
        let mut phase = self.phase.clone();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let sent = self
                .until_halted(send_staff_notification(&self.transport, contact, recipients))
                .await;
            let last_error = match sent {
                Some(Ok(())) => {
                    debug!(
                        lead_public_id = %contact.public_id,
                        attempt = attempts,
                        "staff notified"
                    );
                    return DispatchOutcome::Sent { attempts };
                }
                Some(Err(e)) => e.0,
                None => {
                    return DispatchOutcome::Abandoned {
                        last_error: SHUTDOWN_DURING_DELIVERY.to_owned(),
                        attempts,
                    };
                }
            };
            warn!(
                lead_public_id = %contact.public_id,
                attempt = attempts,
                error = %last_error,
                "staff notification attempt failed"
            );

            if !self.retry.has_attempts_left(attempts) {
                return DispatchOutcome::Exhausted {
                    last_error,
                    attempts,
                };
            }

            let delay = with_jitter(self.retry.delay_for_attempt(attempts));
            tokio::select! {
                biased;
                () = phase_reached(&mut phase, DispatchPhase::Draining) => {
                    return DispatchOutcome::Abandoned { last_error, attempts };
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Full handling of one job: applicant confirmation, then the tracked staff notification.
    pub async fn deliver(&self, job: NotificationJob) {
        // Applicant confirmations are best-effort and never tracked.
        let confirmation = applicant_confirmation(&job.contact);
        match self.until_halted(self.transport.send(&confirmation)).await {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!(
                lead_public_id = %job.contact.public_id,
                error = %e,
                "applicant confirmation not delivered"
            ),
            None => {
                warn!(
                    lead_public_id = %job.contact.public_id,
                    "shutdown halted delivery before staff were notified"
                );
                record_failure(&self.failures, &job, SHUTDOWN_BEFORE_DELIVERY.to_owned()).await;
                return;
            }
        }

        match self.notify(&job.contact, &job.recipients).await {
            DispatchOutcome::Sent { .. } => {}
            DispatchOutcome::Exhausted {
                last_error,
                attempts,
            } => {
                error!(
                    lead_public_id = %job.contact.public_id,
                    attempt = attempts,
                    error = %last_error,
                    "staff notification retries exhausted"
                );
                record_failure(&self.failures, &job, last_error).await;
            }
            DispatchOutcome::Abandoned {
                last_error,
                attempts,
            } => {
                warn!(
                    lead_public_id = %job.contact.public_id,
                    attempt = attempts,
                    "staff notification abandoned by shutdown"
                );
                record_failure(&self.failures, &job, last_error).await;
            }
        }
    }

    /// Run `send` unless the pool is halted first. `None` means halted.
    async fn until_halted<Fut: Future>(&self, send: Fut) -> Option<Fut::Output> {
        let mut phase = self.phase.clone();
        tokio::select! {
            biased;
            () = phase_reached(&mut phase, DispatchPhase::Halted) => None,
            out = send => Some(out),
        }
    }

    async fn run_worker(
        self: Arc<Self>,
        worker: usize,
        jobs: Arc<Mutex<mpsc::Receiver<NotificationJob>>>,
    ) {
        let mut phase = self.phase.clone();
        loop {
            let job = {
                let mut rx = jobs.lock().await;
                tokio::select! {
                    biased;
                    () = phase_reached(&mut phase, DispatchPhase::Draining) => None,
                    job = rx.recv() => job,
                }
            };
            let Some(job) = job else {
                break;
            };
            self.deliver(job).await;
        }
        debug!(worker, "dispatch worker stopped");
    }
}

/// Resolves once the pool reaches `phase`. Never resolves if the sender is gone.
async fn phase_reached(rx: &mut watch::Receiver<DispatchPhase>, phase: DispatchPhase) {
    while *rx.borrow_and_update() < phase {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ── Queue ────────────────────────────────────────────────────────────────────

/// Producer side of the job queue. Cheap to clone into request state.
#[derive(Clone)]
pub struct DispatchQueue<F> {
    pub tx: mpsc::Sender<NotificationJob>,
    pub failures: F,
}

impl<F> NotificationQueue for DispatchQueue<F>
where
    F: FailedNotificationRepository + Clone + 'static,
{
    fn enqueue(&self, job: NotificationJob) {
        let (job, reason) = match self.tx.try_send(job) {
            Ok(()) => return,
            Err(TrySendError::Full(job)) => (job, "dispatch queue full; notification not attempted"),
            Err(TrySendError::Closed(job)) => {
                (job, "dispatcher stopped; notification not attempted")
            }
        };
        warn!(lead_public_id = %job.contact.public_id, reason, "notification job not queued");
        let failures = self.failures.clone();
        tokio::spawn(async move {
            record_failure(&failures, &job, reason.to_owned()).await;
        });
    }
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

pub struct DispatcherHandle<F> {
    phase: watch::Sender<DispatchPhase>,
    workers: Vec<JoinHandle<()>>,
    jobs: Arc<Mutex<mpsc::Receiver<NotificationJob>>>,
    failures: F,
}

/// Start the worker pool. Returns the producer queue and the handle used to stop it.
pub fn spawn_dispatcher<T, F>(
    transport: T,
    failures: F,
    config: DispatchConfig,
) -> (DispatchQueue<F>, DispatcherHandle<F>)
where
    T: MailTransport + 'static,
    F: FailedNotificationRepository + Clone + 'static,
{
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let (phase_tx, phase_rx) = watch::channel(DispatchPhase::Running);
    let jobs = Arc::new(Mutex::new(rx));

    let dispatcher = Arc::new(NotificationDispatcher {
        transport,
        failures: failures.clone(),
        retry: config.retry,
        phase: phase_rx,
    });
    let workers = (0..config.workers.max(1))
        .map(|worker| tokio::spawn(dispatcher.clone().run_worker(worker, jobs.clone())))
        .collect();

    let queue = DispatchQueue {
        tx,
        failures: failures.clone(),
    };
    let handle = DispatcherHandle {
        phase: phase_tx,
        workers,
        jobs,
        failures,
    };
    (queue, handle)
}

impl<F: FailedNotificationRepository> DispatcherHandle<F> {
    /// Stop the pool and park every job that was not delivered.
    ///
    /// Workers first get `grace` to finish the send in hand; workers waiting to
    /// retry record their job right away. Sends still in flight after that are
    /// halted and their jobs recorded, with another `grace` for those writes.
    /// Jobs still queued are recorded last. Returns the number of queued jobs recorded.
    pub async fn shutdown(self, grace: Duration) -> usize {
        let Self {
            phase,
            mut workers,
            jobs,
            failures,
        } = self;

        phase.send_replace(DispatchPhase::Draining);
        if tokio::time::timeout(grace, join_all(workers.iter_mut()))
            .await
            .is_err()
        {
            warn!(?grace, "notification sends still in flight; halting");
            workers.retain(|worker| !worker.is_finished());
            phase.send_replace(DispatchPhase::Halted);
            if tokio::time::timeout(grace, join_all(workers.iter_mut()))
                .await
                .is_err()
            {
                error!(?grace, "dispatch workers did not stop; aborting");
                for worker in &workers {
                    worker.abort();
                }
            }
        }

        let mut rx = jobs.lock().await;
        rx.close();
        let mut drained = 0;
        while let Ok(job) = rx.try_recv() {
            record_failure(&failures, &job, SHUTDOWN_BEFORE_DELIVERY.to_owned()).await;
            drained += 1;
        }
        info!(drained, "notification dispatcher stopped");
        drained
    }
}
