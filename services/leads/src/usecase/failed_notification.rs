use chrono::Utc;
use tracing::{info, warn};

use intake_domain::pagination::PageRequest;

use crate::dispatch::dispatcher::send_staff_notification;
use crate::domain::repository::{FailedNotificationRepository, MailTransport};
use crate::domain::types::{FailedNotification, ResendClaim, ResendOutcome};
use crate::error::LeadsServiceError;

// ── ListFailedNotifications ──────────────────────────────────────────────────

pub struct ListFailedNotificationsUseCase<F: FailedNotificationRepository> {
    pub failures: F,
}

impl<F: FailedNotificationRepository> ListFailedNotificationsUseCase<F> {
    pub async fn execute(
        &self,
        page: PageRequest,
    ) -> Result<Vec<FailedNotification>, LeadsServiceError> {
        self.failures.list(page.clamped()).await
    }
}

// ── ResendFailedNotification ─────────────────────────────────────────────────

pub struct ResendFailedNotificationUseCase<F: FailedNotificationRepository, T: MailTransport> {
    pub failures: F,
    pub transport: T,
}

impl<F: FailedNotificationRepository, T: MailTransport> ResendFailedNotificationUseCase<F, T> {
    /// One delivery attempt with the recipients and lead details stored at failure time.
    ///
    /// The record is claimed first so two concurrent resends cannot both act on it.
    /// Success deletes the record; failure keeps its id and stores the new error.
    pub async fn execute(&self, id: i64) -> Result<ResendOutcome, LeadsServiceError> {
        let notification = match self.failures.claim_for_resend(id, Utc::now()).await? {
            ResendClaim::Claimed(notification) => notification,
            ResendClaim::InProgress => return Err(LeadsServiceError::ResendInProgress),
            ResendClaim::NotFound => return Err(LeadsServiceError::FailedNotificationNotFound),
        };

        match send_staff_notification(
            &self.transport,
            &notification.contact,
            &notification.recipients,
        )
        .await
        {
            Ok(()) => {
                if !self.failures.complete_resend(id).await? {
                    warn!(
                        failed_notification_id = id,
                        "failed notification changed while resending"
                    );
                }
                info!(
                    failed_notification_id = id,
                    lead_public_id = %notification.contact.public_id,
                    "failed notification resent"
                );
                Ok(ResendOutcome::Sent)
            }
            Err(e) => {
                // Deleted by an administrator while the send was in flight.
                if self
                    .failures
                    .release_failed(id, &e.0, Utc::now())
                    .await?
                    .is_none()
                {
                    warn!(
                        failed_notification_id = id,
                        error = %e,
                        "failed notification removed during resend"
                    );
                    return Err(LeadsServiceError::FailedNotificationNotFound);
                }
                warn!(
                    failed_notification_id = id,
                    error = %e,
                    "resend of failed notification failed"
                );
                Ok(ResendOutcome::StillFailing { error: e.0 })
            }
        }
    }
}

// ── DeleteFailedNotification ─────────────────────────────────────────────────

pub struct DeleteFailedNotificationUseCase<F: FailedNotificationRepository> {
    pub failures: F,
}

impl<F: FailedNotificationRepository> DeleteFailedNotificationUseCase<F> {
    /// Removes only the failure record; the originating lead is untouched.
    pub async fn execute(&self, id: i64) -> Result<(), LeadsServiceError> {
        if !self.failures.delete(id).await? {
            return Err(LeadsServiceError::FailedNotificationNotFound);
        }
        info!(failed_notification_id = id, "failed notification deleted");
        Ok(())
    }
}
