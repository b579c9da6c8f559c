#![allow(async_fn_in_trait)]

use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use intake_domain::id::LeadPublicId;
use intake_domain::lead::LeadStatus;
use intake_domain::pagination::PageRequest;

use crate::domain::types::{
    Admission, FailedNotification, InsertLeadOutcome, Lead, LeadListFilter, MailMessage,
    NewFailedNotification, NewLead, NotificationJob, ResendClaim, StatusUpdate, TransportError,
};
use crate::error::LeadsServiceError;

/// Repository for lead records.
pub trait LeadRepository: Send + Sync {
    /// Check the public id is free and insert the row in one transaction.
    async fn insert(&self, lead: &NewLead) -> Result<InsertLeadOutcome, LeadsServiceError>;

    async fn find_by_public_id(
        &self,
        public_id: LeadPublicId,
    ) -> Result<Option<Lead>, LeadsServiceError>;

    async fn list(
        &self,
        filter: LeadListFilter,
        page: PageRequest,
    ) -> Result<Vec<Lead>, LeadsServiceError>;

    /// Write `status` and bump `updated_at`, but only while the stored status
    /// may still move to `status`. The check and the write are one statement.
    async fn update_status(
        &self,
        public_id: LeadPublicId,
        status: LeadStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusUpdate, LeadsServiceError>;
}

/// Repository for staff notifications that exhausted their retries.
///
/// Used from spawned dispatcher tasks, so every future must be `Send`.
pub trait FailedNotificationRepository: Send + Sync {
    fn record(
        &self,
        notification: &NewFailedNotification,
    ) -> impl Future<Output = Result<FailedNotification, LeadsServiceError>> + Send;

    fn list(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<FailedNotification>, LeadsServiceError>> + Send;

    /// Move the row `FAILED -> PENDING` (or reclaim a `PENDING` row whose lease expired).
    fn claim_for_resend(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<ResendClaim, LeadsServiceError>> + Send;

    /// Delete a claimed row after a successful resend. Returns `false` if the
    /// row was deleted or reclaimed in the meantime.
    fn complete_resend(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<bool, LeadsServiceError>> + Send;

    /// Put a claimed row back to `FAILED` with the latest error.
    fn release_failed(
        &self,
        id: i64,
        error: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<FailedNotification>, LeadsServiceError>> + Send;

    /// Returns `true` if a row was deleted.
    fn delete(&self, id: i64) -> impl Future<Output = Result<bool, LeadsServiceError>> + Send;
}

/// Opaque blob storage for resumes.
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), LeadsServiceError>;

    /// Returns `None` if no blob exists under `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, LeadsServiceError>;
}

/// Outgoing mail. Any error is treated as retryable by the dispatcher.
pub trait MailTransport: Send + Sync {
    fn send(
        &self,
        message: &MailMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Per-client request throttling in front of the public intake endpoint.
pub trait AdmissionControl: Send + Sync {
    async fn admit(&self, client_key: &str) -> Admission;
}

/// Hand-off point between lead creation and background notification.
pub trait NotificationQueue: Send + Sync {
    /// Never blocks. A job that cannot be queued must still end up somewhere durable.
    fn enqueue(&self, job: NotificationJob);
}
