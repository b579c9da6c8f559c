use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::dispatch::dispatcher::DispatchQueue;
use crate::domain::validation::SubmissionLimits;
use crate::infra::blob::ObjectBlobStore;
use crate::infra::db::{DbFailedNotificationRepository, DbLeadRepository};
use crate::infra::mail::HttpMailTransport;
use crate::infra::rate_limit::FixedWindowRateLimiter;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blobs: ObjectBlobStore,
    pub mail: HttpMailTransport,
    /// One limiter per process, shared by every request.
    pub admission: Arc<FixedWindowRateLimiter>,
    pub queue: DispatchQueue<DbFailedNotificationRepository>,
    pub staff_recipients: Arc<[String]>,
    pub limits: SubmissionLimits,
}

impl AppState {
    pub fn lead_repo(&self) -> DbLeadRepository {
        DbLeadRepository {
            db: self.db.clone(),
        }
    }

    pub fn failed_notification_repo(&self) -> DbFailedNotificationRepository {
        DbFailedNotificationRepository {
            db: self.db.clone(),
        }
    }
}
