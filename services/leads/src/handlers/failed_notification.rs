use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use intake_auth_types::identity::IdentityHeaders;
use intake_domain::id::LeadPublicId;
use intake_domain::lead::NotificationStatus;
use intake_domain::pagination::PageRequest;

use crate::domain::types::{FailedNotification, ResendOutcome};
use crate::error::LeadsServiceError;
use crate::state::AppState;
use crate::usecase::failed_notification::{
    DeleteFailedNotificationUseCase, ListFailedNotificationsUseCase,
    ResendFailedNotificationUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FailedNotificationResponse {
    pub id: i64,
    pub lead_public_id: LeadPublicId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub recipients: Vec<String>,
    pub last_error: String,
    pub status: NotificationStatus,
    #[serde(serialize_with = "intake_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "intake_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<FailedNotification> for FailedNotificationResponse {
    fn from(n: FailedNotification) -> Self {
        Self {
            id: n.id,
            lead_public_id: n.contact.public_id,
            first_name: n.contact.first_name,
            last_name: n.contact.last_name,
            email: n.contact.email,
            recipients: n.recipients,
            last_error: n.last_error,
            status: n.status,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResendResponse {
    Sent,
    StillFailing { error: String },
}

impl From<ResendOutcome> for ResendResponse {
    fn from(outcome: ResendOutcome) -> Self {
        match outcome {
            ResendOutcome::Sent => Self::Sent,
            ResendOutcome::StillFailing { error } => Self::StillFailing { error },
        }
    }
}

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct FailedNotificationListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

// ── GET /failed-notifications ────────────────────────────────────────────────

pub async fn list_failed_notifications(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Query(query): Query<FailedNotificationListQuery>,
) -> Result<Json<Vec<FailedNotificationResponse>>, LeadsServiceError> {
    if !identity.is_admin() {
        return Err(LeadsServiceError::Forbidden);
    }
    let uc = ListFailedNotificationsUseCase {
        failures: state.failed_notification_repo(),
    };
    let notifications = uc
        .execute(PageRequest::from_query(query.per_page, query.page))
        .await?;
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

// ── POST /failed-notifications/{id}/resend ───────────────────────────────────

pub async fn resend_failed_notification(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ResendResponse>, LeadsServiceError> {
    if !identity.is_admin() {
        return Err(LeadsServiceError::Forbidden);
    }
    let uc = ResendFailedNotificationUseCase {
        failures: state.failed_notification_repo(),
        transport: state.mail.clone(),
    };
    let outcome = uc.execute(id).await?;
    Ok(Json(outcome.into()))
}

// ── DELETE /failed-notifications/{id} ────────────────────────────────────────

pub async fn delete_failed_notification(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, LeadsServiceError> {
    if !identity.is_admin() {
        return Err(LeadsServiceError::Forbidden);
    }
    let uc = DeleteFailedNotificationUseCase {
        failures: state.failed_notification_repo(),
    };
    uc.execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
