use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use intake_core::error::error_response;

use crate::domain::validation::ValidationError;

/// Leads service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum LeadsServiceError {
    #[error("rate limited")]
    RateLimited,
    #[error("{0}")]
    ValidationFailed(#[from] ValidationError),
    #[error("lead not found")]
    LeadNotFound,
    #[error("resume not found")]
    ResumeNotFound,
    #[error("failed notification not found")]
    FailedNotificationNotFound,
    #[error("invalid status transition")]
    InvalidStatusTransition,
    #[error("resend already in progress")]
    ResendInProgress,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl LeadsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited => "RATE_LIMITED",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::LeadNotFound => "LEAD_NOT_FOUND",
            Self::ResumeNotFound => "RESUME_NOT_FOUND",
            Self::FailedNotificationNotFound => "FAILED_NOTIFICATION_NOT_FOUND",
            Self::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
            Self::ResendInProgress => "RESEND_IN_PROGRESS",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::LeadNotFound | Self::ResumeNotFound | Self::FailedNotificationNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidStatusTransition | Self::ResendInProgress => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LeadsServiceError {
    fn into_response(self) -> Response {
        // Internal errors need the anyhow chain logged so the root cause is traceable;
        // the client only sees the generic message.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, "storage failure");
        }
        error_response(self.status(), self.kind(), self.to_string())
    }
}
