use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use intake_core::health::healthz;
use intake_core::middleware::{propagate_request_id_layer, request_id_layer};
use intake_core::tracing::http_trace_layer;

use crate::handlers::{
    failed_notification::{
        delete_failed_notification, list_failed_notifications, resend_failed_notification,
    },
    health::readyz,
    lead::{create_lead, download_resume, get_lead, list_leads, set_lead_status},
};
use crate::state::AppState;

/// Room for the text fields and multipart framing around the resume.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let intake_body_limit = state.limits.max_resume_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Leads
        .route(
            "/leads",
            post(create_lead).layer(DefaultBodyLimit::max(intake_body_limit)),
        )
        .route("/leads", get(list_leads))
        .route("/leads/{public_id}", get(get_lead))
        .route("/leads/{public_id}/status", put(set_lead_status))
        .route("/leads/{public_id}/resume", get(download_resume))
        // Failed notifications
        .route("/failed-notifications", get(list_failed_notifications))
        .route(
            "/failed-notifications/{id}/resend",
            post(resend_failed_notification),
        )
        .route("/failed-notifications/{id}", delete(delete_failed_notification))
        .layer(propagate_request_id_layer())
        .layer(http_trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
