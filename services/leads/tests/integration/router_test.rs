use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use object_store::memory::InMemory;
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use tower::ServiceExt;

use intake_core::middleware::X_REQUEST_ID;
use intake_domain::role::Role;
use intake_testing::auth::MockAuth;
use intake_testing::multipart::MultipartBody;

use intake_leads::dispatch::dispatcher::DispatchQueue;
use intake_leads::domain::validation::SubmissionLimits;
use intake_leads::handlers::client::X_FORWARDED_FOR;
use intake_leads::infra::blob::ObjectBlobStore;
use intake_leads::infra::db::DbFailedNotificationRepository;
use intake_leads::infra::mail::HttpMailTransport;
use intake_leads::infra::rate_limit::FixedWindowRateLimiter;
use intake_leads::router::build_router;
use intake_leads::state::AppState;

use crate::helpers::staff_recipients;

const MAX_RESUME_BYTES: usize = 64;

/// Router over a disconnected database. Only paths that stop before storage are exercised.
fn test_router(max_requests: u32) -> Router {
    let db = DatabaseConnection::default();
    let (tx, _rx) = mpsc::channel(8);
    let state = AppState {
        db: db.clone(),
        blobs: ObjectBlobStore {
            store: Arc::new(InMemory::new()),
        },
        mail: HttpMailTransport::new(
            "http://127.0.0.1:9/send",
            "test-key",
            "noreply@firm.test",
            Duration::from_secs(1),
        )
        .unwrap(),
        admission: Arc::new(FixedWindowRateLimiter::new(
            max_requests,
            Duration::from_secs(60),
        )),
        queue: DispatchQueue {
            tx,
            failures: DbFailedNotificationRepository { db },
        },
        staff_recipients: staff_recipients().into(),
        limits: SubmissionLimits {
            max_resume_bytes: MAX_RESUME_BYTES,
        },
    };
    build_router(state)
}

fn submission(client: &str, body: MultipartBody) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/leads")
        .header(header::CONTENT_TYPE, MultipartBody::content_type())
        .header(X_FORWARDED_FOR, client)
        .body(Body::from(body.finish()))
        .unwrap()
}

fn applicant_fields() -> MultipartBody {
    MultipartBody::new()
        .text("first_name", "Ada")
        .text("last_name", "Lovelace")
}

fn bad_email_submission(client: &str) -> Request<Body> {
    submission(
        client,
        applicant_fields()
            .text("email", "not-an-email")
            .file("resume", "cv.pdf", "application/pdf", b"%PDF-1.4"),
    )
}

fn get(uri: &str, auth: Option<MockAuth>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = auth.apply(builder);
    }
    builder.body(Body::empty()).unwrap()
}

async fn error_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_answer_health_with_request_id() {
    let response = test_router(5)
        .oneshot(get("/healthz", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(X_REQUEST_ID));
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let response = test_router(5)
        .oneshot(get("/readyz", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ── Identity ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_staff_route_without_identity() {
    let response = test_router(5)
        .oneshot(get("/leads", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_forbid_public_role_on_staff_route() {
    let response = test_router(5)
        .oneshot(get("/leads", Some(MockAuth::new(Role::Public))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_body(response).await["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn should_forbid_staff_on_admin_route() {
    let response = test_router(5)
        .oneshot(get("/failed-notifications", Some(MockAuth::staff())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_treat_malformed_public_id_as_not_found() {
    let response = test_router(5)
        .oneshot(get("/leads/not-a-uuid", Some(MockAuth::staff())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(response).await["kind"], "LEAD_NOT_FOUND");
}

#[tokio::test]
async fn should_reject_unknown_status_filter() {
    let response = test_router(5)
        .oneshot(get("/leads?status=ARCHIVED", Some(MockAuth::admin())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ── Submission validation ────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_malformed_email() {
    let response = test_router(5)
        .oneshot(bad_email_submission("203.0.113.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body["kind"], "VALIDATION_FAILED");
    assert_eq!(body["message"], "email address is not well-formed");
}

#[tokio::test]
async fn should_reject_disallowed_file_type() {
    let request = submission(
        "203.0.113.1",
        applicant_fields()
            .text("email", "ada@example.com")
            .file("resume", "cv.exe", "application/x-msdownload", b"MZ"),
    );
    let response = test_router(5).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await["kind"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn should_reject_oversized_resume() {
    let request = submission(
        "203.0.113.1",
        applicant_fields()
            .text("email", "ada@example.com")
            .file("resume", "cv.txt", "text/plain", &[b'a'; 100]),
    );
    let response = test_router(5).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(response).await["message"],
        "resume exceeds the 64 byte limit"
    );
}

#[tokio::test]
async fn should_require_resume() {
    let request = submission(
        "203.0.113.1",
        applicant_fields().text("email", "ada@example.com"),
    );
    let response = test_router(5).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await["message"], "resume is required");
}

// ── Admission control ────────────────────────────────────────────────────────

#[tokio::test]
async fn should_rate_limit_sixth_submission_from_same_client() {
    let app = test_router(5);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(bad_email_submission("198.51.100.9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let limited = app
        .clone()
        .oneshot(bad_email_submission("198.51.100.9"))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_body(limited).await["kind"], "RATE_LIMITED");

    let other_client = app
        .oneshot(bad_email_submission("198.51.100.10"))
        .await
        .unwrap();
    assert_eq!(other_client.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_rate_limit_client_rotating_forwarded_prefix() {
    let app = test_router(5);

    for i in 0..5 {
        let response = app
            .clone()
            .oneshot(bad_email_submission(&format!("10.9.9.{i}, 198.51.100.20")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let limited = app
        .oneshot(bad_email_submission("10.9.9.99, 198.51.100.20"))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
}
