use std::net::SocketAddr;
use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use intake_core::tracing::init_tracing;
use intake_leads::config::LeadsConfig;
use intake_leads::dispatch::dispatcher::spawn_dispatcher;
use intake_leads::infra::blob::ObjectBlobStore;
use intake_leads::infra::db::DbFailedNotificationRepository;
use intake_leads::infra::mail::HttpMailTransport;
use intake_leads::infra::rate_limit::FixedWindowRateLimiter;
use intake_leads::router::build_router;
use intake_leads::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = LeadsConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let blobs = ObjectBlobStore::s3(
        &config.resume_bucket,
        &config.aws_region,
        config.s3_endpoint.as_deref(),
    )
    .expect("failed to configure resume storage");

    let mail = HttpMailTransport::new(
        &config.mail_api_url,
        &config.mail_api_key,
        &config.mail_from,
        config.mail_timeout,
    )
    .expect("failed to build mail transport");

    let (queue, dispatcher) = spawn_dispatcher(
        mail.clone(),
        DbFailedNotificationRepository { db: db.clone() },
        config.dispatch,
    );

    let state = AppState {
        db,
        blobs,
        mail,
        admission: Arc::new(FixedWindowRateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window,
        )),
        queue,
        staff_recipients: config.staff_recipients.into(),
        limits: config.limits,
    };

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.leads_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("leads service listening on {http_addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    dispatcher.shutdown(config.shutdown_grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
