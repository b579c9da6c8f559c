use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::backoff::RetryPolicy;
use crate::dispatch::dispatcher::DispatchConfig;
use crate::domain::validation::SubmissionLimits;

/// Leads service configuration loaded from environment variables.
#[derive(Debug)]
pub struct LeadsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3114). Env var: `LEADS_PORT`.
    pub leads_port: u16,
    /// Staff notification recipients, order preserved, duplicates kept.
    /// Env var: `STAFF_NOTIFICATION_EMAILS` (comma-separated).
    pub staff_recipients: Vec<String>,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub mail_timeout: Duration,
    pub resume_bucket: String,
    pub aws_region: String,
    /// S3-compatible endpoint override (MinIO, localstack).
    pub s3_endpoint: Option<String>,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub limits: SubmissionLimits,
    pub dispatch: DispatchConfig,
    /// Upper bound on waiting for in-flight notifications at shutdown.
    pub shutdown_grace: Duration,
}

impl LeadsConfig {
    pub fn from_env() -> Self {
        let staff_recipients = parse_recipients(
            &std::env::var("STAFF_NOTIFICATION_EMAILS").expect("STAFF_NOTIFICATION_EMAILS"),
        );
        assert!(
            !staff_recipients.is_empty(),
            "STAFF_NOTIFICATION_EMAILS must list at least one address"
        );

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            leads_port: env_or("LEADS_PORT", 3114),
            staff_recipients,
            mail_api_url: std::env::var("MAIL_API_URL").expect("MAIL_API_URL"),
            mail_api_key: std::env::var("MAIL_API_KEY").expect("MAIL_API_KEY"),
            mail_from: std::env::var("MAIL_FROM").expect("MAIL_FROM"),
            mail_timeout: Duration::from_secs(env_or("MAIL_TIMEOUT_SECS", 10)),
            resume_bucket: std::env::var("RESUME_BUCKET").expect("RESUME_BUCKET"),
            aws_region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_owned()),
            s3_endpoint: std::env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            rate_limit_max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 5),
            rate_limit_window: Duration::from_secs(env_or("RATE_LIMIT_WINDOW_SECS", 60)),
            limits: SubmissionLimits {
                max_resume_bytes: env_or("MAX_RESUME_BYTES", 10 * 1024 * 1024),
            },
            dispatch: DispatchConfig {
                workers: env_or("DISPATCH_WORKERS", 4),
                queue_capacity: env_or("DISPATCH_QUEUE_CAPACITY", 1024),
                retry: RetryPolicy {
                    max_attempts: env_or("NOTIFY_MAX_ATTEMPTS", 3),
                    base_delay: Duration::from_millis(env_or("NOTIFY_BASE_DELAY_MS", 1000)),
                    max_delay: Duration::from_millis(env_or("NOTIFY_MAX_DELAY_MS", 30_000)),
                },
            },
            shutdown_grace: Duration::from_secs(env_or("SHUTDOWN_GRACE_SECS", 15)),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Split a comma-separated address list. Blank entries are skipped; duplicates are kept.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
