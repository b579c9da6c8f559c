//! Process-local fixed-window admission control.
//!
//! Counts reset on restart. Stale client entries are swept every
//! `CLEANUP_INTERVAL` admissions so spoofed keys cannot grow the map forever.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::repository::AdmissionControl;
use crate::domain::types::Admission;

const CLEANUP_INTERVAL: u64 = 256;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    /// The map lock is only taken to find or add a client; counting happens
    /// under that client's own lock.
    windows: RwLock<HashMap<String, Arc<Mutex<Window>>>>,
    admissions: AtomicU64,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: RwLock::new(HashMap::new()),
            admissions: AtomicU64::new(0),
        }
    }

    /// Count one request from `client_key` at `now`.
    ///
    /// Denies once the current window already holds `max_requests`; denied
    /// requests are not counted.
    pub fn admit_at(&self, client_key: &str, now: Instant) -> Admission {
        let seen = self.admissions.fetch_add(1, Ordering::Relaxed);
        if seen % CLEANUP_INTERVAL == CLEANUP_INTERVAL - 1 {
            self.cleanup(now);
        }

        let bucket = self.bucket(client_key, now);
        let mut window = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }
        if window.count >= self.max_requests {
            return Admission::Denied;
        }
        window.count += 1;
        Admission::Allowed
    }

    fn bucket(&self, client_key: &str, now: Instant) -> Arc<Mutex<Window>> {
        if let Some(bucket) = self
            .windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(client_key)
        {
            return bucket.clone();
        }
        self.windows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(client_key.to_owned())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Window {
                    started: now,
                    count: 0,
                }))
            })
            .clone()
    }

    /// Drop every client whose window has expired.
    pub fn cleanup(&self, now: Instant) {
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        windows.retain(|_, bucket| {
            let window = bucket.lock().unwrap_or_else(PoisonError::into_inner);
            now.saturating_duration_since(window.started) < self.window
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl AdmissionControl for FixedWindowRateLimiter {
    async fn admit(&self, client_key: &str) -> Admission {
        self.admit_at(client_key, Instant::now())
    }
}
