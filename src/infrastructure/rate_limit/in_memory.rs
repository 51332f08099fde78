use crate::core::errors::SpendlyError;
use crate::infrastructure::rate_limit::RateLimiter;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const PURGE_THRESHOLD: usize = 10_000;

#[derive(Clone, Copy, Debug)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Fixed-window counter per key.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl Window {
    // A window too long to end within the calendar never resets.
    fn ends_at(&self, length: Duration) -> DateTime<Utc> {
        self.started_at
            .checked_add_signed(length)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: u32, window: std::time::Duration) -> Result<Self, SpendlyError> {
        let window = Duration::from_std(window)
            .map_err(|e| SpendlyError::InternalServerError(format!("Failed to convert rate limit window: {}", e)))?;
        Ok(InMemoryRateLimiter {
            max_requests,
            window,
            windows: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// A limiter that never throttles.
    pub fn unlimited() -> Self {
        InMemoryRateLimiter {
            max_requests: u32::MAX,
            window: Duration::seconds(1),
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn check_at(&self, key: &str, now: DateTime<Utc>) -> Result<(), SpendlyError> {
        let mut windows = self.windows.write().await;
        if windows.len() > PURGE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| w.ends_at(window) > now);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if entry.ends_at(self.window) <= now {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }
        if entry.count >= self.max_requests {
            let remaining = entry.ends_at(self.window).signed_duration_since(now).num_milliseconds().max(0);
            let retry_after_secs = (remaining as u64).div_ceil(1000).max(1);
            return Err(SpendlyError::RateLimited { retry_after_secs });
        }
        entry.count += 1;
        Ok(())
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<(), SpendlyError> {
        self.check_at(key, Utc::now()).await
    }
}
