use crate::core::errors::SpendlyError;
use crate::core::models::AppLog;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_RETENTION: usize = 10_000;

/// Bounded audit trail; once `retention` entries are held the oldest is dropped.
#[derive(Clone)]
pub struct InMemoryLogging {
    retention: usize,
    entries: Arc<RwLock<VecDeque<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        InMemoryLogging {
            retention: retention.max(1),
            entries: Arc::new(RwLock::new(VecDeque::new())),
        }
    }
}

impl Default for InMemoryLogging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SpendlyError> {
        if !details.is_object() {
            return Err(SpendlyError::LoggingError(format!(
                "details for {} must be a JSON object, got {}",
                action, details
            )));
        }
        let entry = AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details,
            timestamp: Utc::now(),
        };

        let mut entries = self.entries.write().await;
        while entries.len() >= self.retention {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, SpendlyError> {
        Ok(self.entries.read().await.iter().cloned().collect())
    }

    async fn get_user_logs(&self, user_id: &str) -> Result<Vec<AppLog>, SpendlyError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }
}
