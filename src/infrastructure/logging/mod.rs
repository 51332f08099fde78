pub mod in_memory;

use crate::core::errors::SpendlyError;
use crate::core::models::AppLog;
use async_trait::async_trait;

/// Audit trail of state-changing actions.
#[async_trait]
pub trait LoggingService: Send + Sync {
    /// Appends an entry; `details` must be a JSON object.
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SpendlyError>;
    /// Every retained entry, oldest first.
    async fn get_logs(&self) -> Result<Vec<AppLog>, SpendlyError>;
    /// Retained entries recorded for one user, oldest first.
    async fn get_user_logs(&self, user_id: &str) -> Result<Vec<AppLog>, SpendlyError>;
}
