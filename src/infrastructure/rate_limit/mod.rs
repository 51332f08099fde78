pub mod in_memory;
pub mod rate_limit_keys;

use crate::core::errors::SpendlyError;
use async_trait::async_trait;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request against `key`; fails with `RateLimited` once the budget is spent.
    async fn check(&self, key: &str) -> Result<(), SpendlyError>;
}
