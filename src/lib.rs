pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use api::handlers::{AppService, api_routes};
pub use crate::core::errors::SpendlyError;
pub use crate::core::services::SpendlyService;
pub use infrastructure::logging::in_memory::InMemoryLogging;
pub use infrastructure::rate_limit::in_memory::InMemoryRateLimiter;
pub use infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
