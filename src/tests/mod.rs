mod expense_tests;
mod filter_tests;

use crate::api::handlers::AppService;
use crate::auth::AuthSettings;
use crate::core::models::{Category, NewExpense, User};
use crate::core::services::{Registration, SpendlyService, TokenPair};
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::rate_limit::in_memory::InMemoryRateLimiter;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const TEST_PASSWORD: &str = "s3cure-pass";

pub fn test_auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: "test-secret".to_string(),
        access_token_ttl: Duration::minutes(60),
        refresh_token_ttl: Duration::days(1),
        bcrypt_cost: 4,
    }
}

pub fn create_service_with(rate_limiter: InMemoryRateLimiter, auth: AuthSettings) -> AppService {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    SpendlyService::new(storage, logging, rate_limiter, auth)
}

pub fn create_test_service() -> AppService {
    create_service_with(InMemoryRateLimiter::unlimited(), test_auth_settings())
}

pub fn registration(email: &str) -> Registration {
    Registration {
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        password2: TEST_PASSWORD.to_string(),
        first_name: "Ana".to_string(),
        last_name: "Torres".to_string(),
    }
}

pub async fn register_user(service: &AppService, email: &str) -> (User, TokenPair) {
    service.register(registration(email)).await.unwrap()
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

pub fn new_expense(title: &str, amount: &str, category: Category, on: NaiveDate) -> NewExpense {
    NewExpense {
        title: title.to_string(),
        description: None,
        amount: dec(amount),
        category,
        date: on,
    }
}
