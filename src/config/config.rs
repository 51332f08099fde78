use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

use crate::auth::AuthSettings;
use chrono::Duration;

const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 60;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 1;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    pub page_size: usize,
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()), // Use a secure secret in production
            access_token_ttl_minutes: env_or("ACCESS_TOKEN_TTL_MINUTES", DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            refresh_token_ttl_days: env_or("REFRESH_TOKEN_TTL_DAYS", DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            bcrypt_cost: env_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
            rate_limit_max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 100),
            rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW_SECS", 60),
            page_size: env_or("PAGE_SIZE", 20),
        }
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            jwt_secret: self.jwt_secret.clone(),
            access_token_ttl: positive_or(
                Duration::try_minutes(self.access_token_ttl_minutes),
                Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            ),
            refresh_token_ttl: positive_or(
                Duration::try_days(self.refresh_token_ttl_days),
                Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            ),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

// Out-of-range or non-positive lifetimes fall back to the default.
fn positive_or(ttl: Option<Duration>, default: Duration) -> Duration {
    ttl.filter(|d| *d > Duration::zero()).unwrap_or(default)
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
