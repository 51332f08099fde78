use crate::auth::AuthSettings;
use crate::auth::jwt::{Claims, JwtService, TokenType};
use crate::auth::password::{hash_password, verify_password};
use crate::constants::constants::{
    EXPENSE_CREATED, EXPENSE_DELETED, EXPENSE_UPDATED, TOKEN_REFRESHED, USER_LOGGED_IN, USER_LOGGED_OUT,
    USER_REGISTERED,
};
use crate::core::errors::SpendlyError;
use crate::core::filters::ExpenseFilter;
use crate::core::models::user::normalize_email;
use crate::core::models::{AppLog, Expense, ExpenseChanges, NewExpense, User};
use crate::core::stats::{ExpenseStats, aggregate};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::storage::Storage;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const MAX_NAME_LENGTH: usize = 150;
const MAX_TITLE_LENGTH: usize = 200;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_AMOUNT_DIGITS: u32 = 10;
const AMOUNT_DECIMAL_PLACES: u32 = 2;

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Sign-up data as submitted, before validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

/// Application service. Every expense operation takes the authenticated
/// caller explicitly and is restricted to that caller's records.
pub struct SpendlyService<L: LoggingService, S: Storage, R: RateLimiter> {
    storage: S,
    logging: L,
    rate_limiter: R,
    jwt_service: JwtService,
    bcrypt_cost: u32,
}

impl<L: LoggingService, S: Storage, R: RateLimiter> SpendlyService<L, S, R> {
    pub fn new(storage: S, logging: L, rate_limiter: R, auth: AuthSettings) -> Self {
        SpendlyService {
            storage,
            logging,
            rate_limiter,
            jwt_service: JwtService::new(auth.jwt_secret, auth.access_token_ttl, auth.refresh_token_ttl),
            bcrypt_cost: auth.bcrypt_cost,
        }
    }

    pub async fn check_rate_limit(&self, key: &str) -> Result<(), SpendlyError> {
        self.rate_limiter.check(key).await.inspect_err(|e| {
            if let SpendlyError::RateLimited { retry_after_secs } = e {
                warn!(key, retry_after_secs, "request throttled");
            }
        })
    }

    // ---- authentication -------------------------------------------------

    pub async fn register(&self, registration: Registration) -> Result<(User, TokenPair), SpendlyError> {
        let email = self.validate_email(&registration.email)?;
        self.validate_string_input("first_name", &registration.first_name, MAX_NAME_LENGTH)?;
        self.validate_string_input("last_name", &registration.last_name, MAX_NAME_LENGTH)?;
        self.validate_password(&registration.password)?;
        if registration.password != registration.password2 {
            return Err(SpendlyError::invalid_input(
                "password",
                "Password mismatch",
                "Passwords do not match",
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            password_hash: hash_password(&registration.password, self.bcrypt_cost)?,
            is_active: true,
            date_joined: now,
            updated_at: now,
        };
        let user = self.storage.create_user(user).await?;
        let tokens = self.issue_tokens(&user)?;

        info!(user_id = %user.id, "user registered");
        self.log_action(USER_REGISTERED, json!({ "user_id": user.id, "email": user.email }), Some(&user.id))
            .await;
        Ok((user, tokens))
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<(User, TokenPair), SpendlyError> {
        let Some(user) = self.storage.get_user_by_email(&normalize_email(email)).await? else {
            warn!("login attempt for unknown email");
            return Err(SpendlyError::InvalidCredentials);
        };
        if !user.is_active {
            return Err(SpendlyError::InactiveAccount);
        }
        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(SpendlyError::InvalidCredentials);
        }

        let tokens = self.issue_tokens(&user)?;
        info!(user_id = %user.id, "user logged in");
        self.log_action(USER_LOGGED_IN, json!({ "user_id": user.id }), Some(&user.id))
            .await;
        Ok((user, tokens))
    }

    /// Exchanges a live refresh token for a fresh access token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, SpendlyError> {
        let claims = self.jwt_service.validate_token(refresh_token, TokenType::Refresh)?;
        if self.storage.is_token_revoked(&claims.jti).await? {
            return Err(SpendlyError::Unauthenticated("Token has been revoked".to_string()));
        }
        let user = self.active_user(&claims.sub).await?;
        let (access, _) = self.jwt_service.generate_token(&user.id, TokenType::Access)?;

        self.log_action(TOKEN_REFRESHED, json!({ "user_id": user.id }), Some(&user.id))
            .await;
        Ok(access)
    }

    /// Revokes the caller's refresh token.
    pub async fn logout(&self, user: &User, refresh_token: &str) -> Result<(), SpendlyError> {
        if refresh_token.trim().is_empty() {
            return Err(SpendlyError::invalid_input(
                "refresh",
                "Missing refresh token",
                "The refresh token is required",
            ));
        }
        let invalid = || SpendlyError::invalid_input("refresh", "Invalid token", "Token is invalid or expired");
        let claims = self
            .jwt_service
            .validate_token(refresh_token, TokenType::Refresh)
            .map_err(|_| invalid())?;
        if claims.sub != user.id || self.storage.is_token_revoked(&claims.jti).await? {
            return Err(invalid());
        }

        self.storage.revoke_token(&claims.jti, expiry_of(&claims)).await?;
        info!(user_id = %user.id, "user logged out");
        self.log_action(USER_LOGGED_OUT, json!({ "user_id": user.id, "jti": claims.jti }), Some(&user.id))
            .await;
        Ok(())
    }

    /// Resolves a bearer access token to its active owner.
    pub async fn resolve_access_token(&self, token: &str) -> Result<User, SpendlyError> {
        let claims = self.jwt_service.validate_token(token, TokenType::Access)?;
        self.active_user(&claims.sub).await
    }

    // ---- expenses ---------------------------------------------------------

    pub async fn create_expense(&self, owner: &User, new_expense: NewExpense) -> Result<Expense, SpendlyError> {
        let valid = self.validate_expense(new_expense, today())?;
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.id.clone(),
            title: valid.title,
            description: valid.description,
            amount: valid.amount,
            category: valid.category,
            date: valid.date,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_expense(expense.clone()).await?;

        info!(user_id = %owner.id, expense_id = %expense.id, "expense created");
        self.log_action(
            EXPENSE_CREATED,
            json!({
                "expense_id": expense.id,
                "title": expense.title,
                "amount": expense.amount.to_string(),
                "category": expense.category.code(),
                "date": expense.date.to_string(),
            }),
            Some(&owner.id),
        )
        .await;
        Ok(expense)
    }

    pub async fn get_expense(&self, owner: &User, expense_id: &str) -> Result<Expense, SpendlyError> {
        self.storage
            .get_expense(&owner.id, expense_id)
            .await?
            .ok_or_else(|| SpendlyError::ExpenseNotFound(expense_id.to_string()))
    }

    pub async fn list_expenses(&self, owner: &User, filter: &ExpenseFilter) -> Result<Vec<Expense>, SpendlyError> {
        self.storage.find_expenses(&owner.id, filter).await
    }

    /// Applies `changes` and validates the merged record before storing it.
    pub async fn update_expense(
        &self,
        owner: &User,
        expense_id: &str,
        changes: ExpenseChanges,
    ) -> Result<Expense, SpendlyError> {
        let current = self.get_expense(owner, expense_id).await?;
        let changed_fields = changed_fields(&changes);
        let valid = self.validate_expense(changes.apply_to(&current), today())?;

        let updated = Expense {
            title: valid.title,
            description: valid.description,
            amount: valid.amount,
            category: valid.category,
            date: valid.date,
            updated_at: Utc::now(),
            ..current
        };
        let updated = self
            .storage
            .update_expense(&owner.id, updated)
            .await?
            .ok_or_else(|| SpendlyError::ExpenseNotFound(expense_id.to_string()))?;

        info!(user_id = %owner.id, expense_id, "expense updated");
        self.log_action(
            EXPENSE_UPDATED,
            json!({ "expense_id": expense_id, "fields": changed_fields }),
            Some(&owner.id),
        )
        .await;
        Ok(updated)
    }

    pub async fn delete_expense(&self, owner: &User, expense_id: &str) -> Result<(), SpendlyError> {
        if !self.storage.delete_expense(&owner.id, expense_id).await? {
            return Err(SpendlyError::ExpenseNotFound(expense_id.to_string()));
        }
        info!(user_id = %owner.id, expense_id, "expense deleted");
        self.log_action(EXPENSE_DELETED, json!({ "expense_id": expense_id }), Some(&owner.id))
            .await;
        Ok(())
    }

    /// Totals over exactly the expenses `list_expenses` returns for `filter`.
    pub async fn expense_stats(&self, owner: &User, filter: &ExpenseFilter) -> Result<ExpenseStats, SpendlyError> {
        let expenses = self.storage.find_expenses(&owner.id, filter).await?;
        Ok(aggregate(&expenses, filter.period))
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, SpendlyError> {
        self.logging.get_logs().await
    }

    /// Audit entries recorded for the caller.
    pub async fn user_activity(&self, user: &User) -> Result<Vec<AppLog>, SpendlyError> {
        self.logging.get_user_logs(&user.id).await
    }

    // ---- helpers ------------------------------------------------------------

    fn issue_tokens(&self, user: &User) -> Result<TokenPair, SpendlyError> {
        let (access, _) = self.jwt_service.generate_token(&user.id, TokenType::Access)?;
        let (refresh, _) = self.jwt_service.generate_token(&user.id, TokenType::Refresh)?;
        Ok(TokenPair { access, refresh })
    }

    async fn active_user(&self, user_id: &str) -> Result<User, SpendlyError> {
        match self.storage.get_user(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            Some(_) => Err(SpendlyError::Unauthenticated("Account is inactive".to_string())),
            None => Err(SpendlyError::Unauthenticated("User no longer exists".to_string())),
        }
    }

    /// Records an audit entry; failures are logged, never returned.
    async fn log_action(&self, action: &str, details: serde_json::Value, user_id: Option<&str>) {
        if let Err(e) = self.logging.log_action(action, details, user_id).await {
            error!(action, error = %e, "failed to record audit entry");
        }
    }

    fn validate_email(&self, email: &str) -> Result<String, SpendlyError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(SpendlyError::MissingEmail);
        }
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !well_formed {
            return Err(SpendlyError::InvalidEmail(email));
        }
        Ok(email)
    }

    fn validate_password(&self, password: &str) -> Result<(), SpendlyError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SpendlyError::invalid_input(
                "password",
                "Password Too Short",
                format!("Password must contain at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        if password.chars().all(|c| c.is_ascii_digit()) {
            return Err(SpendlyError::invalid_input(
                "password",
                "Password Entirely Numeric",
                "Password cannot be entirely numeric",
            ));
        }
        Ok(())
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), SpendlyError> {
        if value.trim().is_empty() {
            return Err(SpendlyError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.trim().chars().count() > max_length {
            return Err(SpendlyError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(SpendlyError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: Decimal) -> Result<Decimal, SpendlyError> {
        if amount <= Decimal::ZERO {
            return Err(SpendlyError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        let amount = amount.normalize();
        if amount.scale() > AMOUNT_DECIMAL_PLACES {
            return Err(SpendlyError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        let max = Decimal::from_i128_with_scale(10_i128.pow(MAX_AMOUNT_DIGITS) - 1, AMOUNT_DECIMAL_PLACES);
        if amount > max {
            return Err(SpendlyError::invalid_input(
                field,
                "Amount Too Large",
                format!("Amount cannot exceed {}", max),
            ));
        }
        let mut stored = amount;
        stored.rescale(AMOUNT_DECIMAL_PLACES);
        Ok(stored)
    }

    fn validate_expense(&self, expense: NewExpense, today: NaiveDate) -> Result<NewExpense, SpendlyError> {
        self.validate_string_input("title", &expense.title, MAX_TITLE_LENGTH)?;
        let amount = self.validate_amount_input("amount", expense.amount)?;
        if expense.date > today {
            return Err(SpendlyError::invalid_input(
                "date",
                "Invalid Date",
                "Expense date cannot be in the future",
            ));
        }
        let description = expense
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if amount > Decimal::from(1_000_000) && description.is_none() {
            return Err(SpendlyError::invalid_input(
                "description",
                "Description Required",
                "Expenses above 1,000,000 require a description",
            ));
        }
        Ok(NewExpense {
            title: expense.title.trim().to_string(),
            description,
            amount,
            category: expense.category,
            date: expense.date,
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn expiry_of(claims: &Claims) -> DateTime<Utc> {
    DateTime::from_timestamp(claims.exp as i64, 0).unwrap_or_else(Utc::now)
}

fn changed_fields(changes: &ExpenseChanges) -> Vec<&'static str> {
    [
        ("title", changes.title.is_some()),
        ("description", changes.description.is_some()),
        ("amount", changes.amount.is_some()),
        ("category", changes.category.is_some()),
        ("date", changes.date.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect()
}
