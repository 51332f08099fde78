use crate::core::errors::SpendlyError;
use crate::core::filters::ExpenseFilter;
use crate::core::models::{Expense, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Record store. Every expense operation takes the owner id and must never
/// see or touch records owned by anybody else.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fails with `EmailAlreadyRegistered` when the normalised email is taken.
    async fn create_user(&self, user: User) -> Result<User, SpendlyError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SpendlyError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SpendlyError>;

    async fn insert_expense(&self, expense: Expense) -> Result<(), SpendlyError>;
    async fn get_expense(&self, owner_id: &str, expense_id: &str) -> Result<Option<Expense>, SpendlyError>;
    /// Owner's expenses matching `filter`, sorted by its ordering.
    async fn find_expenses(&self, owner_id: &str, filter: &ExpenseFilter) -> Result<Vec<Expense>, SpendlyError>;
    /// Replaces a stored expense; `None` if no such expense exists for the owner.
    async fn update_expense(&self, owner_id: &str, expense: Expense) -> Result<Option<Expense>, SpendlyError>;
    async fn delete_expense(&self, owner_id: &str, expense_id: &str) -> Result<bool, SpendlyError>;

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), SpendlyError>;
    async fn is_token_revoked(&self, jti: &str) -> Result<bool, SpendlyError>;
}

pub mod in_memory;
