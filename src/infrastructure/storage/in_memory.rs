use crate::core::errors::SpendlyError;
use crate::core::filters::ExpenseFilter;
use crate::core::models::{Expense, User};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    user_ids_by_email: Arc<RwLock<HashMap<String, String>>>,
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
    revoked_tokens: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, SpendlyError> {
        let mut user_ids_by_email = self.user_ids_by_email.write().await;
        if user_ids_by_email.contains_key(&user.email) {
            return Err(SpendlyError::EmailAlreadyRegistered(user.email));
        }
        user_ids_by_email.insert(user.email.clone(), user.id.clone());
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SpendlyError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SpendlyError> {
        let user_ids_by_email = self.user_ids_by_email.read().await;
        let users = self.users.read().await;
        Ok(user_ids_by_email.get(email).and_then(|id| users.get(id).cloned()))
    }

    async fn insert_expense(&self, expense: Expense) -> Result<(), SpendlyError> {
        let mut expenses = self.expenses.write().await;
        if expenses.contains_key(&expense.id) {
            return Err(SpendlyError::StorageError(format!("duplicate expense id {}", expense.id)));
        }
        expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, owner_id: &str, expense_id: &str) -> Result<Option<Expense>, SpendlyError> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .get(expense_id)
            .filter(|e| e.owner_id == owner_id)
            .cloned())
    }

    async fn find_expenses(&self, owner_id: &str, filter: &ExpenseFilter) -> Result<Vec<Expense>, SpendlyError> {
        let expenses = self.expenses.read().await;
        let mut found: Vec<Expense> = expenses
            .values()
            .filter(|e| e.owner_id == owner_id && filter.matches(e))
            .cloned()
            .collect();
        filter.sort(&mut found);
        Ok(found)
    }

    async fn update_expense(&self, owner_id: &str, expense: Expense) -> Result<Option<Expense>, SpendlyError> {
        let mut expenses = self.expenses.write().await;
        match expenses.get_mut(&expense.id) {
            Some(stored) if stored.owner_id == owner_id && expense.owner_id == owner_id => {
                *stored = expense.clone();
                Ok(Some(expense))
            }
            _ => Ok(None),
        }
    }

    async fn delete_expense(&self, owner_id: &str, expense_id: &str) -> Result<bool, SpendlyError> {
        let mut expenses = self.expenses.write().await;
        let owned = expenses.get(expense_id).is_some_and(|e| e.owner_id == owner_id);
        if owned {
            expenses.remove(expense_id);
        }
        Ok(owned)
    }

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), SpendlyError> {
        let mut revoked_tokens = self.revoked_tokens.write().await;
        let now = Utc::now();
        revoked_tokens.retain(|_, expiry| *expiry > now);
        revoked_tokens.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, SpendlyError> {
        let revoked_tokens = self.revoked_tokens.read().await;
        Ok(revoked_tokens.contains_key(jti))
    }
}
