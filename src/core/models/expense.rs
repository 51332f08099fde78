use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Groceries,
    Leisure,
    Electronics,
    Utilities,
    Clothing,
    Health,
    Others,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Groceries,
        Category::Leisure,
        Category::Electronics,
        Category::Utilities,
        Category::Clothing,
        Category::Health,
        Category::Others,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Category::Groceries => "GROCERIES",
            Category::Leisure => "LEISURE",
            Category::Electronics => "ELECTRONICS",
            Category::Utilities => "UTILITIES",
            Category::Clothing => "CLOTHING",
            Category::Health => "HEALTH",
            Category::Others => "OTHERS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Groceries => "Groceries",
            Category::Leisure => "Leisure",
            Category::Electronics => "Electronics",
            Category::Utilities => "Utilities",
            Category::Clothing => "Clothing",
            Category::Health => "Health",
            Category::Others => "Others",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| format!("`{}` is not a valid category", s))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a create or full-update request.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
}

/// Fields of a partial update. `description: Some(None)` clears it.
#[derive(Clone, Debug, Default)]
pub struct ExpenseChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub amount: Option<Decimal>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
}

impl ExpenseChanges {
    pub(crate) fn apply_to(self, current: &Expense) -> NewExpense {
        NewExpense {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self.description.unwrap_or_else(|| current.description.clone()),
            amount: self.amount.unwrap_or(current.amount),
            category: self.category.unwrap_or(current.category),
            date: self.date.unwrap_or(current.date),
        }
    }
}

impl From<NewExpense> for ExpenseChanges {
    fn from(full: NewExpense) -> Self {
        ExpenseChanges {
            title: Some(full.title),
            description: Some(full.description),
            amount: Some(full.amount),
            category: Some(full.category),
            date: Some(full.date),
        }
    }
}
