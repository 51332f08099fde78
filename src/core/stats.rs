use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::core::filters::{Period, PeriodBound};
use crate::core::models::{Category, Expense};

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema, PartialEq)]
pub struct CategoryBreakdown {
    pub total_expenses: usize,
    #[schema(value_type = String, example = "3000.75")]
    pub total_amount: Decimal,
    /// Sum per category; all seven categories are always present.
    #[schema(value_type = Object)]
    pub by_category: BTreeMap<Category, Decimal>,
}

impl CategoryBreakdown {
    pub fn of<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Self {
        let mut by_category: BTreeMap<Category, Decimal> = Category::ALL
            .into_iter()
            .map(|c| (c, Decimal::new(0, 2)))
            .collect();
        let mut total_expenses = 0;
        let mut total_amount = Decimal::new(0, 2);
        for expense in expenses {
            total_expenses += 1;
            total_amount += expense.amount;
            *by_category.entry(expense.category).or_insert(Decimal::ZERO) += expense.amount;
        }
        CategoryBreakdown {
            total_expenses,
            total_amount,
            by_category,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema, PartialEq)]
pub struct PeriodStats {
    pub period: Period,
    #[schema(value_type = String, example = "2024-05-02")]
    pub since: NaiveDate,
    #[serde(flatten)]
    pub breakdown: CategoryBreakdown,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema, PartialEq)]
pub struct ExpenseStats {
    #[serde(flatten)]
    pub breakdown: CategoryBreakdown,
    #[schema(value_type = String, example = "1500.38")]
    pub average_amount: Decimal,
    pub period: Option<PeriodStats>,
}

impl ExpenseStats {
    pub fn total_expenses(&self) -> usize {
        self.breakdown.total_expenses
    }

    pub fn total_amount(&self) -> Decimal {
        self.breakdown.total_amount
    }

    pub fn category_total(&self, category: Category) -> Decimal {
        self.breakdown.by_category.get(&category).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Summarises an owner-scoped record set. When `period` is given the
/// period section only counts records dated on or after its start.
pub fn aggregate(expenses: &[Expense], period: Option<PeriodBound>) -> ExpenseStats {
    let breakdown = CategoryBreakdown::of(expenses);
    let mut average_amount = if breakdown.total_expenses == 0 {
        Decimal::ZERO
    } else {
        (breakdown.total_amount / Decimal::from(breakdown.total_expenses))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };
    average_amount.rescale(2);
    let period = period.map(|bound| PeriodStats {
        period: bound.period,
        since: bound.since,
        breakdown: CategoryBreakdown::of(expenses.iter().filter(|e| e.date >= bound.since)),
    });
    ExpenseStats {
        breakdown,
        average_amount,
        period,
    }
}
