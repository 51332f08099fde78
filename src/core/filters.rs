//! Translation of expense query-string parameters into a validated filter.
//!
//! Raw parameters arrive as optional strings so that every malformed value is
//! reported as [`SpendlyError::InvalidParameter`] before any lookup runs.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::SpendlyError;
use crate::core::models::{Category, Expense};

/// Query parameters accepted by the list and stats endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    /// Category code, e.g. `GROCERIES`
    pub category: Option<String>,
    /// Relative range: `week`, `month` or `3months`
    pub period: Option<String>,
    /// Inclusive lower date bound (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Inclusive upper date bound (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Inclusive lower amount bound
    pub min_amount: Option<String>,
    /// Inclusive upper amount bound
    pub max_amount: Option<String>,
    /// Case-insensitive text matched against title and description
    pub search: Option<String>,
    /// Comma-separated list of `amount`, `date`, `created_at`, optionally prefixed with `-`
    pub ordering: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
    /// Results per page
    pub page_size: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum Period {
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl Period {
    pub fn days(&self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::ThreeMonths => 90,
        }
    }

    /// First day included in the period when counted back from `today`.
    pub fn since(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.days())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "3months" => Ok(Period::ThreeMonths),
            other => Err(format!("`{}` is not one of week, month, 3months", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodBound {
    pub period: Period,
    pub since: NaiveDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderField {
    Amount,
    Date,
    CreatedAt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderTerm {
    fn compare(&self, a: &Expense, b: &Expense) -> Ordering {
        let ord = match self.field {
            OrderField::Amount => a.amount.cmp(&b.amount),
            OrderField::Date => a.date.cmp(&b.date),
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        if self.descending { ord.reverse() } else { ord }
    }
}

impl FromStr for OrderTerm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "amount" => OrderField::Amount,
            "date" => OrderField::Date,
            "created_at" => OrderField::CreatedAt,
            other => return Err(format!("cannot order by `{}`", other)),
        };
        Ok(OrderTerm { field, descending })
    }
}

const DEFAULT_ORDERING: [OrderTerm; 2] = [
    OrderTerm {
        field: OrderField::Date,
        descending: true,
    },
    OrderTerm {
        field: OrderField::CreatedAt,
        descending: true,
    },
];

/// Validated, owner-agnostic predicate over expense records.
///
/// Every populated field narrows the result; an empty filter matches all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseFilter {
    pub category: Option<Category>,
    pub period: Option<PeriodBound>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    /// Lower-cased search needle
    pub search: Option<String>,
    pub ordering: Vec<OrderTerm>,
}

impl ExpenseFilter {
    /// Validates raw parameters. `today` anchors the relative `period` bound.
    pub fn from_query(query: &ExpenseQuery, today: NaiveDate) -> Result<Self, SpendlyError> {
        let category = present(&query.category)
            .map(|v| Category::from_str(v).map_err(|e| SpendlyError::invalid_parameter("category", e)))
            .transpose()?;

        let period = present(&query.period)
            .map(|v| {
                Period::from_str(v)
                    .map(|period| PeriodBound {
                        period,
                        since: period.since(today),
                    })
                    .map_err(|e| SpendlyError::invalid_parameter("period", e))
            })
            .transpose()?;

        let start_date = parse_date("start_date", &query.start_date)?;
        let end_date = parse_date("end_date", &query.end_date)?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(SpendlyError::invalid_parameter(
                    "start_date",
                    "start_date cannot be after end_date",
                ));
            }
        }

        let min_amount = parse_amount("min_amount", &query.min_amount)?;
        let max_amount = parse_amount("max_amount", &query.max_amount)?;
        if let (Some(min), Some(max)) = (min_amount, max_amount) {
            if min > max {
                return Err(SpendlyError::invalid_parameter(
                    "min_amount",
                    "min_amount cannot be greater than max_amount",
                ));
            }
        }

        let search = present(&query.search).map(str::to_lowercase);

        let ordering = match present(&query.ordering) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(|term| OrderTerm::from_str(term).map_err(|e| SpendlyError::invalid_parameter("ordering", e)))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(ExpenseFilter {
            category,
            period,
            start_date,
            end_date,
            min_amount,
            max_amount,
            search,
            ordering,
        })
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if self.category.is_some_and(|c| c != expense.category) {
            return false;
        }
        if self.period.is_some_and(|p| expense.date < p.since) {
            return false;
        }
        if self.start_date.is_some_and(|d| expense.date < d) {
            return false;
        }
        if self.end_date.is_some_and(|d| expense.date > d) {
            return false;
        }
        if self.min_amount.is_some_and(|m| expense.amount < m) {
            return false;
        }
        if self.max_amount.is_some_and(|m| expense.amount > m) {
            return false;
        }
        if let Some(needle) = &self.search {
            let in_title = expense.title.to_lowercase().contains(needle.as_str());
            let in_description = expense
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle.as_str()));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    /// Requested order, then newest first, then id for a stable result.
    pub fn compare(&self, a: &Expense, b: &Expense) -> Ordering {
        self.ordering
            .iter()
            .chain(DEFAULT_ORDERING.iter())
            .map(|term| term.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }

    pub fn sort(&self, expenses: &mut [Expense]) {
        expenses.sort_by(|a, b| self.compare(a, b));
    }
}

pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn from_query(query: &ExpenseQuery, default_page_size: usize) -> Result<Self, SpendlyError> {
        let page = parse_positive("page", &query.page)?.unwrap_or(1);
        let page_size = parse_positive("page_size", &query.page_size)?.unwrap_or(default_page_size);
        if page_size > MAX_PAGE_SIZE {
            return Err(SpendlyError::invalid_parameter(
                "page_size",
                format!("page_size cannot exceed {}", MAX_PAGE_SIZE),
            ));
        }
        Ok(Pagination { page, page_size })
    }

    /// Cuts one page out of `items`; pages past the end are rejected except the first.
    pub fn paginate<T>(&self, items: Vec<T>) -> Result<Page<T>, SpendlyError> {
        let count = items.len();
        let total_pages = count.div_ceil(self.page_size).max(1);
        if self.page > total_pages {
            return Err(SpendlyError::invalid_parameter("page", "Invalid page"));
        }
        let results = items
            .into_iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .collect();
        Ok(Page {
            count,
            page: self.page,
            page_size: self.page_size,
            next: (self.page < total_pages).then_some(self.page + 1),
            previous: (self.page > 1).then(|| self.page - 1),
            results,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(param: &str, value: &Option<String>) -> Result<Option<NaiveDate>, SpendlyError> {
    present(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| SpendlyError::invalid_parameter(param, format!("`{}` is not a valid date (YYYY-MM-DD)", v)))
        })
        .transpose()
}

fn parse_amount(param: &str, value: &Option<String>) -> Result<Option<Decimal>, SpendlyError> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };
    let amount = Decimal::from_str(raw)
        .map_err(|_| SpendlyError::invalid_parameter(param, format!("`{}` is not a number", raw)))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(SpendlyError::invalid_parameter(param, "amount cannot be negative"));
    }
    Ok(Some(amount))
}

fn parse_positive(param: &str, value: &Option<String>) -> Result<Option<usize>, SpendlyError> {
    present(value)
        .map(|v| match v.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(SpendlyError::invalid_parameter(
                param,
                format!("`{}` is not a positive integer", v),
            )),
        })
        .transpose()
}
