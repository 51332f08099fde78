use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::core::errors::{FieldError, SpendlyError};
use crate::core::filters::Page;
use crate::core::models::{Category, Expense, ExpenseChanges, NewExpense, User};
use crate::core::services::{Registration, TokenPair};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Registration {
            email: req.email,
            password: req.password,
            password2: req.password2,
            first_name: req.first_name,
            last_name: req.last_name,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh: String,
}

/// Body of `POST /expenses` and `PUT /expenses/{id}`.
#[derive(Deserialize, ToSchema)]
pub struct ExpenseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
    pub category: Category,
    #[schema(value_type = String, format = Date, example = "2024-06-01")]
    pub date: NaiveDate,
}

impl From<ExpenseRequest> for NewExpense {
    fn from(req: ExpenseRequest) -> Self {
        NewExpense {
            title: req.title,
            description: req.description,
            amount: req.amount,
            category: req.category,
            date: req.date,
        }
    }
}

/// Body of `PATCH /expenses/{id}`; absent fields stay untouched.
#[derive(Deserialize, ToSchema, Default)]
pub struct PatchExpenseRequest {
    #[serde(default)]
    pub title: Option<String>,
    /// `null` clears the description
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "15000.00")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

impl From<PatchExpenseRequest> for ExpenseChanges {
    fn from(req: PatchExpenseRequest) -> Self {
        ExpenseChanges {
            title: req.title,
            description: req.description,
            amount: req.amount,
            category: req.category,
            date: req.date,
        }
    }
}

// Present-but-null becomes Some(None), absent stays None via #[serde(default)].
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// Response structs
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date_joined: DateTime<Utc>,
    pub is_active: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            date_joined: user.date_joined,
            is_active: user.is_active,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ExpenseResponse {
    pub id: String,
    pub user: String,
    pub user_email: String,
    pub title: String,
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
    pub category: Category,
    pub category_display: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = Date, example = "2024-06-01")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl ExpenseResponse {
    pub fn new(expense: Expense, owner: &User) -> Self {
        ExpenseResponse {
            id: expense.id,
            user: owner.id.clone(),
            user_email: owner.email.clone(),
            title: expense.title,
            amount: expense.amount,
            category: expense.category,
            category_display: expense.category.label().to_string(),
            description: expense.description,
            date: expense.date,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ExpenseListItem {
    pub id: String,
    pub title: String,
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
    pub category: Category,
    pub category_display: String,
    #[schema(value_type = String, format = Date, example = "2024-06-01")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseListItem {
    fn from(expense: Expense) -> Self {
        ExpenseListItem {
            id: expense.id,
            title: expense.title,
            amount: expense.amount,
            category: expense.category,
            category_display: expense.category.label().to_string(),
            date: expense.date,
            created_at: expense.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ExpensePage {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<ExpenseListItem>,
}

impl From<Page<Expense>> for ExpensePage {
    fn from(page: Page<Expense>) -> Self {
        let page = page.map(ExpenseListItem::from);
        ExpensePage {
            count: page.count,
            page: page.page,
            page_size: page.page_size,
            next: page.next,
            previous: page.previous,
            results: page.results,
        }
    }
}

// Error response struct
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldError>,
}

// Newtype wrapper for SpendlyError to implement IntoResponse
#[derive(Debug)]
pub struct ApiError(pub SpendlyError);

impl From<SpendlyError> for ApiError {
    fn from(err: SpendlyError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => ApiError(field_error_from(&text)),
            _ => ApiError(SpendlyError::invalid_input("body", "Malformed Body", text)),
        }
    }
}

/// Maps a typed-body deserialisation failure (unknown category, missing
/// field, unparsable amount or date) onto the offending field.
pub(crate) fn field_error_from(body_text: &str) -> SpendlyError {
    let message = body_text
        .split_once("target type: ")
        .map_or(body_text, |(_, rest)| rest);
    let message = message.rsplit_once(" at line ").map_or(message, |(m, _)| m);

    if let Some(rest) = message.strip_prefix("missing field `") {
        let field = rest.split('`').next().unwrap_or_default();
        if !field.is_empty() {
            return SpendlyError::invalid_input(field, format!("Missing {}", field), "This field is required");
        }
    }
    match message.split_once(": ") {
        Some((path, reason)) if is_field_path(path) => {
            let field = path.rsplit('.').next().unwrap_or(path);
            SpendlyError::invalid_input(field, format!("Invalid {}", field), reason)
        }
        _ => SpendlyError::invalid_input("body", "Malformed Body", message),
    }
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(SpendlyError::invalid_parameter("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.0.is_internal() {
            error!(error = %self.0, "request failed");
        }
        let mut details = None;
        let mut retry_after = None;
        let (status, error_message) = match self.0 {
            SpendlyError::MissingEmail => (StatusCode::BAD_REQUEST, "Email is required".to_string()),
            SpendlyError::EmailAlreadyRegistered(email) => {
                (StatusCode::CONFLICT, format!("Email {} already registered", email))
            }
            SpendlyError::InvalidEmail(email) => (StatusCode::BAD_REQUEST, format!("Invalid email: {}", email)),
            SpendlyError::InvalidInput(field, field_error) => {
                let message = format!("Invalid input for {}: {}", field, field_error.description);
                details = Some(field_error);
                (StatusCode::BAD_REQUEST, message)
            }
            SpendlyError::InvalidParameter(param, msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid parameter {}: {}", param, msg))
            }
            SpendlyError::ExpenseNotFound(id) => (StatusCode::NOT_FOUND, format!("Expense {} not found", id)),
            SpendlyError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()),
            SpendlyError::InactiveAccount => (StatusCode::FORBIDDEN, "This account is inactive".to_string()),
            SpendlyError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            SpendlyError::RateLimited { retry_after_secs } => {
                retry_after = Some(retry_after_secs);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    format!("Request was throttled, retry in {} seconds", retry_after_secs),
                )
            }
            SpendlyError::InternalServerError(_) | SpendlyError::StorageError(_) | SpendlyError::LoggingError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let Some(secs) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
