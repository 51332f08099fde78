use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{
        AccessTokenResponse, AuthResponse, ErrorResponse, ExpenseListItem, ExpensePage, ExpenseRequest,
        ExpenseResponse, LoginRequest, LogoutRequest, PatchExpenseRequest, RefreshRequest, RegisterRequest,
        UserProfile,
    },
    core::{
        errors::FieldError,
        filters::Period,
        models::Category,
        services::TokenPair,
        stats::{CategoryBreakdown, ExpenseStats, PeriodStats},
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::register,
        super::handlers::login,
        super::handlers::refresh_token,
        super::handlers::logout,
        super::handlers::me,
        super::handlers::list_expenses,
        super::handlers::create_expense,
        super::handlers::expense_stats,
        super::handlers::get_expense,
        super::handlers::replace_expense,
        super::handlers::patch_expense,
        super::handlers::delete_expense
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        LogoutRequest,
        ExpenseRequest,
        PatchExpenseRequest,
        AuthResponse,
        AccessTokenResponse,
        TokenPair,
        UserProfile,
        ExpenseResponse,
        ExpenseListItem,
        ExpensePage,
        ExpenseStats,
        CategoryBreakdown,
        PeriodStats,
        Period,
        Category,
        FieldError,
        ErrorResponse
    )),
    modifiers(&BearerAuth),
    info(
        title = "Spendly API",
        description = "API for tracking personal expenses",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
