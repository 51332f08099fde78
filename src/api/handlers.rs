use crate::{
    api::models::*,
    core::{
        errors::SpendlyError,
        filters::{ExpenseFilter, ExpenseQuery, Pagination},
        models::{ExpenseChanges, NewExpense, User},
        services::SpendlyService,
        stats::ExpenseStats,
    },
    infrastructure::{
        logging::in_memory::InMemoryLogging,
        rate_limit::{
            in_memory::InMemoryRateLimiter,
            rate_limit_keys::{anonymous_key, user_key},
        },
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{
        ConnectInfo, Path, Query, Request, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use http::header;
use std::net::SocketAddr;
use std::sync::Arc;

pub type AppService = SpendlyService<InMemoryLogging, InMemoryStorage, InMemoryRateLimiter>;

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<AppService>,
    pub page_size: usize,
}

/// Middleware resolving the bearer access token to the calling user.
async fn auth_middleware(
    State(state): State<ApiState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| SpendlyError::Unauthenticated("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SpendlyError::Unauthenticated("Invalid Authorization header".to_string()))?;

    let user = state.service.resolve_access_token(token).await?;
    state.service.check_rate_limit(&user_key(&user.id)).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Throttles unauthenticated endpoints by client address.
async fn throttle_anonymous(
    State(state): State<ApiState>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    state.service.check_rate_limit(&anonymous_key(&client)).await?;
    Ok(next.run(req).await)
}

// Define API routes
pub fn api_routes(service: Arc<AppService>, page_size: usize) -> Router {
    let state = ApiState { service, page_size };

    let public_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/token/refresh", post(refresh_token))
        .route_layer(middleware::from_fn_with_state(state.clone(), throttle_anonymous));

    let protected_routes = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/stats", get(expense_stats))
        .route(
            "/expenses/{expense_id}",
            get(get_expense)
                .put(replace_expense)
                .patch(patch_expense)
                .delete(delete_expense),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes).with_state(state)
}

fn parse_filter(query: &ExpenseQuery) -> Result<ExpenseFilter, SpendlyError> {
    ExpenseFilter::from_query(query, Utc::now().date_naive())
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<ApiState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;
    let (user, tokens) = state.service.register(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserProfile::from(&user),
            tokens,
            message: "User registered successfully".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account inactive", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let (user, tokens) = state.service.authenticate(&req.email, &req.password).await?;
    Ok(Json(AuthResponse {
        user: UserProfile::from(&user),
        tokens,
        message: "Login successful".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Refresh token invalid, expired or revoked", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(state): State<ApiState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let Json(req) = payload?;
    let access = state.service.refresh_access_token(&req.refresh).await?;
    Ok(Json(AccessTokenResponse { access }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 205, description = "Refresh token revoked"),
        (status = 400, description = "Missing or invalid refresh token", body = ErrorResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn logout(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    state.service.logout(&user, &req.refresh).await?;
    Ok(StatusCode::RESET_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Caller profile", body = UserProfile),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn me(Extension(user): Extension<User>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Caller's expenses", body = ExpensePage),
        (status = 400, description = "Invalid filter parameter", body = ErrorResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_expenses(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    query: Result<Query<ExpenseQuery>, QueryRejection>,
) -> Result<Json<ExpensePage>, ApiError> {
    let Query(query) = query?;
    let filter = parse_filter(&query)?;
    let pagination = Pagination::from_query(&query, state.page_size)?;
    let expenses = state.service.list_expenses(&user, &filter).await?;
    Ok(Json(pagination.paginate(expenses)?.into()))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = ExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = ExpenseResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_expense(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    payload: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ApiError> {
    let Json(req) = payload?;
    let expense = state.service.create_expense(&user, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ExpenseResponse::new(expense, &user))))
}

#[utoipa::path(
    get,
    path = "/api/expenses/stats",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Aggregated totals", body = ExpenseStats),
        (status = 400, description = "Invalid filter parameter", body = ErrorResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn expense_stats(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    query: Result<Query<ExpenseQuery>, QueryRejection>,
) -> Result<Json<ExpenseStats>, ApiError> {
    let Query(query) = query?;
    let filter = parse_filter(&query)?;
    let stats = state.service.expense_stats(&user, &filter).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense found", body = ExpenseResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_expense(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    Path(expense_id): Path<String>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let expense = state.service.get_expense(&user, &expense_id).await?;
    Ok(Json(ExpenseResponse::new(expense, &user)))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{expense_id}",
    request_body = ExpenseRequest,
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense replaced", body = ExpenseResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn replace_expense(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    Path(expense_id): Path<String>,
    payload: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let Json(req) = payload?;
    let changes = ExpenseChanges::from(NewExpense::from(req));
    let expense = state.service.update_expense(&user, &expense_id, changes).await?;
    Ok(Json(ExpenseResponse::new(expense, &user)))
}

#[utoipa::path(
    patch,
    path = "/api/expenses/{expense_id}",
    request_body = PatchExpenseRequest,
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense updated", body = ExpenseResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn patch_expense(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    Path(expense_id): Path<String>,
    payload: Result<Json<PatchExpenseRequest>, JsonRejection>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let Json(req) = payload?;
    let expense = state.service.update_expense(&user, &expense_id, req.into()).await?;
    Ok(Json(ExpenseResponse::new(expense, &user)))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_expense(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    Path(expense_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_expense(&user, &expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
