use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use phoenix_core::directory::Registration;
use phoenix_core::models::{Booking, User};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, issue_token, CustomerClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: User,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    user_id: i64,
    email: String,
    bookings: Vec<Booking>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/dashboard", get(dashboard))
        .layer(middleware::from_fn_with_state(state, customer_auth_middleware));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected)
}

fn token_for(state: &AppState, user: User) -> Result<Json<AuthResponse>, AppError> {
    let token = issue_token(&state.auth, &user)
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;
    Ok(Json(AuthResponse { token, user }))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state
        .directory
        .register_user(Registration {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
        })
        .await?;

    Ok((StatusCode::CREATED, token_for(&state, user)?))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.directory.authenticate(&req.email, &req.password).await?;
    tracing::info!(user_id = user.user_id, "Customer logged in");
    token_for(&state, user)
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<DashboardResponse>, AppError> {
    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::AuthenticationError("Invalid token subject".to_string()))?;

    let bookings = state.bookings.user_bookings(user_id).await?;
    Ok(Json(DashboardResponse {
        user_id,
        email: claims.email,
        bookings,
    }))
}
