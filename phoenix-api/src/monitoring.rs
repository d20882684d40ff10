use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use phoenix_core::health::{BusinessMetrics, HealthReport, ServiceHealth};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/monitoring/health/all", get(all_services))
        .route("/monitoring/health/{service}", get(one_service))
        .route("/monitoring/metrics/business", get(business_metrics))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "app": "Phoenix Air",
        "database": state.health.database_status().await,
        "timestamp": Utc::now(),
    }))
}

async fn all_services(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.overall_health().await)
}

async fn one_service(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Result<Json<ServiceHealth>, AppError> {
    Ok(Json(state.health.service_health(&service).await?))
}

async fn business_metrics(State(state): State<AppState>) -> Result<Json<BusinessMetrics>, AppError> {
    Ok(Json(state.health.business_metrics().await?))
}
