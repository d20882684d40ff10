use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{opts, IntCounter, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Lifecycle counters, exported on `/metrics`.
pub struct Metrics {
    registry: Registry,
    pub bookings_created: IntCounter,
    pub inventory_rejections: IntCounter,
    pub check_ins: IntCounter,
    pub bags_checked: IntCounter,
    pub baggage_updates: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let bookings_created = IntCounter::with_opts(opts!(
            "phoenix_bookings_created_total",
            "Bookings confirmed"
        ))?;
        let inventory_rejections = IntCounter::with_opts(opts!(
            "phoenix_inventory_rejections_total",
            "Booking attempts refused for lack of seats"
        ))?;
        let check_ins = IntCounter::with_opts(opts!(
            "phoenix_check_ins_total",
            "Bookings checked in"
        ))?;
        let bags_checked = IntCounter::with_opts(opts!(
            "phoenix_bags_checked_total",
            "Bags tagged at check-in or afterwards"
        ))?;
        let baggage_updates = IntCounter::with_opts(opts!(
            "phoenix_baggage_updates_total",
            "Baggage status changes"
        ))?;

        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(inventory_rejections.clone()))?;
        registry.register(Box::new(check_ins.clone()))?;
        registry.register(Box::new(bags_checked.clone()))?;
        registry.register(Box::new(baggage_updates.clone()))?;

        Ok(Self {
            registry,
            bookings_created,
            inventory_rejections,
            check_ins,
            bags_checked,
            baggage_updates,
        })
    }

    pub fn export(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(export_metrics))
}

async fn export_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .export()
        .map_err(|e| AppError::InternalServerError(format!("Metrics encoding failed: {}", e)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
