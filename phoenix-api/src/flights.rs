use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use phoenix_core::models::{Aircraft, Airport, Flight};
use phoenix_core::search::FlightSearchRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(alias = "origin_airport_code")]
    pub origin: String,
    #[serde(alias = "destination_airport_code")]
    pub destination: String,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    origin: String,
    destination: String,
    date: NaiveDate,
    flights: Vec<Flight>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/airports", get(list_airports))
        .route("/v1/aircraft", get(list_aircraft))
        .route("/v1/flights/search", post(search_flights))
        .route("/v1/flights/{flight_id}", get(get_flight))
}

async fn list_airports(State(state): State<AppState>) -> Result<Json<Vec<Airport>>, AppError> {
    Ok(Json(state.directory.list_airports().await?))
}

async fn list_aircraft(State(state): State<AppState>) -> Result<Json<Vec<Aircraft>>, AppError> {
    Ok(Json(state.directory.list_aircraft().await?))
}

async fn search_flights(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let req = FlightSearchRequest {
        origin_airport_code: req.origin,
        destination_airport_code: req.destination,
        date: req.date,
    }
    .normalized()?;

    let flights = state.bookings.search_flights(&req).await?;
    info!(
        origin = %req.origin_airport_code,
        destination = %req.destination_airport_code,
        date = %req.date,
        results = flights.len(),
        "Flight search"
    );

    Ok(Json(SearchResponse {
        origin: req.origin_airport_code,
        destination: req.destination_airport_code,
        date: req.date,
        flights,
    }))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.bookings.get_flight(flight_id).await?))
}
