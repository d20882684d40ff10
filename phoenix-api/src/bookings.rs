use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::post,
    Extension, Json, Router,
};
use phoenix_core::models::{Baggage, Booking, Contact, Flight};
use phoenix_core::{CoreError, Masked};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::baggage::{into_items, BagForm};
use crate::error::AppError;
use crate::middleware::auth::{optional_customer_middleware, CustomerClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "one_passenger")]
    pub num_passengers: i32,
}

fn one_passenger() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub booking_reference: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub seat_number: String,
    #[serde(default)]
    pub bags: Vec<BagForm>,
}

#[derive(Debug, Serialize)]
struct LookupResponse {
    booking: Booking,
    flight: Flight,
}

#[derive(Debug, Serialize)]
struct CheckInResponse {
    booking: Booking,
    baggage: Vec<Baggage>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    // Booking creation takes an optional customer token.
    let create = Router::new()
        .route("/v1/flights/{flight_id}/bookings", post(create_booking))
        .layer(middleware::from_fn_with_state(state, optional_customer_middleware));

    Router::new()
        .route("/v1/bookings/lookup", post(lookup_booking))
        .route("/v1/bookings/{reference}/check-in", post(check_in))
        .merge(create)
}

async fn create_booking(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
    claims: Option<Extension<CustomerClaims>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let user_id = claims.and_then(|Extension(c)| c.user_id());
    let contact = Contact {
        first_name: req.first_name,
        last_name: req.last_name,
        email: Masked(req.email),
        phone: req.phone,
    };

    match state
        .bookings
        .create_booking(flight_id, contact, req.num_passengers, user_id)
        .await
    {
        Ok(booking) => {
            state.metrics.bookings_created.inc();
            Ok((StatusCode::CREATED, Json(booking)))
        }
        Err(err @ CoreError::InsufficientInventory { .. }) => {
            state.metrics.inventory_rejections.inc();
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

async fn lookup_booking(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<LookupResponse>, AppError> {
    let booking = state
        .bookings
        .find_booking(&req.booking_reference, req.last_name.trim())
        .await?;
    let flight = state.bookings.get_flight(booking.flight_id).await?;
    Ok(Json(LookupResponse { booking, flight }))
}

// No ownership check: anyone holding the reference can check in.
async fn check_in(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(req): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, AppError> {
    let record = state
        .baggage
        .check_in_with_baggage(&reference, &req.seat_number, &into_items(req.bags))
        .await?;

    if record.newly_checked_in {
        state.metrics.check_ins.inc();
        state.metrics.bags_checked.inc_by(record.baggage.len() as u64);
    } else {
        info!(reference = %record.booking.booking_reference, "Check-in repeated, nothing changed");
    }

    Ok(Json(CheckInResponse {
        booking: record.booking,
        baggage: record.baggage,
    }))
}
