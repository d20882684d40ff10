use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use phoenix_core::models::{Baggage, BaggageItem, BaggageStatus};
use serde::{Deserialize, Deserializer};

use crate::error::AppError;
use crate::state::AppState;

/// One bag line from a form. `weight_kg` may be a number, a numeric string,
/// an empty string or null; the last two mean the line was left blank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BagForm {
    #[serde(default, deserialize_with = "lenient_weight")]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<BagForm> for BaggageItem {
    fn from(form: BagForm) -> Self {
        BaggageItem {
            weight_kg: form.weight_kg,
            description: form.description,
        }
    }
}

pub fn into_items(forms: Vec<BagForm>) -> Vec<BaggageItem> {
    forms.into_iter().map(BaggageItem::from).collect()
}

fn lenient_weight<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Weight {
        Number(f64),
        Text(String),
    }

    let kg = match Option::<Weight>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Weight::Number(kg)) => kg,
        Some(Weight::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid weight '{}'", text)))?
        }
    };

    // "NaN" and "inf" parse as f64 but are not weights.
    if !kg.is_finite() {
        return Err(serde::de::Error::custom(format!("invalid weight '{}'", kg)));
    }
    Ok(Some(kg))
}

#[derive(Debug, Deserialize)]
pub struct AddBaggageRequest {
    #[serde(default)]
    pub items: Vec<BagForm>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBaggageRequest {
    pub status: BaggageStatus,
    pub location: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/bookings/{reference}/baggage",
            post(add_baggage).get(booking_baggage),
        )
        .route("/v1/baggage/{tag}", get(track_baggage))
        .route("/v1/admin/baggage/{tag}", put(update_baggage))
}

async fn add_baggage(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(req): Json<AddBaggageRequest>,
) -> Result<(StatusCode, Json<Vec<Baggage>>), AppError> {
    let bags = state
        .baggage
        .add_baggage(&reference, &into_items(req.items))
        .await?;

    state.metrics.bags_checked.inc_by(bags.len() as u64);
    Ok((StatusCode::CREATED, Json(bags)))
}

async fn booking_baggage(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Vec<Baggage>>, AppError> {
    Ok(Json(state.baggage.booking_baggage(&reference).await?))
}

async fn track_baggage(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Baggage>, AppError> {
    Ok(Json(state.baggage.track_baggage(&tag).await?))
}

// Open to any caller, like the admin screen it replaces.
async fn update_baggage(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Json(req): Json<UpdateBaggageRequest>,
) -> Result<Json<Baggage>, AppError> {
    let bag = state
        .baggage
        .update_baggage_status(&tag, req.status, &req.location)
        .await?;

    state.metrics.baggage_updates.inc();
    Ok(Json(bag))
}
