use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use phoenix_api::{app, AppState, AuthConfig};
use phoenix_core::models::{Airport, CabinFares, NewAircraft, NewFlight, FLIGHT_STATUS_SCHEDULED};
use phoenix_core::{BookingSettings, PasswordHasher, RandomCodes, SeatInventory};
use phoenix_store::InMemoryRepository;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup(economy: i32) -> (Router, i64) {
    let state = AppState::new(
        Arc::new(InMemoryRepository::new()),
        Arc::new(RandomCodes),
        BookingSettings::default(),
        PasswordHasher::new(1_000),
        AuthConfig { secret: "integration-secret".to_string(), expiration: 3600 },
    )
    .unwrap();

    for code in ["JFK", "ORD"] {
        state
            .directory
            .add_airport(Airport {
                airport_code: code.to_string(),
                name: format!("{} Airport", code),
                city: code.to_string(),
                country: "USA".to_string(),
                timezone: "America/Chicago".to_string(),
            })
            .await
            .unwrap();
    }
    let aircraft = state
        .directory
        .add_aircraft(NewAircraft {
            registration: "N320PA".to_string(),
            model: "Airbus A320".to_string(),
            economy_seats: 156,
            business_seats: 20,
            first_class_seats: 4,
        })
        .await
        .unwrap();
    let departure = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap().and_hms_opt(10, 15, 0).unwrap();
    let flight = state
        .directory
        .schedule_flight(NewFlight {
            flight_number: "PA233".to_string(),
            origin_airport: "JFK".to_string(),
            destination_airport: "ORD".to_string(),
            aircraft_id: aircraft.aircraft_id,
            scheduled_departure: departure,
            scheduled_arrival: departure + Duration::minutes(140),
            status: FLIGHT_STATUS_SCHEDULED.to_string(),
            gate: Some("C7".to_string()),
            fares: CabinFares {
                price_economy_cents: 21_000,
                price_business_cents: 52_500,
                price_first_cents: 84_000,
            },
            availability: SeatInventory { economy, business: 12, first: 2 },
        })
        .await
        .unwrap();

    (app(state), flight.flight_id)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn passenger(num_passengers: i32) -> Value {
    json!({
        "first_name": "Katherine",
        "last_name": "Johnson",
        "email": "katherine@example.com",
        "num_passengers": num_passengers,
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup(10).await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_search_and_flight_details() {
    let (app, flight_id) = setup(10).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/flights/search",
        Some(json!({"origin": "jfk", "destination": "ord", "date": "2025-07-04"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "JFK");
    assert_eq!(body["flights"].as_array().unwrap().len(), 1);
    assert_eq!(body["flights"][0]["available_economy"], 10);

    let (status, body) = send(&app, "GET", &format!("/v1/flights/{}", flight_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flight_number"], "PA233");

    let (status, _) = send(&app, "GET", "/v1/flights/424242", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/v1/airports", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_booking_to_baggage_flow() {
    let (app, flight_id) = setup(2).await;
    let uri = format!("/v1/flights/{}/bookings", flight_id);

    let (status, booking) = send(&app, "POST", &uri, Some(passenger(2)), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["total_price_cents"], 42_000);
    assert!(booking["user_id"].is_null());
    let reference = booking["booking_reference"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", &uri, Some(passenger(1)), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Insufficient"));

    let (status, found) = send(
        &app,
        "POST",
        "/v1/bookings/lookup",
        Some(json!({"booking_reference": reference.to_lowercase(), "last_name": "Johnson"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["flight"]["available_economy"], 0);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/bookings/lookup",
        Some(json!({"booking_reference": reference, "last_name": "Jackson"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, checked) = send(
        &app,
        "POST",
        &format!("/v1/bookings/{}/check-in", reference),
        Some(json!({
            "seat_number": "12A",
            "bags": [
                {"weight_kg": "21.5", "description": ""},
                {"weight_kg": "", "description": "forgot to weigh"},
                {"weight_kg": null}
            ]
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checked["booking"]["checked_in"], true);
    assert_eq!(checked["booking"]["seat_number"], "12A");
    let bags = checked["baggage"].as_array().unwrap();
    assert_eq!(bags.len(), 1);
    assert_eq!(bags[0]["description"], "Checked bag");
    assert_eq!(bags[0]["location"], "JFK - Check-in Counter");
    let tag = bags[0]["tag"].as_str().unwrap().to_string();

    let (status, again) = send(
        &app,
        "POST",
        &format!("/v1/bookings/{}/check-in", reference),
        Some(json!({"seat_number": "1C", "bags": [{"weight_kg": 9}]})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["booking"]["seat_number"], "12A");
    assert_eq!(again["baggage"].as_array().unwrap().len(), 1);

    let (status, moved) = send(
        &app,
        "PUT",
        &format!("/v1/admin/baggage/{}", tag),
        Some(json!({"status": "loaded", "location": "ORD - Carousel 4"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["status"], "loaded");

    let (status, tracked) = send(&app, "GET", &format!("/v1/baggage/{}", tag), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["location"], "ORD - Carousel 4");

    let (status, listed) = send(
        &app,
        "GET",
        &format!("/v1/bookings/{}/baggage", reference),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, metrics) = send(&app, "GET", "/monitoring/metrics/business", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["total_bookings"], 1);
    assert_eq!(metrics["total_checkins"], 1);
    assert_eq!(metrics["total_baggage"], 1);
    assert_eq!(metrics["total_revenue_cents"], 42_000);
}

#[tokio::test]
async fn test_add_baggage_after_booking() {
    let (app, flight_id) = setup(5).await;
    let (_, booking) = send(
        &app,
        "POST",
        &format!("/v1/flights/{}/bookings", flight_id),
        Some(passenger(1)),
        None,
    )
    .await;
    let reference = booking["booking_reference"].as_str().unwrap();

    let (status, bags) = send(
        &app,
        "POST",
        &format!("/v1/bookings/{}/baggage", reference),
        Some(json!({"items": [{"weight_kg": 23}, {"weight_kg": 7.5, "description": "Guitar"}]})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let bags = bags.as_array().unwrap();
    assert_eq!(bags.len(), 2);
    assert_ne!(bags[0]["tag"], bags[1]["tag"]);
    assert_eq!(bags[1]["description"], "Guitar");

    let (status, _) = send(
        &app,
        "POST",
        "/v1/bookings/NOPE00/baggage",
        Some(json!({"items": [{"weight_kg": 23}]})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_authentication_flow() {
    let (app, flight_id) = setup(10).await;
    let registration = json!({
        "email": "Mary@Example.com",
        "password": "orbital",
        "first_name": "Mary",
        "last_name": "Jackson",
    });

    let (status, registered) = send(&app, "POST", "/auth/register", Some(registration.clone()), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["user"]["email"], "mary@example.com");
    assert!(registered["user"].get("password_hash").is_none());

    let (status, _) = send(&app, "POST", "/auth/register", Some(registration), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({"email": "mary@example.com", "password": "wrong"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({"email": "mary@example.com", "password": "orbital"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, booking) = send(
        &app,
        "POST",
        &format!("/v1/flights/{}/bookings", flight_id),
        Some(passenger(1)),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["user_id"], login["user"]["user_id"]);

    let (status, dashboard) = send(&app, "GET", "/auth/dashboard", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["bookings"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/auth/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/v1/flights/{}/bookings", flight_id),
        Some(passenger(1)),
        Some("not-a-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_monitoring_endpoints() {
    let (app, _) = setup(10).await;

    let (status, report) = send(&app, "GET", "/monitoring/health/all", None, None).await;
    assert_eq!(status, StatusCode::OK);
    // Empty tables still answer; only a missing schedule takes a service down.
    assert_eq!(report["overall_status"], "UP");
    assert_eq!(report["services"]["flight_search"]["status"], "UP");
    assert_eq!(report["services"]["authentication"]["status"], "UP");

    let (status, single) = send(&app, "GET", "/monitoring/health/database", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["status"], "UP");

    let (status, _) = send(&app, "GET", "/monitoring/health/payments", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&text).contains("phoenix_bookings_created_total"));
}
