use chrono::{Duration, NaiveDate};
use phoenix_core::codes::{CodeGenerator, ScriptedCodes};
use phoenix_core::health::{OverallStatus, ServiceStatus};
use phoenix_core::models::{
    Airport, BaggageItem, BaggageStatus, BookingStatus, CabinFares, Contact, Flight, NewAircraft,
    NewFlight, FLIGHT_STATUS_SCHEDULED,
};
use phoenix_core::search::FlightSearchRequest;
use phoenix_core::directory::Registration;
use phoenix_core::{
    AirlineRepository, BaggageService, BookingService, BookingSettings, CoreError,
    DirectoryService, HealthMonitor, Masked, PasswordHasher, RandomCodes, SeatInventory,
};
use phoenix_store::InMemoryRepository;
use std::sync::Arc;

struct Fixture {
    repo: Arc<InMemoryRepository>,
    directory: DirectoryService,
    bookings: BookingService,
    baggage: BaggageService,
    flight: Flight,
}

fn departure_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
}

async fn fixture_with(codes: Arc<dyn CodeGenerator>, settings: BookingSettings, economy: i32) -> Fixture {
    let repo = Arc::new(InMemoryRepository::new());
    let directory = DirectoryService::new(repo.clone(), PasswordHasher::new(1_000));

    for (code, city) in [("JFK", "New York"), ("LAX", "Los Angeles")] {
        directory
            .add_airport(Airport {
                airport_code: code.to_string(),
                name: format!("{} Airport", city),
                city: city.to_string(),
                country: "USA".to_string(),
                timezone: "America/New_York".to_string(),
            })
            .await
            .unwrap();
    }

    let aircraft = directory
        .add_aircraft(NewAircraft {
            registration: "N737PA".to_string(),
            model: "Boeing 737-800".to_string(),
            economy_seats: 150,
            business_seats: 20,
            first_class_seats: 5,
        })
        .await
        .unwrap();

    let departure = departure_day().and_hms_opt(8, 30, 0).unwrap();
    let flight = directory
        .schedule_flight(NewFlight {
            flight_number: "PA417".to_string(),
            origin_airport: "JFK".to_string(),
            destination_airport: "LAX".to_string(),
            aircraft_id: aircraft.aircraft_id,
            scheduled_departure: departure,
            scheduled_arrival: departure + Duration::minutes(150),
            status: FLIGHT_STATUS_SCHEDULED.to_string(),
            gate: Some("B12".to_string()),
            fares: CabinFares {
                price_economy_cents: 19_950,
                price_business_cents: 49_875,
                price_first_cents: 79_800,
            },
            availability: SeatInventory { economy, business: 10, first: 2 },
        })
        .await
        .unwrap();

    Fixture {
        bookings: BookingService::new(repo.clone(), codes.clone(), settings),
        baggage: BaggageService::new(repo.clone(), codes, settings),
        repo,
        directory,
        flight,
    }
}

async fn fixture(economy: i32) -> Fixture {
    fixture_with(Arc::new(RandomCodes), BookingSettings::default(), economy).await
}

fn contact(last_name: &str) -> Contact {
    Contact {
        first_name: "Grace".to_string(),
        last_name: last_name.to_string(),
        email: Masked("grace@example.com".to_string()),
        phone: Some("555-0100".to_string()),
    }
}

fn bag(weight_kg: Option<f64>, description: Option<&str>) -> BaggageItem {
    BaggageItem {
        weight_kg,
        description: description.map(str::to_string),
    }
}

async fn economy_left(fx: &Fixture) -> i32 {
    fx.repo
        .get_flight(fx.flight.flight_id)
        .await
        .unwrap()
        .unwrap()
        .availability
        .economy
}

#[tokio::test]
async fn test_search_matches_route_and_day() {
    let fx = fixture(100).await;

    let req = FlightSearchRequest {
        origin_airport_code: " jfk".to_string(),
        destination_airport_code: "lax ".to_string(),
        date: departure_day(),
    };
    let found = fx.bookings.search_flights(&req).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].flight_number, "PA417");

    let next_day = FlightSearchRequest { date: departure_day() + Duration::days(1), ..req.clone() };
    assert!(fx.bookings.search_flights(&next_day).await.unwrap().is_empty());

    let reversed = FlightSearchRequest {
        origin_airport_code: "LAX".to_string(),
        destination_airport_code: "JFK".to_string(),
        date: departure_day(),
    };
    assert!(fx.bookings.search_flights(&reversed).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_last_two_seats_then_rejection() {
    let fx = fixture(2).await;

    let booking = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 2, None)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.total_price_cents, 2 * 19_950);
    assert!(!booking.checked_in);
    assert_eq!(booking.booking_reference.len(), 6);
    assert_eq!(economy_left(&fx).await, 0);

    let err = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::InsufficientInventory { requested: 1, available: 0, .. }
    ));
    assert_eq!(economy_left(&fx).await, 0);
    assert_eq!(fx.repo.business_counts().await.unwrap().total_bookings, 1);
}

#[tokio::test]
async fn test_booking_rejects_bad_input() {
    let fx = fixture(10).await;

    let err = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailure(_)));

    let err = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("   "), 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailure(_)));

    let err = fx
        .bookings
        .create_booking(9_999, contact("Hopper"), 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    assert_eq!(economy_left(&fx).await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_never_oversell() {
    let fx = fixture(10).await;

    let mut handles = Vec::new();
    for i in 0..25 {
        let bookings = fx.bookings.clone();
        let flight_id = fx.flight.flight_id;
        handles.push(tokio::spawn(async move {
            bookings
                .create_booking(flight_id, contact(&format!("Passenger{}", i)), 1, None)
                .await
        }));
    }

    let mut confirmed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(CoreError::InsufficientInventory { .. }) => rejected += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(confirmed, 10);
    assert_eq!(rejected, 15);
    assert_eq!(economy_left(&fx).await, 0);
    assert_eq!(fx.repo.business_counts().await.unwrap().total_bookings, 10);
}

#[tokio::test]
async fn test_reference_collision_is_regenerated() {
    let codes = Arc::new(ScriptedCodes::new(["AAAAAA", "AAAAAA", "BBBBBB"], Vec::<String>::new()));
    let fx = fixture_with(codes, BookingSettings::default(), 10).await;

    let first = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();
    let second = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Lovelace"), 1, None)
        .await
        .unwrap();

    assert_eq!(first.booking_reference, "AAAAAA");
    assert_eq!(second.booking_reference, "BBBBBB");
    // The colliding attempt must not have taken a seat.
    assert_eq!(economy_left(&fx).await, 8);
}

#[tokio::test]
async fn test_reference_attempts_are_bounded() {
    let codes = Arc::new(ScriptedCodes::new(["AAAAAA"; 4], Vec::<String>::new()));
    let settings = BookingSettings { reference_attempts: 3, tag_attempts: 3 };
    let fx = fixture_with(codes, settings, 10).await;

    fx.bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();
    let err = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Lovelace"), 1, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Storage(_)));
    assert_eq!(economy_left(&fx).await, 9);
}

#[tokio::test]
async fn test_find_booking_needs_reference_and_last_name() {
    let fx = fixture(10).await;
    let booking = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();

    let typed = format!(" {} ", booking.booking_reference.to_lowercase());
    let found = fx.bookings.find_booking(&typed, "Hopper").await.unwrap();
    assert_eq!(found.booking_id, booking.booking_id);

    let err = fx
        .bookings
        .find_booking(&booking.booking_reference, "hopper")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = fx.bookings.find_booking("ZZZZZZ", "Hopper").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_check_in_is_idempotent() {
    let fx = fixture(10).await;
    let booking = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();

    let checked = fx
        .bookings
        .check_in(&booking.booking_reference, "12a")
        .await
        .unwrap();
    assert!(checked.checked_in);
    assert_eq!(checked.status, BookingStatus::CheckedIn);
    assert_eq!(checked.seat_number.as_deref(), Some("12A"));

    let again = fx
        .bookings
        .check_in(&booking.booking_reference, "30F")
        .await
        .unwrap();
    assert_eq!(again, checked);

    let err = fx.bookings.check_in("ZZZZZZ", "1A").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_check_in_is_visible_to_lookup() {
    let codes = Arc::new(ScriptedCodes::new(["ABC123"], Vec::<String>::new()));
    let fx = fixture_with(codes, BookingSettings::default(), 10).await;
    fx.bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();

    let checked = fx.bookings.check_in("ABC123", "12A").await.unwrap();
    assert!(checked.checked_in);
    assert_eq!(checked.seat_number.as_deref(), Some("12A"));

    let found = fx.bookings.find_booking("ABC123", "Hopper").await.unwrap();
    assert_eq!(found, checked);

    let err = fx.bookings.find_booking("ABC123", "Lovelace").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_check_in_tags_only_weighed_bags() {
    let fx = fixture(10).await;
    let booking = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();

    let record = fx
        .baggage
        .check_in_with_baggage(
            &booking.booking_reference,
            "14C",
            &[bag(Some(23.0), None), bag(None, Some("Left blank")), bag(Some(9.5), Some("Golf clubs"))],
        )
        .await
        .unwrap();

    assert!(record.newly_checked_in);
    assert_eq!(record.baggage.len(), 2);
    assert_eq!(record.baggage[0].description, "Checked bag");
    assert_eq!(record.baggage[1].description, "Golf clubs");
    for item in &record.baggage {
        assert!(item.tag.starts_with("PA"));
        assert_eq!(item.tag.len(), 10);
        assert_eq!(item.status, BaggageStatus::CheckedIn);
        assert_eq!(item.location, "JFK - Check-in Counter");
        assert_eq!(item.booking_id, booking.booking_id);
    }
    assert_ne!(record.baggage[0].tag, record.baggage[1].tag);

    // A second check-in keeps the first bags and adds none.
    let again = fx
        .baggage
        .check_in_with_baggage(&booking.booking_reference, "1A", &[bag(Some(5.0), None)])
        .await
        .unwrap();
    assert!(!again.newly_checked_in);
    assert_eq!(again.baggage, record.baggage);
    assert_eq!(again.booking.seat_number.as_deref(), Some("14C"));
}

#[tokio::test]
async fn test_tag_collision_is_regenerated() {
    let codes = Arc::new(ScriptedCodes::new(
        Vec::<String>::new(),
        ["PA00000001", "PA00000001", "PA00000002"],
    ));
    let fx = fixture_with(codes, BookingSettings::default(), 10).await;

    let first = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();
    let second = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Lovelace"), 1, None)
        .await
        .unwrap();

    let tagged = fx
        .baggage
        .add_baggage(&first.booking_reference, &[bag(Some(20.0), None)])
        .await
        .unwrap();
    assert_eq!(tagged[0].tag, "PA00000001");

    let tagged = fx
        .baggage
        .add_baggage(&second.booking_reference, &[bag(Some(18.0), None)])
        .await
        .unwrap();
    assert_eq!(tagged[0].tag, "PA00000002");
    assert_eq!(fx.repo.business_counts().await.unwrap().total_baggage, 2);
}

#[tokio::test]
async fn test_baggage_tracking_and_status_updates() {
    let fx = fixture(10).await;
    let booking = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();
    let tagged = fx
        .baggage
        .add_baggage(&booking.booking_reference, &[bag(Some(20.0), None)])
        .await
        .unwrap();
    let tag = tagged[0].tag.clone();

    let moved = fx
        .baggage
        .update_baggage_status(&tag, BaggageStatus::InTransit, "JFK - Ramp")
        .await
        .unwrap();
    assert_eq!(moved.status, BaggageStatus::InTransit);
    assert_eq!(moved.location, "JFK - Ramp");
    assert!(moved.last_updated >= tagged[0].last_updated);

    let tracked = fx.baggage.track_baggage(&tag).await.unwrap();
    assert_eq!(tracked, moved);

    let listed = fx.baggage.booking_baggage(&booking.booking_reference).await.unwrap();
    assert_eq!(listed, vec![moved]);

    let err = fx.baggage.track_baggage("PA99999999").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    let err = fx
        .baggage
        .update_baggage_status("PA99999999", BaggageStatus::Lost, "Unknown")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    // Empty forms tag nothing.
    let none = fx
        .baggage
        .add_baggage(&booking.booking_reference, &[bag(None, None)])
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_documented_gaps_are_preserved() {
    let fx = fixture(10).await;
    let first = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, None)
        .await
        .unwrap();
    let second = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Lovelace"), 1, None)
        .await
        .unwrap();

    // Two bookings can hold the same seat.
    let a = fx.bookings.check_in(&first.booking_reference, "7C").await.unwrap();
    let b = fx.bookings.check_in(&second.booking_reference, "7C").await.unwrap();
    assert_eq!(a.seat_number, b.seat_number);

    // Checked-in bookings keep their seats reserved.
    assert_eq!(economy_left(&fx).await, 8);
}

#[tokio::test]
async fn test_user_bookings_newest_first() {
    let fx = fixture(10).await;
    let user = fx
        .directory
        .register_user(Registration {
            email: "Grace@Example.com".to_string(),
            password: "hunter22".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            phone: None,
        })
        .await
        .unwrap();

    let older = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 1, Some(user.user_id))
        .await
        .unwrap();
    let newer = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 2, Some(user.user_id))
        .await
        .unwrap();
    fx.bookings
        .create_booking(fx.flight.flight_id, contact("Guest"), 1, None)
        .await
        .unwrap();

    let mine = fx.bookings.user_bookings(user.user_id).await.unwrap();
    let references: Vec<_> = mine.iter().map(|b| b.booking_reference.as_str()).collect();
    assert_eq!(references, vec![newer.booking_reference.as_str(), older.booking_reference.as_str()]);
}

#[tokio::test]
async fn test_registration_and_login() {
    let fx = fixture(10).await;
    let registration = Registration {
        email: "Ada@Example.com ".to_string(),
        password: "analytical".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        phone: Some("".to_string()),
    };

    let user = fx.directory.register_user(registration.clone()).await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert!(user.phone.is_none());
    assert_ne!(user.password_hash, "analytical");

    let err = fx.directory.register_user(registration).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let logged_in = fx.directory.authenticate("ADA@example.com", "analytical").await.unwrap();
    assert_eq!(logged_in.user_id, user.user_id);

    let err = fx.directory.authenticate("ada@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidCredentials));
    let err = fx.directory.authenticate("nobody@example.com", "analytical").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidCredentials));
}

#[tokio::test]
async fn test_scheduling_rejects_overbooked_aircraft() {
    let fx = fixture(10).await;
    let departure = departure_day().and_hms_opt(12, 0, 0).unwrap();
    let mut flight = NewFlight {
        flight_number: "PA418".to_string(),
        origin_airport: "LAX".to_string(),
        destination_airport: "JFK".to_string(),
        aircraft_id: fx.flight.aircraft_id,
        scheduled_departure: departure,
        scheduled_arrival: departure + Duration::hours(5),
        status: FLIGHT_STATUS_SCHEDULED.to_string(),
        gate: None,
        fares: fx.flight.fares,
        availability: SeatInventory { economy: 151, business: 0, first: 0 },
    };

    let err = fx.directory.schedule_flight(flight.clone()).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailure(_)));

    flight.availability.economy = 150;
    flight.destination_airport = "ORD".to_string();
    let err = fx.directory.schedule_flight(flight).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailure(_)));
}

#[tokio::test]
async fn test_aircraft_seat_total_must_fit() {
    let fx = fixture(10).await;
    let err = fx
        .directory
        .add_aircraft(NewAircraft {
            registration: "N999PA".to_string(),
            model: "Oversized".to_string(),
            economy_seats: i32::MAX,
            business_seats: 1,
            first_class_seats: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailure(_)));
    assert_eq!(fx.directory.list_aircraft().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_health_tracks_table_contents() {
    let empty = Arc::new(InMemoryRepository::new());
    let monitor = HealthMonitor::new(empty);
    let report = monitor.overall_health().await;
    assert_eq!(report.overall_status, OverallStatus::Degraded);
    let search = &report.services["flight_search"];
    assert_eq!(search.status, ServiceStatus::Down);
    assert_eq!(search.error.as_deref(), Some("No flights available"));
    assert_eq!(report.services["database"].status, ServiceStatus::Up);
    assert_eq!(monitor.database_status().await, "connected");

    let fx = fixture(10).await;
    let monitor = HealthMonitor::new(fx.repo.clone());
    let user = fx
        .directory
        .register_user(Registration {
            email: "ops@example.com".to_string(),
            password: "secret".to_string(),
            first_name: "Ops".to_string(),
            last_name: "Team".to_string(),
            phone: None,
        })
        .await
        .unwrap();
    let checked = fx
        .bookings
        .create_booking(fx.flight.flight_id, contact("Hopper"), 2, Some(user.user_id))
        .await
        .unwrap();
    fx.bookings
        .create_booking(fx.flight.flight_id, contact("Lovelace"), 1, None)
        .await
        .unwrap();
    fx.baggage
        .check_in_with_baggage(&checked.booking_reference, "3A", &[bag(Some(12.0), None)])
        .await
        .unwrap();

    let services = monitor.list_entity_health().await;
    assert_eq!(services.len(), 6);
    assert!(services.values().all(|s| s.status == ServiceStatus::Up));
    assert_eq!(monitor.overall_health().await.overall_status, OverallStatus::Up);

    let single = monitor.service_health("baggage_tracking").await.unwrap();
    assert_eq!(single.status, ServiceStatus::Up);
    assert!(matches!(
        monitor.service_health("payments").await.unwrap_err(),
        CoreError::NotFound(_)
    ));

    let metrics = monitor.business_metrics().await.unwrap();
    assert_eq!(metrics.total_bookings, 2);
    assert_eq!(metrics.total_checkins, 1);
    assert_eq!(metrics.pending_checkins, 1);
    assert_eq!(metrics.total_users, 1);
    assert_eq!(metrics.total_baggage, 1);
    assert_eq!(metrics.total_flights, 1);
    assert_eq!(metrics.total_revenue_cents, 3 * 19_950);
}
