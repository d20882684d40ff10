use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::inventory::Cabin;
use crate::models::{
    Aircraft, Airport, Baggage, BaggageStatus, Booking, BusinessCounts, Flight, NewAircraft,
    NewBaggage, NewBooking, NewFlight, NewUser, User,
};

/// Failures surfaced by a repository implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Flight not found: {0}")]
    FlightNotFound(i64),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Insufficient {cabin} inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        cabin: Cabin,
        requested: i32,
        available: i32,
    },

    #[error("Booking reference already issued: {0}")]
    DuplicateReference(String),

    #[error("Baggage tag already issued: {0}")]
    DuplicateTag(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Rejected by store: {0}")]
    Invalid(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// "Can I read one row from table X" checks used by the health endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Ping,
    Flights,
    ScheduledFlights,
    Bookings,
    UncheckedBookings,
    Baggage,
    Users,
}

/// Result of a check-in unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRecord {
    pub booking: Booking,
    pub baggage: Vec<Baggage>,
    /// False when the booking was already checked in and left untouched.
    pub newly_checked_in: bool,
}

/// Transactional CRUD over airports, aircraft, flights, bookings, baggage and users.
///
/// Every method is one unit of work. Methods that change more than one row
/// (`create_booking`, `check_in`, `add_baggage`) must commit all or nothing.
#[async_trait]
pub trait AirlineRepository: Send + Sync {
    async fn list_airports(&self) -> StoreResult<Vec<Airport>>;

    async fn get_airport(&self, code: &str) -> StoreResult<Option<Airport>>;

    async fn insert_airport(&self, airport: &Airport) -> StoreResult<()>;

    async fn list_aircraft(&self) -> StoreResult<Vec<Aircraft>>;

    async fn get_aircraft(&self, aircraft_id: i64) -> StoreResult<Option<Aircraft>>;

    async fn insert_aircraft(&self, aircraft: &NewAircraft) -> StoreResult<Aircraft>;

    async fn insert_flight(&self, flight: &NewFlight) -> StoreResult<Flight>;

    async fn get_flight(&self, flight_id: i64) -> StoreResult<Option<Flight>>;

    /// Flights on a route departing on `date`, ordered by departure.
    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Flight>>;

    /// Reserve `booking.num_passengers` seats in `cabin` and insert the booking,
    /// atomically. Fails with `InsufficientInventory` without touching anything
    /// when the cabin cannot cover the request, and with `DuplicateReference`
    /// when the reference is taken.
    async fn create_booking(&self, booking: &NewBooking, cabin: Cabin) -> StoreResult<Booking>;

    async fn booking_by_reference(&self, reference: &str) -> StoreResult<Option<Booking>>;

    /// Newest first.
    async fn bookings_for_user(&self, user_id: i64) -> StoreResult<Vec<Booking>>;

    /// Mark the booking checked in with `seat_number` and insert `bags`, atomically.
    /// An already checked-in booking is returned as stored and `bags` are ignored.
    async fn check_in(
        &self,
        reference: &str,
        seat_number: &str,
        bags: &[NewBaggage],
    ) -> StoreResult<CheckInRecord>;

    /// Insert all `bags` for the booking or none of them.
    async fn add_baggage(&self, reference: &str, bags: &[NewBaggage]) -> StoreResult<Vec<Baggage>>;

    async fn baggage_by_tag(&self, tag: &str) -> StoreResult<Option<Baggage>>;

    async fn baggage_for_booking(&self, booking_id: i64) -> StoreResult<Vec<Baggage>>;

    async fn update_baggage(
        &self,
        tag: &str,
        status: BaggageStatus,
        location: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Baggage>>;

    async fn insert_user(&self, user: &NewUser) -> StoreResult<User>;

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Number of rows read by the probe (at most one for table probes).
    async fn probe(&self, probe: Probe) -> StoreResult<u64>;

    async fn business_counts(&self) -> StoreResult<BusinessCounts>;
}
