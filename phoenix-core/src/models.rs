use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::inventory::{Cabin, SeatInventory};
use crate::masked::Masked;

// ============================================================================
// Reference data
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Airport {
    pub airport_code: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Aircraft {
    pub aircraft_id: i64,
    pub registration: String,
    pub model: String,
    pub total_seats: i32,
    pub economy_seats: i32,
    pub business_seats: i32,
    pub first_class_seats: i32,
}

impl Aircraft {
    /// Seat capacity per cabin, the upper bound for a new flight's availability.
    pub fn capacity(&self) -> SeatInventory {
        SeatInventory {
            economy: self.economy_seats,
            business: self.business_seats,
            first: self.first_class_seats,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewAircraft {
    pub registration: String,
    pub model: String,
    pub economy_seats: i32,
    pub business_seats: i32,
    pub first_class_seats: i32,
}

impl NewAircraft {
    /// Sum of all cabins, `None` if it does not fit in an `i32`.
    pub fn total_seats(&self) -> Option<i32> {
        self.economy_seats
            .checked_add(self.business_seats)?
            .checked_add(self.first_class_seats)
    }
}

// ============================================================================
// Flights
// ============================================================================

/// Per-cabin fare in minor currency units (cents).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CabinFares {
    pub price_economy_cents: i64,
    pub price_business_cents: i64,
    pub price_first_cents: i64,
}

impl CabinFares {
    pub fn price_cents(&self, cabin: Cabin) -> i64 {
        match cabin {
            Cabin::Economy => self.price_economy_cents,
            Cabin::Business => self.price_business_cents,
            Cabin::First => self.price_first_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flight {
    pub flight_id: i64,
    pub flight_number: String,
    pub origin_airport: String,
    pub destination_airport: String,
    pub aircraft_id: i64,
    pub scheduled_departure: NaiveDateTime,
    pub scheduled_arrival: NaiveDateTime,
    pub status: String,
    pub gate: Option<String>,
    #[serde(flatten)]
    pub fares: CabinFares,
    #[serde(flatten)]
    pub availability: SeatInventory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewFlight {
    pub flight_number: String,
    pub origin_airport: String,
    pub destination_airport: String,
    pub aircraft_id: i64,
    pub scheduled_departure: NaiveDateTime,
    pub scheduled_arrival: NaiveDateTime,
    pub status: String,
    pub gate: Option<String>,
    #[serde(flatten)]
    pub fares: CabinFares,
    #[serde(flatten)]
    pub availability: SeatInventory,
}

pub const FLIGHT_STATUS_SCHEDULED: &str = "scheduled";

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Created,
    Confirmed,
    CheckedIn,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Created => "created",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(BookingStatus::Created),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "checked_in" => Ok(BookingStatus::CheckedIn),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

/// Customer contact captured on the passenger details form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub booking_id: i64,
    pub booking_reference: String,
    #[serde(flatten)]
    pub contact: Contact,
    pub user_id: Option<i64>,
    pub flight_id: i64,
    pub num_passengers: i32,
    pub total_price_cents: i64,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub checked_in: bool,
    pub seat_number: Option<String>,
}

/// A booking ready to be persisted together with its seat reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub booking_reference: String,
    pub contact: Contact,
    pub user_id: Option<i64>,
    pub flight_id: i64,
    pub num_passengers: i32,
    pub total_price_cents: i64,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
}

// ============================================================================
// Baggage
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaggageStatus {
    CheckedIn,
    Loaded,
    InTransit,
    Arrived,
    Claimed,
    Delayed,
    Lost,
}

impl BaggageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaggageStatus::CheckedIn => "checked_in",
            BaggageStatus::Loaded => "loaded",
            BaggageStatus::InTransit => "in_transit",
            BaggageStatus::Arrived => "arrived",
            BaggageStatus::Claimed => "claimed",
            BaggageStatus::Delayed => "delayed",
            BaggageStatus::Lost => "lost",
        }
    }
}

impl fmt::Display for BaggageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaggageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checked_in" => Ok(BaggageStatus::CheckedIn),
            "loaded" => Ok(BaggageStatus::Loaded),
            "in_transit" => Ok(BaggageStatus::InTransit),
            "arrived" => Ok(BaggageStatus::Arrived),
            "claimed" => Ok(BaggageStatus::Claimed),
            "delayed" => Ok(BaggageStatus::Delayed),
            "lost" => Ok(BaggageStatus::Lost),
            other => Err(format!("unknown baggage status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Baggage {
    pub baggage_id: i64,
    pub tag: String,
    pub booking_id: i64,
    pub weight_kg: f64,
    pub description: String,
    pub status: BaggageStatus,
    pub location: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBaggage {
    pub tag: String,
    pub weight_kg: f64,
    pub description: String,
    pub status: BaggageStatus,
    pub location: String,
    pub last_updated: DateTime<Utc>,
}

/// One line of the baggage form. A missing weight means the line was left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BaggageItem {
    pub weight_kg: Option<f64>,
    pub description: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Row counts backing the business metrics endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessCounts {
    pub total_bookings: i64,
    pub total_checkins: i64,
    pub total_users: i64,
    pub total_baggage: i64,
    pub total_flights: i64,
    pub total_revenue_cents: i64,
}
