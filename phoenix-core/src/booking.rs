use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::codes::{normalize_reference, CodeGenerator};
use crate::inventory::Cabin;
use crate::models::{Booking, BookingStatus, Contact, Flight, NewBooking};
use crate::repository::{AirlineRepository, StoreError};
use crate::search::FlightSearchRequest;
use crate::{CoreError, CoreResult};

/// Bounds on the regenerate-on-collision loops for references and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSettings {
    pub reference_attempts: u32,
    pub tag_attempts: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            reference_attempts: 8,
            tag_attempts: 8,
        }
    }
}

/// Booking lifecycle: `confirmed` on creation, `checked_in` after check-in.
///
/// Only economy is sold. Seats taken by a booking are never given back.
#[derive(Clone)]
pub struct BookingService {
    repo: Arc<dyn AirlineRepository>,
    codes: Arc<dyn CodeGenerator>,
    settings: BookingSettings,
}

impl BookingService {
    pub fn new(
        repo: Arc<dyn AirlineRepository>,
        codes: Arc<dyn CodeGenerator>,
        settings: BookingSettings,
    ) -> Self {
        Self { repo, codes, settings }
    }

    pub async fn search_flights(&self, req: &FlightSearchRequest) -> CoreResult<Vec<Flight>> {
        let req = req.normalized()?;
        let flights = self
            .repo
            .search_flights(&req.origin_airport_code, &req.destination_airport_code, req.date)
            .await?;
        Ok(flights)
    }

    pub async fn get_flight(&self, flight_id: i64) -> CoreResult<Flight> {
        self.repo
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Flight {}", flight_id)))
    }

    /// Reserve economy seats and record a confirmed booking.
    ///
    /// `user_id` is the caller's identity; `None` makes a guest booking.
    pub async fn create_booking(
        &self,
        flight_id: i64,
        contact: Contact,
        passenger_count: i32,
        user_id: Option<i64>,
    ) -> CoreResult<Booking> {
        let contact = validate_contact(contact)?;
        if passenger_count < 1 {
            return Err(CoreError::ValidationFailure(
                "at least one passenger is required".to_string(),
            ));
        }

        let flight = self.get_flight(flight_id).await?;
        let total_price_cents = flight
            .fares
            .price_cents(Cabin::Economy)
            .checked_mul(i64::from(passenger_count))
            .ok_or_else(|| CoreError::ValidationFailure("booking total overflows".to_string()))?;

        for attempt in 1..=self.settings.reference_attempts {
            let new_booking = NewBooking {
                booking_reference: self.codes.booking_reference(),
                contact: contact.clone(),
                user_id,
                flight_id,
                num_passengers: passenger_count,
                total_price_cents,
                booking_date: Utc::now(),
                status: BookingStatus::Confirmed,
            };

            match self.repo.create_booking(&new_booking, Cabin::Economy).await {
                Ok(booking) => {
                    info!(
                        reference = %booking.booking_reference,
                        flight_id,
                        passengers = passenger_count,
                        total_cents = total_price_cents,
                        "Booking confirmed"
                    );
                    return Ok(booking);
                }
                Err(StoreError::DuplicateReference(reference)) => {
                    warn!(%reference, attempt, "Booking reference collision, regenerating");
                }
                Err(StoreError::InsufficientInventory { cabin, requested, available }) => {
                    info!(flight_id, requested, available, "Booking rejected: not enough seats");
                    return Err(CoreError::InsufficientInventory { cabin, requested, available });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::Storage(format!(
            "no unique booking reference after {} attempts",
            self.settings.reference_attempts
        )))
    }

    /// Exact match on reference (case-insensitive) and last name.
    pub async fn find_booking(&self, reference: &str, last_name: &str) -> CoreResult<Booking> {
        let reference = normalize_reference(reference);
        let not_found = || CoreError::NotFound(format!("Booking {}", reference));

        let booking = self
            .repo
            .booking_by_reference(&reference)
            .await?
            .ok_or_else(not_found)?;

        if booking.contact.last_name != last_name {
            return Err(not_found());
        }
        Ok(booking)
    }

    /// Mark the booking checked in and store the seat.
    ///
    /// Repeating a check-in returns the stored state unchanged, even when a
    /// different seat is passed. Seats are not checked for conflicts: two
    /// bookings may hold the same seat number.
    pub async fn check_in(&self, reference: &str, seat_number: &str) -> CoreResult<Booking> {
        let reference = normalize_reference(reference);
        let seat_number = require_seat(seat_number)?;

        let record = self.repo.check_in(&reference, &seat_number, &[]).await?;
        if record.newly_checked_in {
            info!(%reference, seat = %seat_number, "Passenger checked in");
        }
        Ok(record.booking)
    }

    /// Bookings owned by `user_id`, newest first.
    pub async fn user_bookings(&self, user_id: i64) -> CoreResult<Vec<Booking>> {
        Ok(self.repo.bookings_for_user(user_id).await?)
    }
}

fn validate_contact(contact: Contact) -> CoreResult<Contact> {
    let first_name = contact.first_name.trim().to_string();
    let last_name = contact.last_name.trim().to_string();
    let email = contact.email.expose().trim().to_string();

    for (field, value) in [("first_name", &first_name), ("last_name", &last_name), ("email", &email)] {
        if value.is_empty() {
            return Err(CoreError::ValidationFailure(format!("{} is required", field)));
        }
    }

    Ok(Contact {
        first_name,
        last_name,
        email: email.into(),
        phone: contact
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    })
}

pub(crate) fn require_seat(seat_number: &str) -> CoreResult<String> {
    let seat = seat_number.trim().to_ascii_uppercase();
    if seat.is_empty() {
        return Err(CoreError::ValidationFailure("seat_number is required".to_string()));
    }
    Ok(seat)
}
