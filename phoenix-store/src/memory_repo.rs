use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use phoenix_core::inventory::{Cabin, InventoryError};
use phoenix_core::models::{
    Aircraft, Airport, Baggage, BaggageStatus, Booking, BookingStatus, BusinessCounts, Flight,
    NewAircraft, NewBaggage, NewBooking, NewFlight, NewUser, User, FLIGHT_STATUS_SCHEDULED,
};
use phoenix_core::repository::{AirlineRepository, CheckInRecord, Probe, StoreError, StoreResult};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    airports: BTreeMap<String, Airport>,
    aircraft: BTreeMap<i64, Aircraft>,
    flights: BTreeMap<i64, Flight>,
    bookings: BTreeMap<i64, Booking>,
    baggage: BTreeMap<i64, Baggage>,
    users: BTreeMap<i64, User>,
    next_aircraft_id: i64,
    next_flight_id: i64,
    next_booking_id: i64,
    next_baggage_id: i64,
    next_user_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    fn booking_id_for(&self, reference: &str) -> Option<i64> {
        self.bookings
            .values()
            .find(|b| b.booking_reference == reference)
            .map(|b| b.booking_id)
    }

    /// Rejects tags already stored or repeated within `bags`.
    fn check_tags(&self, bags: &[NewBaggage]) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for bag in bags {
            let taken = self.baggage.values().any(|b| b.tag == bag.tag);
            if taken || !seen.insert(bag.tag.as_str()) {
                return Err(StoreError::DuplicateTag(bag.tag.clone()));
            }
        }
        Ok(())
    }

    fn insert_bags(&mut self, booking_id: i64, bags: &[NewBaggage]) -> Vec<Baggage> {
        let mut stored = Vec::with_capacity(bags.len());
        for bag in bags {
            let baggage_id = next_id(&mut self.next_baggage_id);
            let record = Baggage {
                baggage_id,
                tag: bag.tag.clone(),
                booking_id,
                weight_kg: bag.weight_kg,
                description: bag.description.clone(),
                status: bag.status,
                location: bag.location.clone(),
                last_updated: bag.last_updated,
            };
            self.baggage.insert(baggage_id, record.clone());
            stored.push(record);
        }
        stored
    }
}

/// Process-local store used for tests and for running without Postgres.
///
/// A single lock guards all tables, so every trait method is one atomic step.
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AirlineRepository for InMemoryRepository {
    async fn list_airports(&self) -> StoreResult<Vec<Airport>> {
        Ok(self.state.read().await.airports.values().cloned().collect())
    }

    async fn get_airport(&self, code: &str) -> StoreResult<Option<Airport>> {
        Ok(self.state.read().await.airports.get(code).cloned())
    }

    async fn insert_airport(&self, airport: &Airport) -> StoreResult<()> {
        self.state
            .write()
            .await
            .airports
            .insert(airport.airport_code.clone(), airport.clone());
        Ok(())
    }

    async fn list_aircraft(&self) -> StoreResult<Vec<Aircraft>> {
        Ok(self.state.read().await.aircraft.values().cloned().collect())
    }

    async fn get_aircraft(&self, aircraft_id: i64) -> StoreResult<Option<Aircraft>> {
        Ok(self.state.read().await.aircraft.get(&aircraft_id).cloned())
    }

    async fn insert_aircraft(&self, aircraft: &NewAircraft) -> StoreResult<Aircraft> {
        let mut state = self.state.write().await;
        if state
            .aircraft
            .values()
            .any(|a| a.registration == aircraft.registration)
        {
            return Err(StoreError::Invalid(format!(
                "aircraft {} already registered",
                aircraft.registration
            )));
        }

        let total_seats = aircraft
            .total_seats()
            .ok_or_else(|| StoreError::Invalid("total seat count is too large".to_string()))?;
        let aircraft_id = next_id(&mut state.next_aircraft_id);
        let record = Aircraft {
            aircraft_id,
            registration: aircraft.registration.clone(),
            model: aircraft.model.clone(),
            total_seats,
            economy_seats: aircraft.economy_seats,
            business_seats: aircraft.business_seats,
            first_class_seats: aircraft.first_class_seats,
        };
        state.aircraft.insert(aircraft_id, record.clone());
        Ok(record)
    }

    async fn insert_flight(&self, flight: &NewFlight) -> StoreResult<Flight> {
        let mut state = self.state.write().await;
        let known_airports = state.airports.contains_key(&flight.origin_airport)
            && state.airports.contains_key(&flight.destination_airport);
        if !known_airports || !state.aircraft.contains_key(&flight.aircraft_id) {
            return Err(StoreError::Invalid(
                "flight references an unknown airport or aircraft".to_string(),
            ));
        }

        let flight_id = next_id(&mut state.next_flight_id);
        let record = Flight {
            flight_id,
            flight_number: flight.flight_number.clone(),
            origin_airport: flight.origin_airport.clone(),
            destination_airport: flight.destination_airport.clone(),
            aircraft_id: flight.aircraft_id,
            scheduled_departure: flight.scheduled_departure,
            scheduled_arrival: flight.scheduled_arrival,
            status: flight.status.clone(),
            gate: flight.gate.clone(),
            fares: flight.fares,
            availability: flight.availability,
        };
        state.flights.insert(flight_id, record.clone());
        Ok(record)
    }

    async fn get_flight(&self, flight_id: i64) -> StoreResult<Option<Flight>> {
        Ok(self.state.read().await.flights.get(&flight_id).cloned())
    }

    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Flight>> {
        let state = self.state.read().await;
        let mut flights: Vec<Flight> = state
            .flights
            .values()
            .filter(|f| {
                f.origin_airport == origin
                    && f.destination_airport == destination
                    && f.scheduled_departure.date() == date
            })
            .cloned()
            .collect();
        flights.sort_by_key(|f| (f.scheduled_departure, f.flight_id));
        Ok(flights)
    }

    async fn create_booking(&self, booking: &NewBooking, cabin: Cabin) -> StoreResult<Booking> {
        let mut state = self.state.write().await;

        if state.booking_id_for(&booking.booking_reference).is_some() {
            return Err(StoreError::DuplicateReference(booking.booking_reference.clone()));
        }
        if let Some(user_id) = booking.user_id {
            if !state.users.contains_key(&user_id) {
                return Err(StoreError::Invalid("booking references an unknown user".to_string()));
            }
        }

        let flight = state
            .flights
            .get_mut(&booking.flight_id)
            .ok_or(StoreError::FlightNotFound(booking.flight_id))?;

        // Nothing has been written yet, so a failed reservation leaves the state untouched.
        flight
            .availability
            .reserve(cabin, booking.num_passengers)
            .map_err(|e| match e {
                InventoryError::InsufficientInventory {
                    cabin,
                    requested,
                    available,
                } => StoreError::InsufficientInventory {
                    cabin,
                    requested,
                    available,
                },
                InventoryError::InvalidQuantity(_) => StoreError::Invalid(e.to_string()),
            })?;

        let booking_id = next_id(&mut state.next_booking_id);
        let record = Booking {
            booking_id,
            booking_reference: booking.booking_reference.clone(),
            contact: booking.contact.clone(),
            user_id: booking.user_id,
            flight_id: booking.flight_id,
            num_passengers: booking.num_passengers,
            total_price_cents: booking.total_price_cents,
            booking_date: booking.booking_date,
            status: booking.status,
            checked_in: false,
            seat_number: None,
        };
        state.bookings.insert(booking_id, record.clone());
        Ok(record)
    }

    async fn booking_by_reference(&self, reference: &str) -> StoreResult<Option<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .find(|b| b.booking_reference == reference)
            .cloned())
    }

    async fn bookings_for_user(&self, user_id: i64) -> StoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.user_id == Some(user_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| {
            b.booking_date
                .cmp(&a.booking_date)
                .then(b.booking_id.cmp(&a.booking_id))
        });
        Ok(bookings)
    }

    async fn check_in(
        &self,
        reference: &str,
        seat_number: &str,
        bags: &[NewBaggage],
    ) -> StoreResult<CheckInRecord> {
        let mut state = self.state.write().await;
        let booking_id = state
            .booking_id_for(reference)
            .ok_or_else(|| StoreError::BookingNotFound(reference.to_string()))?;

        if let Some(existing) = state.bookings.get(&booking_id).filter(|b| b.checked_in) {
            return Ok(CheckInRecord {
                booking: existing.clone(),
                baggage: Vec::new(),
                newly_checked_in: false,
            });
        }

        state.check_tags(bags)?;

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| StoreError::BookingNotFound(reference.to_string()))?;
        booking.checked_in = true;
        booking.status = BookingStatus::CheckedIn;
        booking.seat_number = Some(seat_number.to_string());
        let booking = booking.clone();

        let baggage = state.insert_bags(booking_id, bags);
        Ok(CheckInRecord {
            booking,
            baggage,
            newly_checked_in: true,
        })
    }

    async fn add_baggage(&self, reference: &str, bags: &[NewBaggage]) -> StoreResult<Vec<Baggage>> {
        let mut state = self.state.write().await;
        let booking_id = state
            .booking_id_for(reference)
            .ok_or_else(|| StoreError::BookingNotFound(reference.to_string()))?;

        state.check_tags(bags)?;
        Ok(state.insert_bags(booking_id, bags))
    }

    async fn baggage_by_tag(&self, tag: &str) -> StoreResult<Option<Baggage>> {
        let state = self.state.read().await;
        Ok(state.baggage.values().find(|b| b.tag == tag).cloned())
    }

    async fn baggage_for_booking(&self, booking_id: i64) -> StoreResult<Vec<Baggage>> {
        let state = self.state.read().await;
        Ok(state
            .baggage
            .values()
            .filter(|b| b.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn update_baggage(
        &self,
        tag: &str,
        status: BaggageStatus,
        location: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Baggage>> {
        let mut state = self.state.write().await;
        Ok(state
            .baggage
            .values_mut()
            .find(|b| b.tag == tag)
            .map(|bag| {
                bag.status = status;
                bag.location = location.to_string();
                bag.last_updated = updated_at;
                bag.clone()
            }))
    }

    async fn insert_user(&self, user: &NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email.clone()));
        }

        let user_id = next_id(&mut state.next_user_id);
        let record = User {
            user_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        };
        state.users.insert(user_id, record.clone());
        Ok(record)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn probe(&self, probe: Probe) -> StoreResult<u64> {
        let state = self.state.read().await;
        let found = match probe {
            Probe::Ping => true,
            Probe::Flights => !state.flights.is_empty(),
            Probe::ScheduledFlights => state
                .flights
                .values()
                .any(|f| f.status == FLIGHT_STATUS_SCHEDULED),
            Probe::Bookings => !state.bookings.is_empty(),
            Probe::UncheckedBookings => state.bookings.values().any(|b| !b.checked_in),
            Probe::Baggage => !state.baggage.is_empty(),
            Probe::Users => !state.users.is_empty(),
        };
        Ok(u64::from(found))
    }

    async fn business_counts(&self) -> StoreResult<BusinessCounts> {
        let state = self.state.read().await;
        Ok(BusinessCounts {
            total_bookings: state.bookings.len() as i64,
            total_checkins: state.bookings.values().filter(|b| b.checked_in).count() as i64,
            total_users: state.users.len() as i64,
            total_baggage: state.baggage.len() as i64,
            total_flights: state.flights.len() as i64,
            total_revenue_cents: state.bookings.values().map(|b| b.total_price_cents).sum(),
        })
    }
}
