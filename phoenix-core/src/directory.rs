use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::identity::PasswordHasher;
use crate::models::{Aircraft, Airport, Flight, NewAircraft, NewFlight, NewUser, User};
use crate::repository::{AirlineRepository, StoreError};
use crate::{CoreError, CoreResult};

/// Registration form fields.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Airports, aircraft, the flight schedule and customer accounts.
#[derive(Clone)]
pub struct DirectoryService {
    repo: Arc<dyn AirlineRepository>,
    hasher: PasswordHasher,
}

impl DirectoryService {
    pub fn new(repo: Arc<dyn AirlineRepository>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    pub async fn list_airports(&self) -> CoreResult<Vec<Airport>> {
        Ok(self.repo.list_airports().await?)
    }

    pub async fn list_aircraft(&self) -> CoreResult<Vec<Aircraft>> {
        Ok(self.repo.list_aircraft().await?)
    }

    pub async fn add_airport(&self, airport: Airport) -> CoreResult<Airport> {
        let code = airport.airport_code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(CoreError::ValidationFailure(format!(
                "airport code must be three letters, got '{}'",
                airport.airport_code
            )));
        }

        let airport = Airport { airport_code: code, ..airport };
        self.repo.insert_airport(&airport).await?;
        Ok(airport)
    }

    pub async fn add_aircraft(&self, aircraft: NewAircraft) -> CoreResult<Aircraft> {
        if aircraft.registration.trim().is_empty() {
            return Err(CoreError::ValidationFailure("registration is required".to_string()));
        }
        if aircraft.economy_seats < 0 || aircraft.business_seats < 0 || aircraft.first_class_seats < 0 {
            return Err(CoreError::ValidationFailure("seat counts cannot be negative".to_string()));
        }
        if aircraft.total_seats().is_none() {
            return Err(CoreError::ValidationFailure("total seat count is too large".to_string()));
        }
        Ok(self.repo.insert_aircraft(&aircraft).await?)
    }

    /// Put a flight on the schedule. Availability may not exceed the
    /// aircraft's seats in any cabin.
    pub async fn schedule_flight(&self, flight: NewFlight) -> CoreResult<Flight> {
        if flight.origin_airport == flight.destination_airport {
            return Err(CoreError::ValidationFailure(
                "origin and destination must differ".to_string(),
            ));
        }
        if flight.scheduled_arrival <= flight.scheduled_departure {
            return Err(CoreError::ValidationFailure(
                "arrival must be after departure".to_string(),
            ));
        }
        let fares = flight.fares;
        if fares.price_economy_cents < 0 || fares.price_business_cents < 0 || fares.price_first_cents < 0 {
            return Err(CoreError::ValidationFailure("prices cannot be negative".to_string()));
        }

        for code in [&flight.origin_airport, &flight.destination_airport] {
            if self.repo.get_airport(code).await?.is_none() {
                return Err(CoreError::ValidationFailure(format!("unknown airport {}", code)));
            }
        }

        let aircraft = self
            .repo
            .get_aircraft(flight.aircraft_id)
            .await?
            .ok_or_else(|| {
                CoreError::ValidationFailure(format!("unknown aircraft {}", flight.aircraft_id))
            })?;

        if !flight.availability.fits_within(&aircraft.capacity()) {
            return Err(CoreError::ValidationFailure(format!(
                "availability exceeds capacity of aircraft {}",
                aircraft.registration
            )));
        }

        Ok(self.repo.insert_flight(&flight).await?)
    }

    pub async fn register_user(&self, registration: Registration) -> CoreResult<User> {
        let email = registration.email.trim().to_ascii_lowercase();
        if email.is_empty() || registration.password.is_empty() {
            return Err(CoreError::ValidationFailure(
                "email and password are required".to_string(),
            ));
        }

        if self.repo.user_by_email(&email).await?.is_some() {
            return Err(CoreError::Conflict("Email already registered. Please login.".to_string()));
        }

        let new_user = NewUser {
            email,
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            phone: registration.phone.filter(|p| !p.trim().is_empty()),
            password_hash: self.hasher.hash(&registration.password),
            created_at: Utc::now(),
        };

        let user = match self.repo.insert_user(&new_user).await {
            Ok(user) => user,
            Err(StoreError::DuplicateEmail(_)) => {
                return Err(CoreError::Conflict("Email already registered. Please login.".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.user_id, "User registered");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<User> {
        let email = email.trim().to_ascii_lowercase();
        let user = self
            .repo
            .user_by_email(&email)
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(CoreError::InvalidCredentials);
        }
        Ok(user)
    }
}
