use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use phoenix_core::inventory::{Cabin, SeatInventory};
use phoenix_core::models::{
    Aircraft, Airport, Baggage, BaggageStatus, Booking, BookingStatus, BusinessCounts, CabinFares,
    Contact, Flight, NewAircraft, NewBaggage, NewBooking, NewFlight, NewUser, User,
};
use phoenix_core::repository::{AirlineRepository, CheckInRecord, Probe, StoreError, StoreResult};
use phoenix_core::Masked;
use sqlx::{PgPool, Postgres, Transaction};

const FLIGHT_COLUMNS: &str = "flight_id, flight_number, origin_airport, destination_airport, aircraft_id, \
     scheduled_departure, scheduled_arrival, status, gate, \
     price_economy_cents, price_business_cents, price_first_cents, \
     available_economy, available_business, available_first";

const BOOKING_COLUMNS: &str = "booking_id, booking_reference, customer_email, customer_first_name, \
     customer_last_name, customer_phone, user_id, flight_id, num_passengers, total_price_cents, \
     booking_date, status, checked_in, seat_number";

const BAGGAGE_COLUMNS: &str =
    "baggage_id, tag, booking_id, weight_kg, description, status, location, last_updated";

const USER_COLUMNS: &str =
    "user_id, email, first_name, last_name, phone, password_hash, created_at";

const AIRCRAFT_COLUMNS: &str =
    "aircraft_id, registration, model, total_seats, economy_seats, business_seats, first_class_seats";

pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct AirportRow {
    airport_code: String,
    name: String,
    city: String,
    country: String,
    timezone: String,
}

#[derive(sqlx::FromRow)]
struct AircraftRow {
    aircraft_id: i64,
    registration: String,
    model: String,
    total_seats: i32,
    economy_seats: i32,
    business_seats: i32,
    first_class_seats: i32,
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    flight_id: i64,
    flight_number: String,
    origin_airport: String,
    destination_airport: String,
    aircraft_id: i64,
    scheduled_departure: NaiveDateTime,
    scheduled_arrival: NaiveDateTime,
    status: String,
    gate: Option<String>,
    price_economy_cents: i64,
    price_business_cents: i64,
    price_first_cents: i64,
    available_economy: i32,
    available_business: i32,
    available_first: i32,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: i64,
    booking_reference: String,
    customer_email: String,
    customer_first_name: String,
    customer_last_name: String,
    customer_phone: Option<String>,
    user_id: Option<i64>,
    flight_id: i64,
    num_passengers: i32,
    total_price_cents: i64,
    booking_date: DateTime<Utc>,
    status: String,
    checked_in: bool,
    seat_number: Option<String>,
}

#[derive(sqlx::FromRow)]
struct BaggageRow {
    baggage_id: i64,
    tag: String,
    booking_id: i64,
    weight_kg: f64,
    description: String,
    status: String,
    location: String,
    last_updated: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Airport {
            airport_code: row.airport_code,
            name: row.name,
            city: row.city,
            country: row.country,
            timezone: row.timezone,
        }
    }
}

impl From<AircraftRow> for Aircraft {
    fn from(row: AircraftRow) -> Self {
        Aircraft {
            aircraft_id: row.aircraft_id,
            registration: row.registration,
            model: row.model,
            total_seats: row.total_seats,
            economy_seats: row.economy_seats,
            business_seats: row.business_seats,
            first_class_seats: row.first_class_seats,
        }
    }
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            flight_id: row.flight_id,
            flight_number: row.flight_number,
            origin_airport: row.origin_airport,
            destination_airport: row.destination_airport,
            aircraft_id: row.aircraft_id,
            scheduled_departure: row.scheduled_departure,
            scheduled_arrival: row.scheduled_arrival,
            status: row.status,
            gate: row.gate,
            fares: CabinFares {
                price_economy_cents: row.price_economy_cents,
                price_business_cents: row.price_business_cents,
                price_first_cents: row.price_first_cents,
            },
            availability: SeatInventory {
                economy: row.available_economy,
                business: row.available_business,
                first: row.available_first,
            },
        }
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<BookingStatus>().map_err(StoreError::Backend)?;
        Ok(Booking {
            booking_id: row.booking_id,
            booking_reference: row.booking_reference,
            contact: Contact {
                first_name: row.customer_first_name,
                last_name: row.customer_last_name,
                email: Masked(row.customer_email),
                phone: row.customer_phone,
            },
            user_id: row.user_id,
            flight_id: row.flight_id,
            num_passengers: row.num_passengers,
            total_price_cents: row.total_price_cents,
            booking_date: row.booking_date,
            status,
            checked_in: row.checked_in,
            seat_number: row.seat_number,
        })
    }
}

impl TryFrom<BaggageRow> for Baggage {
    type Error = StoreError;

    fn try_from(row: BaggageRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<BaggageStatus>().map_err(StoreError::Backend)?;
        Ok(Baggage {
            baggage_id: row.baggage_id,
            tag: row.tag,
            booking_id: row.booking_id,
            weight_kg: row.weight_kg,
            description: row.description,
            status,
            location: row.location,
            last_updated: row.last_updated,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Name of the unique constraint a statement tripped over, if any.
fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn availability_column(cabin: Cabin) -> &'static str {
    match cabin {
        Cabin::Economy => "available_economy",
        Cabin::Business => "available_business",
        Cabin::First => "available_first",
    }
}

fn rows_into<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

async fn insert_bags(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: i64,
    bags: &[NewBaggage],
) -> StoreResult<Vec<Baggage>> {
    let sql = format!(
        "INSERT INTO baggage (tag, booking_id, weight_kg, description, status, location, last_updated) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
        BAGGAGE_COLUMNS
    );

    let mut stored = Vec::with_capacity(bags.len());
    for bag in bags {
        let row: BaggageRow = sqlx::query_as(&sql)
            .bind(&bag.tag)
            .bind(booking_id)
            .bind(bag.weight_kg)
            .bind(&bag.description)
            .bind(bag.status.as_str())
            .bind(&bag.location)
            .bind(bag.last_updated)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some("baggage_tag_key") => StoreError::DuplicateTag(bag.tag.clone()),
                _ => backend(e),
            })?;
        stored.push(Baggage::try_from(row)?);
    }
    Ok(stored)
}

#[async_trait]
impl AirlineRepository for PostgresRepository {
    async fn list_airports(&self) -> StoreResult<Vec<Airport>> {
        let rows: Vec<AirportRow> = sqlx::query_as(
            "SELECT airport_code, name, city, country, timezone FROM airports ORDER BY airport_code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Airport::from).collect())
    }

    async fn get_airport(&self, code: &str) -> StoreResult<Option<Airport>> {
        let row: Option<AirportRow> = sqlx::query_as(
            "SELECT airport_code, name, city, country, timezone FROM airports WHERE airport_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(Airport::from))
    }

    async fn insert_airport(&self, airport: &Airport) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO airports (airport_code, name, city, country, timezone)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (airport_code) DO UPDATE
            SET name = EXCLUDED.name, city = EXCLUDED.city,
                country = EXCLUDED.country, timezone = EXCLUDED.timezone
            "#,
        )
        .bind(&airport.airport_code)
        .bind(&airport.name)
        .bind(&airport.city)
        .bind(&airport.country)
        .bind(&airport.timezone)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn list_aircraft(&self) -> StoreResult<Vec<Aircraft>> {
        let rows: Vec<AircraftRow> = sqlx::query_as(&format!(
            "SELECT {} FROM aircraft ORDER BY aircraft_id",
            AIRCRAFT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Aircraft::from).collect())
    }

    async fn get_aircraft(&self, aircraft_id: i64) -> StoreResult<Option<Aircraft>> {
        let row: Option<AircraftRow> = sqlx::query_as(&format!(
            "SELECT {} FROM aircraft WHERE aircraft_id = $1",
            AIRCRAFT_COLUMNS
        ))
        .bind(aircraft_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(Aircraft::from))
    }

    async fn insert_aircraft(&self, aircraft: &NewAircraft) -> StoreResult<Aircraft> {
        let total = aircraft
            .total_seats()
            .ok_or_else(|| StoreError::Invalid("total seat count is too large".to_string()))?;
        let row: AircraftRow = sqlx::query_as(&format!(
            "INSERT INTO aircraft (registration, model, total_seats, economy_seats, business_seats, first_class_seats) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            AIRCRAFT_COLUMNS
        ))
        .bind(&aircraft.registration)
        .bind(&aircraft.model)
        .bind(total)
        .bind(aircraft.economy_seats)
        .bind(aircraft.business_seats)
        .bind(aircraft.first_class_seats)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => StoreError::Invalid(format!(
                "aircraft {} already registered",
                aircraft.registration
            )),
            None => backend(e),
        })?;
        Ok(row.into())
    }

    async fn insert_flight(&self, flight: &NewFlight) -> StoreResult<Flight> {
        let row: FlightRow = sqlx::query_as(&format!(
            "INSERT INTO flights (flight_number, origin_airport, destination_airport, aircraft_id, \
             scheduled_departure, scheduled_arrival, status, gate, \
             price_economy_cents, price_business_cents, price_first_cents, \
             available_economy, available_business, available_first) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING {}",
            FLIGHT_COLUMNS
        ))
        .bind(&flight.flight_number)
        .bind(&flight.origin_airport)
        .bind(&flight.destination_airport)
        .bind(flight.aircraft_id)
        .bind(flight.scheduled_departure)
        .bind(flight.scheduled_arrival)
        .bind(&flight.status)
        .bind(&flight.gate)
        .bind(flight.fares.price_economy_cents)
        .bind(flight.fares.price_business_cents)
        .bind(flight.fares.price_first_cents)
        .bind(flight.availability.economy)
        .bind(flight.availability.business)
        .bind(flight.availability.first)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::Invalid("flight references an unknown airport or aircraft".to_string())
            } else {
                backend(e)
            }
        })?;
        Ok(row.into())
    }

    async fn get_flight(&self, flight_id: i64) -> StoreResult<Option<Flight>> {
        let row: Option<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights WHERE flight_id = $1",
            FLIGHT_COLUMNS
        ))
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(Flight::from))
    }

    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Flight>> {
        let rows: Vec<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights \
             WHERE origin_airport = $1 AND destination_airport = $2 \
             AND DATE(scheduled_departure) = $3 \
             ORDER BY scheduled_departure",
            FLIGHT_COLUMNS
        ))
        .bind(origin)
        .bind(destination)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn create_booking(&self, booking: &NewBooking, cabin: Cabin) -> StoreResult<Booking> {
        if booking.num_passengers <= 0 {
            return Err(StoreError::Invalid(format!(
                "seat quantity must be positive, got {}",
                booking.num_passengers
            )));
        }

        let column = availability_column(cabin);
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Check and decrement in one statement; the row lock serializes competing bookings.
        let reserved: Option<(i32,)> = sqlx::query_as(&format!(
            "UPDATE flights SET {col} = {col} - $1 WHERE flight_id = $2 AND {col} >= $1 RETURNING {col}",
            col = column
        ))
        .bind(booking.num_passengers)
        .bind(booking.flight_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        if reserved.is_none() {
            let current: Option<(i32,)> = sqlx::query_as(&format!(
                "SELECT {} FROM flights WHERE flight_id = $1",
                column
            ))
            .bind(booking.flight_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;

            return Err(match current {
                None => StoreError::FlightNotFound(booking.flight_id),
                Some((available,)) => StoreError::InsufficientInventory {
                    cabin,
                    requested: booking.num_passengers,
                    available,
                },
            });
        }

        let row: BookingRow = sqlx::query_as(&format!(
            "INSERT INTO bookings (booking_reference, customer_email, customer_first_name, \
             customer_last_name, customer_phone, user_id, flight_id, num_passengers, \
             total_price_cents, booking_date, status, checked_in) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE) RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(&booking.booking_reference)
        .bind(booking.contact.email.expose())
        .bind(&booking.contact.first_name)
        .bind(&booking.contact.last_name)
        .bind(&booking.contact.phone)
        .bind(booking.user_id)
        .bind(booking.flight_id)
        .bind(booking.num_passengers)
        .bind(booking.total_price_cents)
        .bind(booking.booking_date)
        .bind(booking.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("bookings_booking_reference_key") => {
                StoreError::DuplicateReference(booking.booking_reference.clone())
            }
            _ if is_foreign_key_violation(&e) => {
                StoreError::Invalid("booking references an unknown user".to_string())
            }
            _ => backend(e),
        })?;

        tx.commit().await.map_err(backend)?;
        Booking::try_from(row)
    }

    async fn booking_by_reference(&self, reference: &str) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE booking_reference = $1",
            BOOKING_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(Booking::try_from).transpose()
    }

    async fn bookings_for_user(&self, user_id: i64) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC, booking_id DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows_into(rows)
    }

    async fn check_in(
        &self,
        reference: &str,
        seat_number: &str,
        bags: &[NewBaggage],
    ) -> StoreResult<CheckInRecord> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let current: BookingRow = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE booking_reference = $1 FOR UPDATE",
            BOOKING_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::BookingNotFound(reference.to_string()))?;

        if current.checked_in {
            return Ok(CheckInRecord {
                booking: Booking::try_from(current)?,
                baggage: Vec::new(),
                newly_checked_in: false,
            });
        }

        let updated: BookingRow = sqlx::query_as(&format!(
            "UPDATE bookings SET checked_in = TRUE, status = $1, seat_number = $2 \
             WHERE booking_id = $3 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(BookingStatus::CheckedIn.as_str())
        .bind(seat_number)
        .bind(current.booking_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        let baggage = insert_bags(&mut tx, updated.booking_id, bags).await?;
        tx.commit().await.map_err(backend)?;

        Ok(CheckInRecord {
            booking: Booking::try_from(updated)?,
            baggage,
            newly_checked_in: true,
        })
    }

    async fn add_baggage(&self, reference: &str, bags: &[NewBaggage]) -> StoreResult<Vec<Baggage>> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let (booking_id,): (i64,) =
            sqlx::query_as("SELECT booking_id FROM bookings WHERE booking_reference = $1")
                .bind(reference)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?
                .ok_or_else(|| StoreError::BookingNotFound(reference.to_string()))?;

        let stored = insert_bags(&mut tx, booking_id, bags).await?;
        tx.commit().await.map_err(backend)?;
        Ok(stored)
    }

    async fn baggage_by_tag(&self, tag: &str) -> StoreResult<Option<Baggage>> {
        let row: Option<BaggageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM baggage WHERE tag = $1",
            BAGGAGE_COLUMNS
        ))
        .bind(tag)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(Baggage::try_from).transpose()
    }

    async fn baggage_for_booking(&self, booking_id: i64) -> StoreResult<Vec<Baggage>> {
        let rows: Vec<BaggageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM baggage WHERE booking_id = $1 ORDER BY baggage_id",
            BAGGAGE_COLUMNS
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows_into(rows)
    }

    async fn update_baggage(
        &self,
        tag: &str,
        status: BaggageStatus,
        location: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Baggage>> {
        let row: Option<BaggageRow> = sqlx::query_as(&format!(
            "UPDATE baggage SET status = $1, location = $2, last_updated = $3 WHERE tag = $4 RETURNING {}",
            BAGGAGE_COLUMNS
        ))
        .bind(status.as_str())
        .bind(location)
        .bind(updated_at)
        .bind(tag)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(Baggage::try_from).transpose()
    }

    async fn insert_user(&self, user: &NewUser) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (email, first_name, last_name, phone, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("users_email_key") => StoreError::DuplicateEmail(user.email.clone()),
            _ => backend(e),
        })?;
        Ok(row.into())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(User::from))
    }

    async fn probe(&self, probe: Probe) -> StoreResult<u64> {
        let sql = match probe {
            Probe::Ping => "SELECT 1",
            Probe::Flights => "SELECT flight_id FROM flights LIMIT 1",
            Probe::ScheduledFlights => "SELECT flight_id FROM flights WHERE status = 'scheduled' LIMIT 1",
            Probe::Bookings => "SELECT booking_id FROM bookings LIMIT 1",
            Probe::UncheckedBookings => "SELECT booking_id FROM bookings WHERE checked_in = FALSE LIMIT 1",
            Probe::Baggage => "SELECT baggage_id FROM baggage LIMIT 1",
            Probe::Users => "SELECT user_id FROM users LIMIT 1",
        };

        let row = sqlx::query(sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(u64::from(row.is_some()))
    }

    async fn business_counts(&self) -> StoreResult<BusinessCounts> {
        let (total_bookings, total_checkins, total_users, total_baggage, total_flights, total_revenue_cents): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM bookings),
                (SELECT COUNT(*) FROM bookings WHERE checked_in),
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM baggage),
                (SELECT COUNT(*) FROM flights),
                (SELECT COALESCE(SUM(total_price_cents), 0)::BIGINT FROM bookings)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(BusinessCounts {
            total_bookings,
            total_checkins,
            total_users,
            total_baggage,
            total_flights,
            total_revenue_cents,
        })
    }
}
