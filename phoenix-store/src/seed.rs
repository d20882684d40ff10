use chrono::{Duration, NaiveDate, NaiveTime};
use phoenix_core::inventory::SeatInventory;
use phoenix_core::models::{Aircraft, Airport, CabinFares, NewAircraft, NewFlight, FLIGHT_STATUS_SCHEDULED};
use phoenix_core::{CoreResult, DirectoryService};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

const AIRPORTS: [(&str, &str, &str, &str); 5] = [
    ("JFK", "John F. Kennedy International Airport", "New York", "America/New_York"),
    ("LAX", "Los Angeles International Airport", "Los Angeles", "America/Los_Angeles"),
    ("ORD", "O'Hare International Airport", "Chicago", "America/Chicago"),
    ("ATL", "Hartsfield-Jackson Atlanta International Airport", "Atlanta", "America/New_York"),
    ("SFO", "San Francisco International Airport", "San Francisco", "America/Los_Angeles"),
];

const ROUTES: [(&str, &str); 12] = [
    ("JFK", "LAX"),
    ("LAX", "JFK"),
    ("JFK", "ORD"),
    ("ORD", "JFK"),
    ("JFK", "ATL"),
    ("ATL", "JFK"),
    ("LAX", "SFO"),
    ("SFO", "LAX"),
    ("ORD", "SFO"),
    ("SFO", "ORD"),
    ("ATL", "LAX"),
    ("LAX", "ATL"),
];

const DEPARTURE_HOURS: [u32; 8] = [6, 8, 10, 12, 14, 16, 18, 20];
const DEPARTURES_PER_ROUTE: usize = 3;

/// Fleet type with the availability ranges sampled for each new flight.
struct FleetType {
    registration: &'static str,
    model: &'static str,
    seats: SeatInventory,
    min_available: SeatInventory,
}

const FLEET: [FleetType; 2] = [
    FleetType {
        registration: "N737PA",
        model: "Boeing 737-800",
        seats: SeatInventory { economy: 150, business: 20, first: 5 },
        min_available: SeatInventory { economy: 100, business: 10, first: 2 },
    },
    FleetType {
        registration: "N320PA",
        model: "Airbus A320",
        seats: SeatInventory { economy: 156, business: 20, first: 4 },
        min_available: SeatInventory { economy: 110, business: 12, first: 1 },
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub airports: usize,
    pub aircraft: usize,
    pub flights: usize,
}

/// Load the sample airports and fleet, then schedule `days` days of flights
/// starting at `start`. Re-running reuses airports and aircraft already present.
pub async fn seed_sample_schedule<R: Rng + ?Sized>(
    directory: &DirectoryService,
    start: NaiveDate,
    days: u32,
    rng: &mut R,
) -> CoreResult<SeedReport> {
    let mut report = SeedReport::default();

    for (code, name, city, timezone) in AIRPORTS {
        directory
            .add_airport(Airport {
                airport_code: code.to_string(),
                name: name.to_string(),
                city: city.to_string(),
                country: "USA".to_string(),
                timezone: timezone.to_string(),
            })
            .await?;
        report.airports += 1;
    }

    let existing = directory.list_aircraft().await?;
    let mut fleet: Vec<(Aircraft, &FleetType)> = Vec::with_capacity(FLEET.len());
    for fleet_type in &FLEET {
        let aircraft = match existing
            .iter()
            .find(|a| a.registration == fleet_type.registration)
        {
            Some(aircraft) => aircraft.clone(),
            None => {
                report.aircraft += 1;
                directory
                    .add_aircraft(NewAircraft {
                        registration: fleet_type.registration.to_string(),
                        model: fleet_type.model.to_string(),
                        economy_seats: fleet_type.seats.economy,
                        business_seats: fleet_type.seats.business,
                        first_class_seats: fleet_type.seats.first,
                    })
                    .await?
            }
        };
        fleet.push((aircraft, fleet_type));
    }

    for day in 0..days {
        let date = start + Duration::days(i64::from(day));
        for (origin, destination) in ROUTES {
            let hours: Vec<u32> = DEPARTURE_HOURS
                .choose_multiple(rng, DEPARTURES_PER_ROUTE)
                .copied()
                .collect();
            for hour in hours {
                let Some((aircraft, fleet_type)) = fleet.choose(rng) else {
                    continue;
                };
                let flight = sample_flight(rng, date, hour, origin, destination, aircraft, fleet_type);
                directory.schedule_flight(flight).await?;
                report.flights += 1;
            }
        }
    }

    info!(
        airports = report.airports,
        aircraft = report.aircraft,
        flights = report.flights,
        "Sample schedule loaded"
    );
    Ok(report)
}

/// Routes whose airport codes start with letters far apart count as cross-country.
fn is_cross_country(origin: &str, destination: &str) -> bool {
    let first = |code: &str| code.bytes().next().map(i32::from).unwrap_or_default();
    (first(origin) - first(destination)).abs() > 10
}

fn sample_flight<R: Rng + ?Sized>(
    rng: &mut R,
    date: NaiveDate,
    hour: u32,
    origin: &str,
    destination: &str,
    aircraft: &Aircraft,
    fleet_type: &FleetType,
) -> NewFlight {
    let minute = [0, 15, 30, 45].choose(rng).copied().unwrap_or(0);
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    let departure = date.and_time(time);

    let duration = if is_cross_country(origin, destination) {
        Duration::hours(5) + Duration::minutes(rng.gen_range(0..=45))
    } else {
        Duration::hours(2) + Duration::minutes(rng.gen_range(15..=45))
    };

    let economy_cents: i64 = rng.gen_range(15_000..=45_000);
    let fares = CabinFares {
        price_economy_cents: economy_cents,
        price_business_cents: economy_cents * 5 / 2,
        price_first_cents: economy_cents * 4,
    };

    let seats = fleet_type.seats;
    let low = fleet_type.min_available;
    let availability = SeatInventory {
        economy: rng.gen_range(low.economy..=seats.economy),
        business: rng.gen_range(low.business..=seats.business),
        first: rng.gen_range(low.first..=seats.first),
    };

    let gate_letter = ['A', 'B', 'C', 'D'].choose(rng).copied().unwrap_or('A');

    NewFlight {
        flight_number: format!("PA{}", rng.gen_range(100..=999)),
        origin_airport: origin.to_string(),
        destination_airport: destination.to_string(),
        aircraft_id: aircraft.aircraft_id,
        scheduled_departure: departure,
        scheduled_arrival: departure + duration,
        status: FLIGHT_STATUS_SCHEDULED.to_string(),
        gate: Some(format!("{}{}", gate_letter, rng.gen_range(1..=30))),
        fares,
        availability,
    }
}
