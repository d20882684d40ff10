use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::booking::{require_seat, BookingSettings};
use crate::codes::{normalize_reference, CodeGenerator};
use crate::models::{Baggage, BaggageItem, BaggageStatus, Booking, NewBaggage};
use crate::repository::{AirlineRepository, CheckInRecord, StoreError};
use crate::{CoreError, CoreResult};

pub const DEFAULT_BAG_DESCRIPTION: &str = "Checked bag";

/// Where a bag is first seen: the check-in counter at the flight's origin.
pub fn check_in_location(origin_airport: &str) -> String {
    format!("{} - Check-in Counter", origin_airport)
}

/// Check-in with bags, and the baggage tracking that follows it.
#[derive(Clone)]
pub struct BaggageService {
    repo: Arc<dyn AirlineRepository>,
    codes: Arc<dyn CodeGenerator>,
    settings: BookingSettings,
}

impl BaggageService {
    pub fn new(
        repo: Arc<dyn AirlineRepository>,
        codes: Arc<dyn CodeGenerator>,
        settings: BookingSettings,
    ) -> Self {
        Self { repo, codes, settings }
    }

    /// Tag every item that has a weight. Items without one are skipped.
    pub async fn add_baggage(&self, reference: &str, items: &[BaggageItem]) -> CoreResult<Vec<Baggage>> {
        let reference = normalize_reference(reference);
        let (_, origin) = self.booking_and_origin(&reference).await?;

        for attempt in 1..=self.settings.tag_attempts {
            let bags = self.tag_items(items, &origin, Utc::now());
            if bags.is_empty() {
                return Ok(Vec::new());
            }

            match self.repo.add_baggage(&reference, &bags).await {
                Ok(stored) => {
                    info!(%reference, bags = stored.len(), "Baggage checked");
                    return Ok(stored);
                }
                Err(StoreError::DuplicateTag(tag)) => {
                    warn!(%tag, attempt, "Baggage tag collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(self.tags_exhausted())
    }

    /// Check in and tag bags as one unit. Bags are only attached on the first
    /// check-in; a repeated call returns the existing state and adds nothing.
    pub async fn check_in_with_baggage(
        &self,
        reference: &str,
        seat_number: &str,
        items: &[BaggageItem],
    ) -> CoreResult<CheckInRecord> {
        let reference = normalize_reference(reference);
        let seat_number = require_seat(seat_number)?;
        let (booking, origin) = self.booking_and_origin(&reference).await?;

        if booking.checked_in {
            let baggage = self.repo.baggage_for_booking(booking.booking_id).await?;
            return Ok(CheckInRecord {
                booking,
                baggage,
                newly_checked_in: false,
            });
        }

        for attempt in 1..=self.settings.tag_attempts {
            let bags = self.tag_items(items, &origin, Utc::now());

            match self.repo.check_in(&reference, &seat_number, &bags).await {
                Ok(mut record) => {
                    if record.newly_checked_in {
                        info!(
                            %reference,
                            seat = %seat_number,
                            bags = record.baggage.len(),
                            "Passenger checked in"
                        );
                    } else {
                        record.baggage = self.repo.baggage_for_booking(record.booking.booking_id).await?;
                    }
                    return Ok(record);
                }
                Err(StoreError::DuplicateTag(tag)) => {
                    warn!(%tag, attempt, "Baggage tag collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(self.tags_exhausted())
    }

    pub async fn track_baggage(&self, tag: &str) -> CoreResult<Baggage> {
        let tag = tag.trim();
        self.repo
            .baggage_by_tag(tag)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Baggage {}", tag)))
    }

    /// Move a bag. There is no authorization check here: any caller can
    /// update any bag, matching the admin screen this replaces.
    pub async fn update_baggage_status(
        &self,
        tag: &str,
        status: BaggageStatus,
        location: &str,
    ) -> CoreResult<Baggage> {
        let tag = tag.trim();
        let bag = self
            .repo
            .update_baggage(tag, status, location.trim(), Utc::now())
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Baggage {}", tag)))?;

        info!(%tag, status = %bag.status, location = %bag.location, "Baggage updated");
        Ok(bag)
    }

    pub async fn booking_baggage(&self, reference: &str) -> CoreResult<Vec<Baggage>> {
        let reference = normalize_reference(reference);
        let booking = self
            .repo
            .booking_by_reference(&reference)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", reference)))?;
        Ok(self.repo.baggage_for_booking(booking.booking_id).await?)
    }

    async fn booking_and_origin(&self, reference: &str) -> CoreResult<(Booking, String)> {
        let booking = self
            .repo
            .booking_by_reference(reference)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", reference)))?;

        let flight = self
            .repo
            .get_flight(booking.flight_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Flight {}", booking.flight_id)))?;

        Ok((booking, flight.origin_airport))
    }

    fn tag_items(&self, items: &[BaggageItem], origin: &str, now: DateTime<Utc>) -> Vec<NewBaggage> {
        items
            .iter()
            .filter_map(|item| {
                let weight_kg = item.weight_kg?;
                let description = item
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .unwrap_or(DEFAULT_BAG_DESCRIPTION)
                    .to_string();

                Some(NewBaggage {
                    tag: self.codes.baggage_tag(),
                    weight_kg,
                    description,
                    status: BaggageStatus::CheckedIn,
                    location: check_in_location(origin),
                    last_updated: now,
                })
            })
            .collect()
    }

    fn tags_exhausted(&self) -> CoreError {
        CoreError::Storage(format!(
            "no unique baggage tags after {} attempts",
            self.settings.tag_attempts
        ))
    }
}
