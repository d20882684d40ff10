use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchRequest {
    pub origin_airport_code: String,
    pub destination_airport_code: String,
    pub date: NaiveDate, // Just date, ignore time for search match
}

impl FlightSearchRequest {
    /// Upper-cases both airport codes and rejects blank ones.
    pub fn normalized(&self) -> CoreResult<FlightSearchRequest> {
        let origin = self.origin_airport_code.trim().to_ascii_uppercase();
        let destination = self.destination_airport_code.trim().to_ascii_uppercase();

        if origin.is_empty() || destination.is_empty() {
            return Err(CoreError::ValidationFailure(
                "origin and destination are required".to_string(),
            ));
        }

        Ok(FlightSearchRequest {
            origin_airport_code: origin,
            destination_airport_code: destination,
            date: self.date,
        })
    }
}
