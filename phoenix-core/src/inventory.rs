use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seating class. Each cabin has its own price and availability count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Cabin {
    Economy,
    Business,
    First,
}

impl Cabin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cabin::Economy => "economy",
            Cabin::Business => "business",
            Cabin::First => "first",
        }
    }
}

impl fmt::Display for Cabin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cabin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "economy" => Ok(Cabin::Economy),
            "business" => Ok(Cabin::Business),
            "first" => Ok(Cabin::First),
            other => Err(format!("unknown cabin '{}'", other)),
        }
    }
}

/// Remaining seats per cabin on one flight.
///
/// The counts never go below zero: `reserve` is the only way to lower them and
/// it refuses any request larger than what is left. There is no release.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatInventory {
    #[serde(rename = "available_economy")]
    pub economy: i32,
    #[serde(rename = "available_business")]
    pub business: i32,
    #[serde(rename = "available_first")]
    pub first: i32,
}

impl SeatInventory {
    pub fn available(&self, cabin: Cabin) -> i32 {
        match cabin {
            Cabin::Economy => self.economy,
            Cabin::Business => self.business,
            Cabin::First => self.first,
        }
    }

    fn slot_mut(&mut self, cabin: Cabin) -> &mut i32 {
        match cabin {
            Cabin::Economy => &mut self.economy,
            Cabin::Business => &mut self.business,
            Cabin::First => &mut self.first,
        }
    }

    /// Check and decrement in one step.
    pub fn reserve(&mut self, cabin: Cabin, count: i32) -> Result<(), InventoryError> {
        if count <= 0 {
            return Err(InventoryError::InvalidQuantity(count));
        }

        let slot = self.slot_mut(cabin);
        if *slot < count {
            return Err(InventoryError::InsufficientInventory {
                cabin,
                requested: count,
                available: *slot,
            });
        }

        *slot -= count;
        Ok(())
    }

    /// True when every cabin is non-negative and within `capacity`.
    pub fn fits_within(&self, capacity: &SeatInventory) -> bool {
        [Cabin::Economy, Cabin::Business, Cabin::First].iter().all(|cabin| {
            let available = self.available(*cabin);
            available >= 0 && available <= capacity.available(*cabin)
        })
    }

    pub fn total(&self) -> i32 {
        self.economy + self.business + self.first
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Insufficient {cabin} inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        cabin: Cabin,
        requested: i32,
        available: i32,
    },

    #[error("Seat quantity must be positive, got {0}")]
    InvalidQuantity(i32),
}
