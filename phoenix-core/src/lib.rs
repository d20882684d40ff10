pub mod baggage;
pub mod booking;
pub mod codes;
pub mod directory;
pub mod health;
pub mod identity;
pub mod inventory;
pub mod masked;
pub mod models;
pub mod repository;
pub mod search;

pub use baggage::BaggageService;
pub use booking::{BookingService, BookingSettings};
pub use codes::{CodeGenerator, RandomCodes};
pub use directory::DirectoryService;
pub use health::HealthMonitor;
pub use identity::PasswordHasher;
pub use inventory::{Cabin, SeatInventory};
pub use masked::Masked;
pub use repository::{AirlineRepository, StoreError};

use inventory::InventoryError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Insufficient {cabin} inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        cabin: Cabin,
        requested: i32,
        available: i32,
    },
    #[error("Validation failed: {0}")]
    ValidationFailure(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::FlightNotFound(id) => CoreError::NotFound(format!("Flight {}", id)),
            StoreError::BookingNotFound(reference) => {
                CoreError::NotFound(format!("Booking {}", reference))
            }
            StoreError::InsufficientInventory { cabin, requested, available } => {
                CoreError::InsufficientInventory { cabin, requested, available }
            }
            StoreError::DuplicateEmail(email) => {
                CoreError::Conflict(format!("Email already registered: {}", email))
            }
            StoreError::Invalid(reason) => CoreError::ValidationFailure(reason),
            other => CoreError::Storage(other.to_string()),
        }
    }
}

impl From<InventoryError> for CoreError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientInventory { cabin, requested, available } => {
                CoreError::InsufficientInventory { cabin, requested, available }
            }
            InventoryError::InvalidQuantity(_) => CoreError::ValidationFailure(err.to_string()),
        }
    }
}
