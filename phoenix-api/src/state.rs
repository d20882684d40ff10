use phoenix_core::{
    AirlineRepository, BaggageService, BookingService, BookingSettings, CodeGenerator,
    DirectoryService, HealthMonitor, PasswordHasher,
};
use std::sync::Arc;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
    pub baggage: BaggageService,
    pub directory: DirectoryService,
    pub health: HealthMonitor,
    pub metrics: Arc<Metrics>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire every service to one shared repository.
    pub fn new(
        repo: Arc<dyn AirlineRepository>,
        codes: Arc<dyn CodeGenerator>,
        settings: BookingSettings,
        hasher: PasswordHasher,
        auth: AuthConfig,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            bookings: BookingService::new(repo.clone(), codes.clone(), settings),
            baggage: BaggageService::new(repo.clone(), codes, settings),
            directory: DirectoryService::new(repo.clone(), hasher),
            health: HealthMonitor::new(repo),
            metrics: Arc::new(Metrics::new()?),
            auth,
        })
    }
}
