use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::repository::{AirlineRepository, Probe};
use crate::{CoreError, CoreResult};

/// Monitored services and the table probes each one runs.
pub const SERVICES: [(&str, &[Probe]); 6] = [
    ("database", &[Probe::Ping, Probe::Flights]),
    ("flight_search", &[Probe::Flights]),
    ("booking", &[Probe::Bookings, Probe::ScheduledFlights]),
    ("checkin", &[Probe::UncheckedBookings, Probe::Flights]),
    ("baggage_tracking", &[Probe::Baggage]),
    ("authentication", &[Probe::Users]),
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Up,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub service: String,
    pub status: ServiceStatus,
    pub response_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub overall_status: OverallStatus,
    pub services: BTreeMap<String, ServiceHealth>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessMetrics {
    pub total_bookings: i64,
    pub total_checkins: i64,
    pub pending_checkins: i64,
    pub total_users: i64,
    pub total_baggage: i64,
    pub total_flights: i64,
    pub total_revenue_cents: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct HealthMonitor {
    repo: Arc<dyn AirlineRepository>,
}

impl HealthMonitor {
    pub fn new(repo: Arc<dyn AirlineRepository>) -> Self {
        Self { repo }
    }

    /// Every service keyed by name.
    pub async fn list_entity_health(&self) -> BTreeMap<String, ServiceHealth> {
        let mut services = BTreeMap::new();
        for (name, probes) in SERVICES {
            services.insert(name.to_string(), self.check(name, probes).await);
        }
        services
    }

    pub async fn overall_health(&self) -> HealthReport {
        let services = self.list_entity_health().await;
        let overall_status = if services.values().all(|s| s.status == ServiceStatus::Up) {
            OverallStatus::Up
        } else {
            OverallStatus::Degraded
        };

        HealthReport {
            overall_status,
            services,
            timestamp: Utc::now(),
        }
    }

    pub async fn service_health(&self, name: &str) -> CoreResult<ServiceHealth> {
        let (name, probes) = SERVICES
            .iter()
            .find(|(service, _)| *service == name)
            .ok_or_else(|| CoreError::NotFound(format!("Service {}", name)))?;
        Ok(self.check(name, probes).await)
    }

    /// `connected`, or `disconnected: <reason>`.
    pub async fn database_status(&self) -> String {
        match self.repo.probe(Probe::Ping).await {
            Ok(_) => "connected".to_string(),
            Err(e) => format!("disconnected: {}", e),
        }
    }

    pub async fn business_metrics(&self) -> CoreResult<BusinessMetrics> {
        let counts = self.repo.business_counts().await?;
        Ok(BusinessMetrics {
            total_bookings: counts.total_bookings,
            total_checkins: counts.total_checkins,
            pending_checkins: counts.total_bookings - counts.total_checkins,
            total_users: counts.total_users,
            total_baggage: counts.total_baggage,
            total_flights: counts.total_flights,
            total_revenue_cents: counts.total_revenue_cents,
            timestamp: Utc::now(),
        })
    }

    async fn check(&self, name: &str, probes: &[Probe]) -> ServiceHealth {
        let started = Instant::now();
        let outcome = self.run_probes(name, probes).await;
        let response_time_ms = (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0;

        let (status, error) = match outcome {
            Ok(()) => (ServiceStatus::Up, None),
            Err(e) => {
                tracing::warn!(service = name, error = %e, "Health check failed");
                (ServiceStatus::Down, Some(e))
            }
        };

        ServiceHealth {
            service: name.to_string(),
            status,
            response_time_ms,
            error,
            timestamp: Utc::now(),
        }
    }

    async fn run_probes(&self, name: &str, probes: &[Probe]) -> Result<(), String> {
        for probe in probes {
            let rows = self.repo.probe(*probe).await.map_err(|e| e.to_string())?;
            if name == "flight_search" && *probe == Probe::Flights && rows == 0 {
                return Err("No flights available".to_string());
            }
        }
        Ok(())
    }
}
