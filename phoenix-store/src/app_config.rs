use phoenix_core::BookingSettings;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres URL. Without one the service runs on the in-memory repository.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    #[serde(default = "default_attempts")]
    pub reference_attempts: u32,
    #[serde(default = "default_attempts")]
    pub tag_attempts: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            reference_attempts: default_attempts(),
            tag_attempts: default_attempts(),
        }
    }
}

impl From<&BookingConfig> for BookingSettings {
    fn from(cfg: &BookingConfig) -> Self {
        BookingSettings {
            reference_attempts: cfg.reference_attempts.max(1),
            tag_attempts: cfg.tag_attempts.max(1),
        }
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_true() -> bool { true }
fn default_password_iterations() -> u32 { 100_000 }
fn default_attempts() -> u32 { 8 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `PHOENIX_DATABASE__URL=postgres://...` sets `database.url`
            .add_source(config::Environment::with_prefix("PHOENIX").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
