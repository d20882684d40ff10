use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

use phoenix_api::{app, AppState, AuthConfig};
use phoenix_core::{BookingSettings, PasswordHasher, RandomCodes};
use phoenix_store::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "phoenix_api=debug,phoenix_core=debug,phoenix_store=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Phoenix Air API on port {}", config.server.port);

    let repo = phoenix_store::open_repository(&config.database)
        .await
        .context("Failed to open repository")?;

    let app_state = AppState::new(
        repo,
        Arc::new(RandomCodes),
        BookingSettings::from(&config.booking),
        PasswordHasher::new(config.auth.password_iterations),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    )
    .context("Failed to register metrics")?;

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
