use anyhow::Context;
use chrono::Utc;
use phoenix_core::{DirectoryService, PasswordHasher};
use phoenix_store::seed::seed_sample_schedule;
use phoenix_store::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SCHEDULE_DAYS: u32 = 14;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phoenix_store=info,phoenix_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    if config.database.url.is_none() {
        anyhow::bail!("database.url is not set; seeding the in-memory store would be lost on exit");
    }

    let repo = phoenix_store::open_repository(&config.database)
        .await
        .context("Failed to open repository")?;
    let directory = DirectoryService::new(repo, PasswordHasher::new(config.auth.password_iterations));

    let today = Utc::now().date_naive();
    let report = seed_sample_schedule(&directory, today, SCHEDULE_DAYS, &mut rand::thread_rng())
        .await
        .context("Seeding failed")?;

    println!(
        "Added {} flights over {} days ({} airports, {} new aircraft)",
        report.flights, SCHEDULE_DAYS, report.airports, report.aircraft
    );
    Ok(())
}
