//! Weather station generator binary.
//!
//! Produces synthetic sensor data: a correlated random walk over
//! temperature, humidity, pressure, and wind speed, advanced at a fixed
//! interval with one `PostgreSQL` row appended per tick.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the environment
//! 3. Create the (lazy) `PostgreSQL` pool
//! 4. Wait for the database to answer (up to 60 s)
//! 5. Ensure the schema exists (migrations)
//! 6. Install the Ctrl-C listener
//! 7. Sample the initial weather state
//! 8. Run the tick loop until interrupted
//! 9. Log the run summary and close the pool

mod config;
mod error;
mod runner;
mod shutdown;
mod startup;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use weather_db::PostgresPool;
use weather_model::{RandomNoise, WeatherState};

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::runner::RunSummary;
use crate::shutdown::{Shutdown, listen_for_interrupt};
use crate::startup::StartupGuard;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the database never becomes
/// reachable, or the schema cannot be created.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("weather-generator starting");

    let config = GeneratorConfig::from_env()?;
    info!(
        interval_secs = config.interval.as_secs_f64(),
        store_wait_secs = config.store_wait.as_secs(),
        "Configuration loaded"
    );

    let summary = run(&config).await?;

    info!(
        ticks = summary.ticks,
        failed = summary.failed,
        "weather-generator shutdown complete"
    );

    Ok(())
}

/// Bring up the store, then run the tick loop until interrupted.
async fn run(config: &GeneratorConfig) -> Result<RunSummary, GeneratorError> {
    let pool = PostgresPool::connect_lazy(&config.postgres_config())?;

    info!(
        max_wait_secs = config.store_wait.as_secs(),
        "Waiting for database"
    );
    StartupGuard::new(config.store_wait)
        .with_retry_interval(config.retry_interval)
        .with_probe_timeout(config.probe_timeout)
        .wait_for(&pool)
        .await?;

    pool.run_migrations().await?;

    let shutdown = Arc::new(Shutdown::new());
    let _interrupt_listener = listen_for_interrupt(Arc::clone(&shutdown));

    let mut noise = RandomNoise::from_os_rng();
    let initial = WeatherState::initial(&mut noise);

    let summary = runner::run(initial, &mut noise, &pool, config.interval, &shutdown).await;
    runner::log_run_end(&summary);

    pool.close().await;
    Ok(summary)
}
