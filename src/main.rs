//! Breezo Station - periodic sensor upload to a Breezo ingestion server
//!
//! This binary samples the station sensors on a fixed interval, normalizes
//! the readings and sends them to the configured server, one blocking
//! request at a time.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BREEZO_HOST`: ingestion host (required)
//! - `BREEZO_FINGERPRINT`: server certificate fingerprint, enables HTTPS
//! - `BREEZO_PORT`: port override
//! - `BREEZO_ACCESS_TOKEN` / `BREEZO_CLIENT_ID`: credentials (required)
//! - `BREEZO_CLIENT_NAME`: station name (default: breezo-station)
//! - `BREEZO_LATITUDE` / `BREEZO_LONGITUDE` / `BREEZO_ALTITUDE`: station location
//! - `BREEZO_SAMPLE_INTERVAL_SECS`: seconds between uploads (default: 60)
//! - `RUST_LOG`: Logging level filter (default: info)

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use breezo_client::client::{Breezo, Response};
use breezo_client::config::Config;
use breezo_client::reading::ReadingSet;
use breezo_client::simulator::SensorSimulator;
use breezo_client::transport::Transport;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with environment filter
    init_tracing();

    info!("Starting Breezo station...");

    let config = match Config::from_env() {
        Ok(config) => {
            info!(
                host = %config.host,
                pinned = config.fingerprint.is_some(),
                client_id = %config.client_id,
                sample_interval_secs = config.sample_interval.as_secs(),
                "Configuration loaded"
            );
            config
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let breezo = Arc::new(Breezo::new(
        config.access_token.clone(),
        config.client_id.clone(),
        config.client_name.clone(),
        config.server(),
    ));
    info!(url = %breezo.server().endpoint().url, "Breezo client initialized");

    let simulator = SensorSimulator::with_defaults();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let station = tokio::spawn(run_station(breezo, simulator, config, shutdown_rx));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping..."),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
    let _ = shutdown_tx.send(true);

    match station.await {
        Ok(uploads) => info!(uploads, "Breezo station stopped"),
        Err(e) => error!(error = %e, "Station task failed"),
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Sample and upload readings on every tick until `shutdown` fires.
///
/// Ticks that fire while a request is still in flight are delayed, so at
/// most one request is outstanding. Shutdown is only observed between
/// uploads; an in-flight request always completes and is logged. Returns
/// the number of uploads attempted.
async fn run_station<T>(
    breezo: Arc<Breezo<T>>,
    simulator: SensorSimulator,
    config: Config,
    mut shutdown: watch::Receiver<bool>,
) -> u64
where
    T: Transport + Send + Sync + 'static,
{
    let mut ticker = interval(config.sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let (lat, lng, alt) = config.location;
    let mut uploads: u64 = 0;
    let mut failures: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            // A dropped sender also stops the station.
            _ = shutdown.changed() => break,
        }

        let mut readings = simulator.collect();
        readings.set_location(lat, lng, alt);

        let response = match upload(breezo.clone(), readings).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Upload task failed");
                Response::error(e.to_string())
            }
        };

        uploads += 1;
        if !response.is_ok() {
            failures += 1;
        }

        info!(
            status = %response.status,
            id = %response.id,
            air_quality = %response.air_quality,
            message = %response.message,
            uploads,
            failures,
            "Upload finished"
        );
    }

    uploads
}

/// Run one blocking send off the async worker threads.
async fn upload<T>(
    breezo: Arc<Breezo<T>>,
    readings: ReadingSet,
) -> Result<Response, tokio::task::JoinError>
where
    T: Transport + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || breezo.send(&readings)).await
}
