//! Car Price Server - used-car price prediction service
//!
//! Serves predictions over HTTP while the regression artifact is loaded
//! (and, on failure, reloaded) in the background.

use anyhow::Result;
use car_price_server::{api, config::ServerConfig, startup};
use pricing_core::{
    health::{components, HealthRegistry},
    observability::{PricingMetrics, StructuredLogger},
    PricePredictor,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const SERVICE_NAME: &str = "car-price-server";

async fn shutdown_signal(logger: StructuredLogger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logger.log_shutdown("SIGINT received"),
        Err(e) => logger.log_shutdown(&format!("signal handler failed: {}", e)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load()?;

    // Initialize tracing with JSON output; RUST_LOG overrides the environment default
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.environment.default_log_filter())),
        )
        .with(fmt::layer().json())
        .init();

    info!(environment = %config.environment, "Starting car-price-server");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::API).await;
    health_registry
        .set_degraded(components::ARTIFACT, "Model loading")
        .await;

    // Register metrics before the first scrape
    let _metrics = PricingMetrics::new();

    let logger = StructuredLogger::new(SERVICE_NAME);
    logger.log_startup(SERVER_VERSION, &config.model_path.display().to_string());

    let predictor = Arc::new(PricePredictor::new());
    tokio::spawn(startup::supervise_model_load(
        Arc::clone(&predictor),
        health_registry.clone(),
        logger.clone(),
        config.clone(),
    ));

    let app_state = Arc::new(
        api::AppState::new(predictor, health_registry, config.api_version.clone())
            .with_cors_origins(config.cors_origins.clone()),
    );

    api::serve(&config.bind_addr(), app_state, shutdown_signal(logger)).await?;
    info!("Shutting down");

    Ok(())
}
