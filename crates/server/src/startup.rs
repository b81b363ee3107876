//! Artifact load supervision
//!
//! The service starts serving before the artifact is available. Loading is
//! retried on an interval until it succeeds; readiness follows the result.

use crate::config::ServerConfig;
use pricing_core::{
    health::HealthRegistry, observability::StructuredLogger, LoadError, PricePredictor,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Make one attempt to load the configured artifact.
///
/// Returns `true` once the predictor holds an artifact, including when an
/// earlier attempt already installed one.
pub async fn try_load_model(
    predictor: &Arc<PricePredictor>,
    registry: &HealthRegistry,
    logger: &StructuredLogger,
    model_path: PathBuf,
    sha256: Option<String>,
) -> bool {
    let loader = Arc::clone(predictor);
    let path = model_path.clone();
    let outcome = tokio::task::spawn_blocking(move || match sha256 {
        Some(expected) => loader.initialize_with_checksum(&path, &expected),
        None => loader.initialize(&path),
    })
    .await;

    let display_path = model_path.display().to_string();
    match outcome {
        Ok(Ok(())) | Ok(Err(LoadError::AlreadyInitialized { .. })) => {
            if let Some(metadata) = predictor.model_info() {
                logger.log_model_loaded(&metadata);
            }
            registry.model_loaded().await;
            true
        }
        Ok(Err(e)) => {
            logger.log_model_load_failed(&display_path, e.kind(), &e.to_string());
            registry.model_load_failed(e.to_string()).await;
            false
        }
        Err(e) => {
            error!(error = %e, model_path = %display_path, "Model load task aborted");
            registry
                .model_load_failed(format!("Load task aborted: {}", e))
                .await;
            false
        }
    }
}

/// Retry loading until it succeeds, or try once when retrying is disabled
pub async fn supervise_model_load(
    predictor: Arc<PricePredictor>,
    registry: HealthRegistry,
    logger: StructuredLogger,
    config: ServerConfig,
) {
    let mut attempt: u64 = 1;

    while !try_load_model(
        &predictor,
        &registry,
        &logger,
        config.model_path.clone(),
        config.model_sha256.clone(),
    )
    .await
    {
        let Some(interval) = config.load_retry_interval() else {
            warn!("Model load retry disabled; predictions will return NotInitialized");
            return;
        };
        info!(
            attempt,
            retry_in_secs = interval.as_secs(),
            "Model unavailable; predictions will return NotInitialized until it loads"
        );
        attempt += 1;
        sleep(interval).await;
    }
}
