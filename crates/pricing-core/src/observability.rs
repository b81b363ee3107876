//! Observability infrastructure for the price predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes, loaded model info)
//! - Structured JSON logging of service lifecycle events with tracing

use crate::models::ModelMetadata;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PricingMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct PricingMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions: IntCounterVec,
    model_loaded: IntGauge,
    model_info: GaugeVec,
    model_load_failures: IntCounter,
}

impl PricingMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "car_price_prediction_latency_seconds",
                "Time spent validating input and running the regression artifact",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions: register_int_counter_vec!(
                "car_price_predictions_total",
                "Prediction requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register predictions_total"),

            model_loaded: register_int_gauge!(
                "car_price_model_loaded",
                "Whether a regression artifact is loaded (1) or not (0)"
            )
            .expect("Failed to register model_loaded"),

            model_info: register_gauge_vec!(
                "car_price_model_info",
                "Information about the currently loaded regression artifact",
                &["model_type", "checksum"]
            )
            .expect("Failed to register model_info"),

            model_load_failures: register_int_counter!(
                "car_price_model_load_failures_total",
                "Total number of failed artifact loads"
            )
            .expect("Failed to register model_load_failures_total"),
        }
    }
}

/// Pricing metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PricingMetrics {
    _private: (),
}

impl Default for PricingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PricingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PricingMetricsInner {
        GLOBAL_METRICS.get_or_init(PricingMetricsInner::new)
    }

    /// Record a prediction latency observation
    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Count a finished prediction by outcome label
    pub fn inc_prediction(&self, outcome: &str) {
        self.inner().predictions.with_label_values(&[outcome]).inc();
    }

    /// Record the artifact that is now serving predictions
    pub fn set_model_loaded(&self, metadata: &ModelMetadata) {
        self.inner().model_loaded.set(1);
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[metadata.artifact_kind.as_str(), metadata.checksum.as_str()])
            .set(1.0);
    }

    /// Increment artifact load failures
    pub fn inc_model_load_failures(&self) {
        self.inner().model_load_failures.inc();
    }
}

/// Structured logger for service lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, model_path: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            model_path = %model_path,
            "Car price predictor started"
        );
    }

    /// Log a successful artifact load
    pub fn log_model_loaded(&self, metadata: &ModelMetadata) {
        info!(
            event = "model_loaded",
            service = %self.service,
            model_type = %metadata.artifact_kind,
            model_path = %metadata.source_path.display(),
            checksum = %metadata.checksum,
            size_bytes = metadata.size_bytes,
            "Regression artifact loaded"
        );
    }

    /// Log a failed artifact load
    pub fn log_model_load_failed(&self, model_path: &str, kind: &str, message: &str) {
        error!(
            event = "model_load_failed",
            service = %self.service,
            model_path = %model_path,
            error_kind = %kind,
            error = %message,
            "Failed to load regression artifact; predictions unavailable"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Car price predictor shutting down"
        );
    }
}
