//! HTTP API for predictions, model introspection, health checks and metrics

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pricing_core::{
    feature_catalog,
    health::{ComponentStatus, HealthRegistry},
    predictor::FeatureLayout,
    PredictionErrorKind, PredictionResult, PricePredictor, RawRecord,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<PricePredictor>,
    pub health_registry: HealthRegistry,
    pub api_version: String,
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(
        predictor: Arc<PricePredictor>,
        health_registry: HealthRegistry,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            predictor,
            health_registry,
            api_version: api_version.into(),
            cors_origins: crate::config::default_cors_origins(),
        }
    }

    /// Replace the origins allowed by the CORS policy
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}

fn error_body(status: StatusCode, error_type: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": message,
            "error_type": error_type,
        })),
    )
        .into_response()
}

fn is_json_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn status_for(result: &PredictionResult) -> StatusCode {
    match result.error_kind() {
        None => StatusCode::OK,
        Some(PredictionErrorKind::ValidationError) => StatusCode::BAD_REQUEST,
        Some(PredictionErrorKind::NotInitialized) => StatusCode::SERVICE_UNAVAILABLE,
        Some(PredictionErrorKind::InferenceError) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Predict the price of one vehicle
async fn predict(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if !is_json_request(&headers) {
        return error_body(StatusCode::BAD_REQUEST, "ContentTypeError", "Request must be JSON");
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return error_body(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PayloadTooLargeError",
                "Request body too large",
            )
        }
        Err(rejection) => {
            return error_body(rejection.status(), "BadRequest", &rejection.body_text())
        }
    };

    let raw: RawRecord = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return error_body(
                StatusCode::BAD_REQUEST,
                "BadRequest",
                "Request body must be a JSON object",
            )
        }
        Err(e) => {
            return error_body(
                StatusCode::BAD_REQUEST,
                "BadRequest",
                &format!("Malformed JSON: {}", e),
            )
        }
    };

    // Inference is CPU-bound; keep it off the async workers
    let predictor = Arc::clone(&state.predictor);
    let result = match tokio::task::spawn_blocking(move || predictor.predict(&raw)).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Prediction task aborted");
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                "Internal server error",
            );
        }
    };

    let status = status_for(&result);
    let mut body = match serde_json::to_value(&result) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to serialize prediction");
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                "Internal server error",
            );
        }
    };
    if let Value::Object(map) = &mut body {
        map.insert("success".to_string(), Value::Bool(result.is_success()));
    }

    (status, Json(body)).into_response()
}

/// Service status and loaded model summary
async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_info = state.predictor.model_info();
    Json(json!({
        "status": "healthy",
        "model_loaded": model_info.is_some(),
        "version": state.api_version,
        "model_info": model_info,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Detailed information about the loaded artifact
async fn model_info(State(state): State<Arc<AppState>>) -> Response {
    let Some(metadata) = state.predictor.model_info() else {
        return error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "NotInitialized",
            "Model not loaded",
        );
    };

    let layout = FeatureLayout::standard();
    let model_type = metadata.artifact_kind.clone();
    Json(json!({
        "success": true,
        "model_info": {
            "model_metadata": metadata,
            "feature_names": layout.columns(),
            "model_type": model_type,
            "is_loaded": true,
        }
    }))
    .into_response()
}

/// Accepted features and their valid values
async fn features() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "features": feature_catalog(),
    }))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "NotFoundError", "Endpoint not found")
}

async fn method_not_allowed() -> Response {
    error_body(
        StatusCode::METHOD_NOT_ALLOWED,
        "MethodNotAllowedError",
        "Method not allowed",
    )
}

/// Build the CORS policy; `*` anywhere in `origins` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/health", get(api_health))
        .route("/api/v1/model/info", get(model_info))
        .route("/api/v1/features", get(features))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors)
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
