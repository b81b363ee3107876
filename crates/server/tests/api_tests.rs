//! Integration tests for the prediction API endpoints

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use car_price_server::api::{create_router, AppState};
use pricing_core::{
    health::{components, HealthRegistry},
    predictor::StubRegressor,
    PricePredictor,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn toyota_2018() -> Value {
    json!({
        "Brand": "Toyota",
        "Model": "Sedan",
        "Year": 2018,
        "KM_Driven": 50000,
        "Fuel": "Petrol",
        "Seller_Type": "Individual",
        "Transmission": "Manual",
        "Owner": "First Owner"
    })
}

async fn setup_test_app(stub: Option<StubRegressor>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::API).await;

    let predictor = Arc::new(PricePredictor::new());
    if let Some(stub) = stub {
        predictor
            .initialize_with_artifact(Box::new(stub), "memory://stub")
            .unwrap();
        health_registry.model_loaded().await;
    }

    let state = Arc::new(AppState::new(predictor, health_registry, "1.0.0"));
    let router = create_router(state.clone());

    (router, state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

mod predict_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_prediction() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(12500.0))).await;

        let (status, body) = send(app, post_json(&toyota_2018())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "success");
        assert_eq!(body["predicted_price"], 12500.0);
        assert_eq!(body["formatted_price"], "$12,500.00");
        assert_eq!(body["confidence"], 0.95);
        assert_eq!(body["input_features"]["Brand"], "Toyota");
        assert_eq!(body["model_info"]["model_type"], "StubRegressor");
    }

    #[tokio::test]
    async fn test_validation_error_is_400() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;
        let mut input = toyota_2018();
        input["Brand"] = json!("Tesla");

        let (status, body) = send(app, post_json(&input)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_type"], "ValidationError");
        assert_eq!(body["details"][0]["kind"], "InvalidEnum");
        assert_eq!(body["details"][0]["field"], "Brand");
    }

    #[tokio::test]
    async fn test_missing_fields_listed() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;

        let (status, body) = send(app, post_json(&json!({ "Brand": "Honda" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let missing = body["details"][0]["fields"].as_array().unwrap();
        assert_eq!(missing.len(), 7);
        assert!(!missing.contains(&json!("Brand")));
    }

    #[tokio::test]
    async fn test_not_initialized_is_503() {
        let (app, _state) = setup_test_app(None).await;

        let (status, body) = send(app, post_json(&toyota_2018())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error_type"], "NotInitialized");
    }

    #[tokio::test]
    async fn test_inference_error_is_500() {
        let (app, _state) = setup_test_app(Some(StubRegressor::failing("bad shape"))).await;

        let (status, body) = send(app, post_json(&toyota_2018())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error_type"], "InferenceError");
    }

    #[tokio::test]
    async fn test_non_json_content_type_rejected() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/predict")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(toyota_2018().to_string()))
            .unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "ContentTypeError");
    }

    #[tokio::test]
    async fn test_non_object_body_rejected() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;

        let (status, body) = send(app, post_json(&json!([1, 2, 3]))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "BadRequest");
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;
        let padding = "x".repeat(3 * 1024 * 1024);
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "padding": padding }).to_string()))
            .unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_type"], "PayloadTooLargeError");
    }
}

mod info_tests {
    use super::*;

    #[tokio::test]
    async fn test_api_health_reports_model_state() {
        let (app, _state) = setup_test_app(None).await;
        let (status, body) = send(app, get("/api/v1/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], false);
        assert_eq!(body["version"], "1.0.0");
        assert!(body["model_info"].is_null());

        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;
        let (_, body) = send(app, get("/api/v1/health")).await;
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["model_info"]["model_path"], "memory://stub");
    }

    #[tokio::test]
    async fn test_model_info() {
        let (app, _state) = setup_test_app(None).await;
        let (status, _) = send(app, get("/api/v1/model/info")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (app, _state) = setup_test_app(Some(StubRegressor::depreciation())).await;
        let (status, body) = send(app, get("/api/v1/model/info")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_info"]["is_loaded"], true);
        assert_eq!(body["model_info"]["model_type"], "StubRegressor");
        let names = body["model_info"]["feature_names"].as_array().unwrap();
        assert_eq!(names[0], "Year");
        assert!(names.contains(&json!("Brand_Toyota")));
    }

    #[tokio::test]
    async fn test_features_catalog() {
        let (app, _state) = setup_test_app(None).await;
        let (status, body) = send(app, get("/api/v1/features")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["features"]["Year"]["min_value"], 1900);
        assert_eq!(body["features"]["Year"]["max_value"], 2030);
        assert_eq!(body["features"]["Brand"]["type"], "categorical");
        assert_eq!(body["features"]["Owner"]["valid_values"][3], "Fourth & Above Owner");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (app, _state) = setup_test_app(None).await;
        let (status, body) = send(app, get("/api/v1/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "NotFoundError");
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let (app, _state) = setup_test_app(None).await;
        let (status, body) = send(app, get("/api/v1/predict")).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Method not allowed");
        assert_eq!(body["error_type"], "MethodNotAllowedError");

        let (app, _state) = setup_test_app(None).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/features")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error_type"], "MethodNotAllowedError");
    }
}

mod cors_tests {
    use super::*;

    fn app_with_origins(origins: &[&str]) -> Router {
        let state = AppState::new(Arc::new(PricePredictor::new()), HealthRegistry::new(), "1.0.0")
            .with_cors_origins(origins.iter().map(|o| o.to_string()).collect());
        create_router(Arc::new(state))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/predict")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin() {
        let app = app_with_origins(&["http://localhost:3000"]);
        let response = app.oneshot(preflight("http://localhost:3000")).await.unwrap();

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("POST"));
    }

    #[tokio::test]
    async fn test_preflight_from_unlisted_origin() {
        let app = app_with_origins(&["http://localhost:3000"]);
        let response = app.oneshot(preflight("http://evil.example")).await.unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_wildcard_origin() {
        let app = app_with_origins(&["*"]);
        let request = Request::builder()
            .uri("/api/v1/features")
            .header(header::ORIGIN, "http://anywhere.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_default_origins_from_state() {
        let (app, state) = setup_test_app(None).await;
        assert!(state
            .cors_origins
            .contains(&"http://localhost:3000".to_string()));

        let response = app.oneshot(preflight("http://localhost:3000")).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz_returns_ok_when_healthy() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;
        let (status, health) = send(app, get("/healthz")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
    }

    #[tokio::test]
    async fn test_healthz_returns_ok_while_loading() {
        let (app, state) = setup_test_app(None).await;
        state
            .health_registry
            .set_degraded(components::ARTIFACT, "Model loading")
            .await;

        let (status, health) = send(app, get("/healthz")).await;

        // Degraded still returns 200
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "degraded");
    }

    #[tokio::test]
    async fn test_healthz_returns_503_after_failed_load() {
        let (app, state) = setup_test_app(None).await;
        state
            .health_registry
            .model_load_failed("Model file not found: models/vehicle_price_model.json")
            .await;

        let (status, health) = send(app, get("/healthz")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_readyz_tracks_model_load() {
        let (app, _state) = setup_test_app(None).await;
        let (status, readiness) = send(app, get("/readyz")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(readiness["ready"], false);

        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;
        let (status, readiness) = send(app, get("/readyz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(readiness["ready"], true);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (app, _state) = setup_test_app(Some(StubRegressor::fixed(1.0))).await;
        let _ = send(app.clone(), post_json(&toyota_2018())).await;

        let response = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("car_price_predictions_total"));
        assert!(text.contains("car_price_prediction_latency_seconds"));
    }
}
