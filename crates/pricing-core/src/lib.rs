//! Core library for used-car price prediction
//!
//! This crate provides the core functionality for:
//! - Validation of raw vehicle records against the feature schema
//! - Loading and invoking the regression artifact
//! - Confidence scoring and offline evaluation
//! - Health checks and observability

pub mod error;
pub mod evaluation;
pub mod health;
pub mod models;
pub mod observability;
pub mod orchestrator;
pub mod predictor;
pub mod validator;

pub use error::{LoadError, PredictionErrorKind, ValidationError, ValidationErrors};
pub use evaluation::{EvaluationError, EvaluationMetrics, LabelledRecord};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PricingMetrics, StructuredLogger};
pub use orchestrator::PricePredictor;
pub use predictor::PriceRegressor;
pub use validator::{feature_catalog, validate, FeatureKind, FeatureSpec, RawRecord};
