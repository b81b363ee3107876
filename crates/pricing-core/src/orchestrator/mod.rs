//! Prediction orchestration
//!
//! Owns the single regression artifact for the process lifetime and turns a
//! raw record into a [`PredictionResult`]: initialization check, validation,
//! inference, confidence scoring.

use crate::error::{LoadError, PredictionErrorKind};
use crate::evaluation::{EvaluationError, EvaluationMetrics, LabelledRecord};
use crate::models::{ModelMetadata, PredictionFailure, PredictionResult, PredictionSuccess, VehicleRecord};
use crate::observability::PricingMetrics;
use crate::predictor::{confidence, format_price, load_artifact, PriceRegressor};
use crate::validator::{validate, RawRecord};
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn};


/// How concurrent calls reach the artifact
enum Invoker {
    /// Artifact tolerates concurrent calls
    Reentrant(Box<dyn PriceRegressor>),
    /// Calls are serialized
    Serialized(Mutex<Box<dyn PriceRegressor>>),
}

impl Invoker {
    fn new(artifact: Box<dyn PriceRegressor>) -> Self {
        if artifact.is_reentrant() {
            Invoker::Reentrant(artifact)
        } else {
            Invoker::Serialized(Mutex::new(artifact))
        }
    }

    fn predict(&self, record: &VehicleRecord) -> Result<f64> {
        let price = match self {
            Invoker::Reentrant(artifact) => artifact.predict(record)?,
            Invoker::Serialized(artifact) => {
                let guard = artifact
                    .lock()
                    .map_err(|_| anyhow!("artifact lock poisoned by an earlier panic"))?;
                guard.predict(record)?
            }
        };

        if !price.is_finite() {
            return Err(anyhow!("artifact produced a non-finite price: {}", price));
        }
        Ok(price)
    }
}

struct LoadedState {
    invoker: Invoker,
    metadata: ModelMetadata,
}

/// Price predictor holding the process-wide artifact
pub struct PricePredictor {
    loaded: OnceLock<LoadedState>,
    metrics: PricingMetrics,
}

impl Default for PricePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl PricePredictor {
    /// Create an uninitialized predictor
    pub fn new() -> Self {
        Self {
            loaded: OnceLock::new(),
            metrics: PricingMetrics::new(),
        }
    }

    /// Load the artifact at `path`
    pub fn initialize(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        self.initialize_inner(path.as_ref(), None)
    }

    /// Load the artifact at `path`, rejecting it unless its SHA-256 matches
    pub fn initialize_with_checksum(
        &self,
        path: impl AsRef<Path>,
        sha256: &str,
    ) -> Result<(), LoadError> {
        self.initialize_inner(path.as_ref(), Some(sha256))
    }

    fn initialize_inner(&self, path: &Path, sha256: Option<&str>) -> Result<(), LoadError> {
        self.ensure_uninitialized()?;

        let loaded = load_artifact(path, sha256).inspect_err(|_| {
            self.metrics.inc_model_load_failures();
        })?;
        self.install(loaded.artifact, loaded.metadata)
    }

    /// Install an in-memory artifact; `source_label` stands in for the path.
    /// There is no blob to digest, so the reported checksum is empty.
    pub fn initialize_with_artifact(
        &self,
        artifact: Box<dyn PriceRegressor>,
        source_label: &str,
    ) -> Result<(), LoadError> {
        self.ensure_uninitialized()?;

        let metadata = ModelMetadata {
            artifact_kind: artifact.kind().to_string(),
            loaded_at: chrono::Utc::now(),
            source_path: PathBuf::from(source_label),
            checksum: String::new(),
            size_bytes: 0,
        };
        self.install(artifact, metadata)
    }

    fn ensure_uninitialized(&self) -> Result<(), LoadError> {
        match self.loaded.get() {
            Some(state) => Err(LoadError::AlreadyInitialized {
                path: state.metadata.source_path.clone(),
            }),
            None => Ok(()),
        }
    }

    fn install(&self, artifact: Box<dyn PriceRegressor>, metadata: ModelMetadata) -> Result<(), LoadError> {
        let state = LoadedState {
            invoker: Invoker::new(artifact),
            metadata,
        };

        // Another initializer may have won between the check and here
        if let Err(rejected) = self.loaded.set(state) {
            warn!(
                model_path = %rejected.metadata.source_path.display(),
                "Concurrent initialization lost; keeping the first artifact"
            );
            return self.ensure_uninitialized();
        }

        if let Some(state) = self.loaded.get() {
            self.metrics.set_model_loaded(&state.metadata);
            info!(
                model_type = %state.metadata.artifact_kind,
                model_path = %state.metadata.source_path.display(),
                reentrant = matches!(state.invoker, Invoker::Reentrant(_)),
                "Predictor initialized"
            );
        }
        Ok(())
    }

    /// Whether an artifact has been loaded
    pub fn is_initialized(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Snapshot of the loaded artifact's metadata
    pub fn model_info(&self) -> Option<ModelMetadata> {
        self.loaded.get().map(|state| state.metadata.clone())
    }

    /// Predict the price of one raw vehicle record
    pub fn predict(&self, raw: &RawRecord) -> PredictionResult {
        let start = Instant::now();
        let result = self.predict_inner(raw);
        let elapsed = start.elapsed();

        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
        self.metrics.inc_prediction(result.outcome());

        match &result {
            PredictionResult::Success(success) => debug!(
                price = success.price,
                confidence = success.confidence,
                duration_us = elapsed.as_micros() as u64,
                "Prediction succeeded"
            ),
            PredictionResult::Failure(failure) => warn!(
                error_type = %failure.error_kind,
                error = %failure.message,
                "Prediction failed"
            ),
        }
        result
    }

    fn predict_inner(&self, raw: &RawRecord) -> PredictionResult {
        let Some(state) = self.loaded.get() else {
            return PredictionResult::Failure(PredictionFailure::new(
                PredictionErrorKind::NotInitialized,
                "Model not initialized",
            ));
        };

        let record = match validate(raw) {
            Ok(record) => record,
            Err(errors) => return PredictionResult::Failure(PredictionFailure::validation(errors)),
        };

        let price = match state.invoker.predict(&record) {
            Ok(price) => price,
            Err(e) => {
                return PredictionResult::Failure(PredictionFailure::new(
                    PredictionErrorKind::InferenceError,
                    format!("Prediction failed: {:#}", e),
                ))
            }
        };

        let km = i64::try_from(record.km_driven()).unwrap_or(i64::MAX);
        PredictionResult::Success(PredictionSuccess {
            price,
            formatted_price: format_price(price),
            confidence: confidence(i64::from(record.year()), km),
            model_info: state.metadata.clone(),
            input_features: record,
        })
    }

    /// Score the loaded artifact against labelled samples
    pub fn evaluate(&self, samples: &[LabelledRecord]) -> Result<EvaluationMetrics, EvaluationError> {
        let state = self.loaded.get().ok_or(EvaluationError::NotInitialized)?;
        if samples.is_empty() {
            return Err(EvaluationError::EmptyDataset);
        }

        let mut actual = Vec::with_capacity(samples.len());
        let mut predicted = Vec::with_capacity(samples.len());
        for (index, sample) in samples.iter().enumerate() {
            let record = validate(&sample.features)
                .map_err(|errors| EvaluationError::InvalidSample { index, errors })?;
            let price = state
                .invoker
                .predict(&record)
                .map_err(|e| EvaluationError::Inference {
                    index,
                    message: format!("{:#}", e),
                })?;
            actual.push(sample.actual_price);
            predicted.push(price);
        }

        let metrics =
            EvaluationMetrics::compute(&actual, &predicted).ok_or(EvaluationError::EmptyDataset)?;
        info!(
            samples = metrics.sample_count,
            r2 = metrics.r2,
            rmse = metrics.rmse,
            mae = metrics.mae,
            "Model evaluation complete"
        );
        Ok(metrics)
    }
}
