//! ONNX Runtime inference using tract
//!
//! Runs a regressor exported to ONNX from the training pipeline. The model
//! takes one encoded feature row and returns the predicted price as its first
//! output value.

use super::features::FeatureLayout;
use super::PriceRegressor;
use crate::models::VehicleRecord;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Declared kind for ONNX artifacts
pub const ONNX_KIND: &str = "OnnxRegressor";

/// Maximum inference latency before warning (5ms target)
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based regressor using tract for lightweight inference
pub struct OnnxRegressor {
    model: TractModel,
    layout: FeatureLayout,
}

impl OnnxRegressor {
    /// Create a regressor from model bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self> {
        let layout = FeatureLayout::standard();
        let model = Self::load_model(model_bytes, layout.width())?;
        Ok(Self { model, layout })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8], num_features: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Convert a record to the model's input tensor
    fn record_to_tensor(&self, record: &VehicleRecord) -> Result<Tensor> {
        let data: Vec<f32> = self
            .layout
            .encode(record)
            .into_iter()
            .map(|v| v as f32)
            .collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, self.layout.width()), data)
            .context("Failed to shape feature row")?;
        Ok(array.into())
    }
}

impl PriceRegressor for OnnxRegressor {
    fn predict(&self, record: &VehicleRecord) -> Result<f64> {
        let start = Instant::now();

        let input = self.record_to_tensor(record)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let output = output.cast_to::<f32>()?;
        let price = output
            .as_slice::<f32>()?
            .first()
            .copied()
            .context("Model output is empty")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(f64::from(price))
    }

    fn kind(&self) -> &str {
        ONNX_KIND
    }

    fn is_reentrant(&self) -> bool {
        // SimplePlan::run builds a fresh state per call
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(OnnxRegressor::from_bytes(b"definitely not a protobuf").is_err());
    }
}
