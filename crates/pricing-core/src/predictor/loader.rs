//! Artifact loading from disk
//!
//! Reads a serialized regressor once, checks its digest, and picks the
//! implementation from the file extension.

use super::forest::ForestRegressor;
use super::inference::OnnxRegressor;
use super::PriceRegressor;
use crate::error::LoadError;
use crate::models::ModelMetadata;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Supported serialized artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Onnx,
    Forest,
}

impl ArtifactFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "onnx" => Some(ArtifactFormat::Onnx),
            "json" => Some(ArtifactFormat::Forest),
            _ => None,
        }
    }
}

/// A deserialized artifact together with its metadata
pub struct LoadedArtifact {
    pub artifact: Box<dyn PriceRegressor>,
    pub metadata: ModelMetadata,
}

/// Load an artifact, optionally verifying its SHA-256 digest first
pub fn load_artifact(path: &Path, expected_sha256: Option<&str>) -> Result<LoadedArtifact, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let deserialization_failed = |reason: String| LoadError::DeserializationFailed {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = fs::read(path).map_err(|e| deserialization_failed(format!("unreadable: {}", e)))?;
    let checksum = compute_checksum(&bytes);

    if let Some(expected) = expected_sha256 {
        if !expected.trim().eq_ignore_ascii_case(&checksum) {
            return Err(LoadError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: expected.trim().to_string(),
                actual: checksum,
            });
        }
        debug!(checksum = %checksum, "Model checksum validated");
    }

    let format = ArtifactFormat::from_path(path).ok_or_else(|| {
        deserialization_failed("unsupported artifact format (expected .onnx or .json)".to_string())
    })?;

    let artifact: Box<dyn PriceRegressor> = match format {
        ArtifactFormat::Onnx => Box::new(
            OnnxRegressor::from_bytes(&bytes).map_err(|e| deserialization_failed(format!("{:#}", e)))?,
        ),
        ArtifactFormat::Forest => Box::new(
            ForestRegressor::from_slice(&bytes)
                .map_err(|e| deserialization_failed(format!("{:#}", e)))?,
        ),
    };

    let metadata = ModelMetadata {
        artifact_kind: artifact.kind().to_string(),
        loaded_at: chrono::Utc::now(),
        source_path: path.to_path_buf(),
        checksum,
        size_bytes: bytes.len() as u64,
    };

    info!(
        path = %path.display(),
        model_type = %metadata.artifact_kind,
        size = metadata.size_bytes,
        "Model loaded"
    );

    Ok(LoadedArtifact { artifact, metadata })
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
