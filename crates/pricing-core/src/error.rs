//! Error taxonomy surfaced to callers

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single problem found in a raw vehicle record
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum ValidationError {
    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("{field} {reason}")]
    InvalidRange { field: &'static str, reason: String },

    #[error("Invalid {field}. Must be one of: {}", .allowed_values.join(", "))]
    InvalidEnum {
        field: &'static str,
        allowed_values: Vec<&'static str>,
    },
}

impl ValidationError {
    /// Field the error refers to, if it is about a single field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingFields { .. } => None,
            ValidationError::InvalidRange { field, .. } => Some(field),
            ValidationError::InvalidEnum { field, .. } => Some(field),
        }
    }
}

/// Every problem found in one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Failure while loading the regression artifact at startup
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Model file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to deserialize model from {}: {reason}", .path.display())]
    DeserializationFailed { path: PathBuf, reason: String },

    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Model already initialized from {}", .path.display())]
    AlreadyInitialized { path: PathBuf },
}

impl LoadError {
    /// Short tag for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::FileNotFound { .. } => "FileNotFound",
            LoadError::DeserializationFailed { .. } => "DeserializationFailed",
            LoadError::ChecksumMismatch { .. } => "ChecksumMismatch",
            LoadError::AlreadyInitialized { .. } => "AlreadyInitialized",
        }
    }
}

/// Kind tag carried by a failed prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PredictionErrorKind {
    ValidationError,
    NotInitialized,
    InferenceError,
}

impl PredictionErrorKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            PredictionErrorKind::ValidationError => "validation_error",
            PredictionErrorKind::NotInitialized => "not_initialized",
            PredictionErrorKind::InferenceError => "inference_error",
        }
    }
}

impl fmt::Display for PredictionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PredictionErrorKind::ValidationError => "ValidationError",
            PredictionErrorKind::NotInitialized => "NotInitialized",
            PredictionErrorKind::InferenceError => "InferenceError",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_joined_with_semicolons() {
        let errors = ValidationErrors::new(vec![
            ValidationError::InvalidRange {
                field: "Year",
                reason: "must be between 1900 and 2030".to_string(),
            },
            ValidationError::InvalidEnum {
                field: "Fuel",
                allowed_values: vec!["Petrol", "Diesel"],
            },
        ]);

        assert_eq!(
            errors.to_string(),
            "Year must be between 1900 and 2030; Invalid Fuel. Must be one of: Petrol, Diesel"
        );
    }

    #[test]
    fn test_validation_error_serializes_with_kind_tag() {
        let error = ValidationError::MissingFields {
            fields: vec!["Owner", "Fuel"],
        };
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["kind"], "MissingFields");
        assert_eq!(json["fields"][0], "Owner");
    }

    #[test]
    fn test_error_kind_wire_names() {
        let json = serde_json::to_value(PredictionErrorKind::NotInitialized).unwrap();
        assert_eq!(json, "NotInitialized");
        assert_eq!(PredictionErrorKind::InferenceError.to_string(), "InferenceError");
    }
}
