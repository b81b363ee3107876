//! Offline evaluation of a loaded artifact against labelled samples

use crate::error::ValidationErrors;
use crate::validator::RawRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Key carrying the observed sale price in a labelled sample
pub const TARGET_FIELD: &str = "Selling_Price";

/// A raw vehicle record with its observed sale price
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledRecord {
    pub features: RawRecord,
    pub actual_price: f64,
}

impl LabelledRecord {
    pub fn new(features: RawRecord, actual_price: f64) -> Self {
        Self {
            features,
            actual_price,
        }
    }

    /// Split a dataset row into features and its `Selling_Price` label
    pub fn from_object(mut object: RawRecord) -> Option<Self> {
        let actual_price = object.remove(TARGET_FIELD)?.as_f64()?;
        Some(Self::new(object, actual_price))
    }
}

/// Parse a JSON array of labelled rows
pub fn parse_dataset(value: &Value) -> Result<Vec<LabelledRecord>, EvaluationError> {
    let rows = value.as_array().ok_or(EvaluationError::MalformedDataset {
        index: None,
        reason: "expected a JSON array of records".to_string(),
    })?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let object = row.as_object().ok_or(EvaluationError::MalformedDataset {
                index: Some(index),
                reason: "row is not a JSON object".to_string(),
            })?;
            LabelledRecord::from_object(object.clone()).ok_or(EvaluationError::MalformedDataset {
                index: Some(index),
                reason: format!("missing numeric {}", TARGET_FIELD),
            })
        })
        .collect()
}

/// Regression quality metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Mean absolute percentage error over non-zero actuals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mape: Option<f64>,
    pub sample_count: usize,
}

impl EvaluationMetrics {
    /// Compute metrics from paired actual and predicted prices.
    ///
    /// Returns `None` when there are no pairs.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return None;
        }
        let pairs = actual.iter().zip(predicted).take(n);
        let count = n as f64;

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut pct_count = 0usize;
        for (a, p) in pairs {
            let residual = a - p;
            abs_sum += residual.abs();
            sq_sum += residual * residual;
            if *a != 0.0 {
                pct_sum += (residual / a).abs();
                pct_count += 1;
            }
        }

        let mean_actual = actual[..n].iter().sum::<f64>() / count;
        let total_variance: f64 = actual[..n].iter().map(|a| (a - mean_actual).powi(2)).sum();

        let r2 = if total_variance == 0.0 {
            if sq_sum == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - sq_sum / total_variance
        };

        Some(Self {
            r2,
            rmse: (sq_sum / count).sqrt(),
            mae: abs_sum / count,
            mape: (pct_count > 0).then(|| pct_sum / pct_count as f64 * 100.0),
            sample_count: n,
        })
    }
}

/// Why an evaluation run could not produce metrics
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Model not initialized")]
    NotInitialized,

    #[error("Evaluation dataset is empty")]
    EmptyDataset,

    #[error("Malformed dataset{}: {reason}", .index.map(|i| format!(" at row {}", i)).unwrap_or_default())]
    MalformedDataset { index: Option<usize>, reason: String },

    #[error("Sample {index} failed validation: {errors}")]
    InvalidSample {
        index: usize,
        errors: ValidationErrors,
    },

    #[error("Inference failed on sample {index}: {message}")]
    Inference { index: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_predictor() {
        let actual = [5000.0, 7500.0, 12000.0];
        let metrics = EvaluationMetrics::compute(&actual, &actual).unwrap();

        assert_eq!(metrics.r2, 1.0);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.mape, Some(0.0));
        assert_eq!(metrics.sample_count, 3);
    }

    #[test]
    fn test_known_residuals() {
        let actual = [100.0, 200.0, 300.0];
        let predicted = [110.0, 190.0, 300.0];
        let metrics = EvaluationMetrics::compute(&actual, &predicted).unwrap();

        assert!(approx(metrics.mae, 20.0 / 3.0));
        assert!(approx(metrics.rmse, (200.0_f64 / 3.0).sqrt()));
        // ss_res = 200, ss_tot = 20000
        assert!(approx(metrics.r2, 0.99));
        assert!(approx(metrics.mape.unwrap(), (10.0 + 5.0 + 0.0) / 3.0));
    }

    #[test]
    fn test_constant_target() {
        let actual = [4000.0, 4000.0];
        assert_eq!(EvaluationMetrics::compute(&actual, &actual).unwrap().r2, 1.0);
        assert_eq!(
            EvaluationMetrics::compute(&actual, &[4000.0, 4100.0]).unwrap().r2,
            0.0
        );
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let metrics = EvaluationMetrics::compute(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert!(metrics.mape.is_none());
        assert!(approx(metrics.mae, 1.5));

        assert!(EvaluationMetrics::compute(&[], &[]).is_none());
    }

    #[test]
    fn test_parse_dataset() {
        let data = json!([
            { "Brand": "Honda", "Year": 2019, "Selling_Price": 9500 },
            { "Brand": "Ford", "Year": 2012, "Selling_Price": 4200.5 }
        ]);
        let rows = parse_dataset(&data).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].actual_price, 9500.0);
        assert!(!rows[0].features.contains_key(TARGET_FIELD));
        assert_eq!(rows[1].features["Brand"], "Ford");
    }

    #[test]
    fn test_parse_dataset_rejects_bad_rows() {
        let err = parse_dataset(&json!({ "rows": [] })).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedDataset { index: None, .. }));

        let err = parse_dataset(&json!([{ "Brand": "Ford" }])).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedDataset { index: Some(0), .. }));
        assert!(err.to_string().contains("Selling_Price"));

        let err = parse_dataset(&json!([{ "Selling_Price": 1 }, 7])).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedDataset { index: Some(1), .. }));
    }
}
