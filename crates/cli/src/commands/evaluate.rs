//! Offline artifact evaluation against a labelled dataset

use anyhow::{Context, Result};
use pricing_core::{evaluation::parse_dataset, EvaluationMetrics, PricePredictor};
use serde_json::Value;
use std::path::Path;
use tabled::Tabled;

use crate::output::{print_json, print_success, print_table, OutputFormat};

/// Row for the metrics table
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Load `model` locally and score it against the samples in `data`
pub fn run_evaluation(model: &Path, data: &Path, sha256: Option<&str>) -> Result<EvaluationMetrics> {
    let predictor = PricePredictor::new();
    match sha256 {
        Some(expected) => predictor.initialize_with_checksum(model, expected),
        None => predictor.initialize(model),
    }
    .with_context(|| format!("Failed to load model {}", model.display()))?;

    let content = std::fs::read_to_string(data)
        .with_context(|| format!("Failed to read {}", data.display()))?;
    let dataset: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", data.display()))?;
    let samples = parse_dataset(&dataset)?;

    Ok(predictor.evaluate(&samples)?)
}

pub fn evaluate(model: &Path, data: &Path, sha256: Option<&str>, format: OutputFormat) -> Result<()> {
    let metrics = run_evaluation(model, data, sha256)?;

    match format {
        OutputFormat::Json => print_json(&metrics)?,
        OutputFormat::Table => {
            print_success(&format!("Evaluated {} samples", metrics.sample_count));
            print_table(vec![
                MetricRow {
                    name: "R²",
                    value: format!("{:.4}", metrics.r2),
                },
                MetricRow {
                    name: "RMSE",
                    value: format!("{:.2}", metrics.rmse),
                },
                MetricRow {
                    name: "MAE",
                    value: format!("{:.2}", metrics.mae),
                },
                MetricRow {
                    name: "MAPE",
                    value: metrics
                        .mape
                        .map(|m| format!("{:.2}%", m))
                        .unwrap_or_else(|| "n/a".to_string()),
                },
            ]);
        }
    }

    Ok(())
}
