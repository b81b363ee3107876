//! Price prediction command

use anyhow::{bail, Context, Result};
use clap::Args;
use pricing_core::fields;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_confidence, print_error, print_json, print_success, print_table, OutputFormat};

/// Vehicle description, given as flags or as a JSON file
#[derive(Args, Debug, Default)]
pub struct VehicleArgs {
    /// JSON file holding the vehicle record (flags override its fields)
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Manufacturer, e.g. Toyota
    #[arg(long)]
    pub brand: Option<String>,

    /// Body style, e.g. Sedan or SUV
    #[arg(long)]
    pub model: Option<String>,

    /// Model year
    #[arg(long)]
    pub year: Option<i64>,

    /// Odometer reading in kilometres
    #[arg(long)]
    pub km_driven: Option<i64>,

    /// Fuel type, e.g. Petrol
    #[arg(long)]
    pub fuel: Option<String>,

    /// Seller type, e.g. Individual
    #[arg(long)]
    pub seller_type: Option<String>,

    /// Transmission, Manual or Automatic
    #[arg(long)]
    pub transmission: Option<String>,

    /// Ownership history, e.g. "First Owner"
    #[arg(long)]
    pub owner: Option<String>,
}

impl VehicleArgs {
    /// Build the request body; missing fields are left for the service to report
    pub fn to_record(&self) -> Result<Map<String, Value>> {
        let mut record = match &self.input {
            Some(path) => read_record(path)?,
            None => Map::new(),
        };

        let text_fields = [
            (fields::BRAND, &self.brand),
            (fields::BODY_STYLE, &self.model),
            (fields::FUEL, &self.fuel),
            (fields::SELLER_TYPE, &self.seller_type),
            (fields::TRANSMISSION, &self.transmission),
            (fields::OWNER, &self.owner),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                record.insert(key.to_string(), Value::from(value.as_str()));
            }
        }
        if let Some(year) = self.year {
            record.insert(fields::YEAR.to_string(), Value::from(year));
        }
        if let Some(km) = self.km_driven {
            record.insert(fields::KM_DRIVEN.to_string(), Value::from(km));
        }

        if record.is_empty() {
            bail!("No vehicle given; pass --input or the vehicle flags (see --help)");
        }
        Ok(record)
    }
}

fn read_record(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("{} must contain a JSON object", path.display()),
    }
}

/// Row for the prediction table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Model")]
    model_type: String,
}

/// Request a price prediction
pub async fn predict(client: &ApiClient, vehicle: &VehicleArgs, format: OutputFormat) -> Result<()> {
    let record = vehicle.to_record()?;
    let response = client.predict(&Value::Object(record)).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            if !response.success {
                print_error(&format!(
                    "{}: {}",
                    response.error_type.as_deref().unwrap_or("Error"),
                    response.error.as_deref().unwrap_or("prediction failed")
                ));
                for detail in &response.details {
                    println!("  - {}", detail);
                }
            } else {
                print_success("Prediction complete");
                print_table(vec![PredictionRow {
                    price: response
                        .formatted_price
                        .clone()
                        .or_else(|| response.predicted_price.map(|p| format!("{:.2}", p)))
                        .unwrap_or_default(),
                    confidence: response.confidence.map(color_confidence).unwrap_or_default(),
                    model_type: response
                        .model_info
                        .as_ref()
                        .map(|m| m.artifact_kind.clone())
                        .unwrap_or_default(),
                }]);
            }
        }
    }

    if !response.success {
        bail!("Prediction failed");
    }
    Ok(())
}
