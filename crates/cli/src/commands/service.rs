//! Service introspection commands: health, model info, feature catalog

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, FeaturesResponse, ModelInfoResponse, ServiceHealth};
use crate::output::{
    color_status, format_bytes, format_timestamp, print_info, print_json, print_table,
    print_warning, short_checksum, OutputFormat,
};

/// Row for the feature catalog table
#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Accepted")]
    accepted: String,
}

/// Row for key/value detail tables
#[derive(Tabled)]
struct DetailRow {
    #[tabled(rename = "Property")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn detail(key: &str, value: impl Into<String>) -> DetailRow {
    DetailRow {
        key: key.to_string(),
        value: value.into(),
    }
}

/// Show the accepted input fields
pub async fn show_features(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: FeaturesResponse = client.get("api/v1/features").await?;

    match format {
        OutputFormat::Json => print_json(&response.features)?,
        OutputFormat::Table => {
            let rows = response
                .features
                .into_iter()
                .map(|(name, info)| {
                    let accepted = match (&info.valid_values, info.min_value, info.max_value) {
                        (Some(values), _, _) => values.join(", "),
                        (None, Some(min), Some(max)) => format!("{} to {}", min, max),
                        (None, Some(min), None) => format!(">= {}", min),
                        _ => String::new(),
                    };
                    FeatureRow {
                        name,
                        kind: info.kind,
                        required: if info.required { "yes" } else { "no" }.to_string(),
                        accepted,
                    }
                })
                .collect();
            print_table::<FeatureRow>(rows);
        }
    }

    Ok(())
}

/// Show details of the loaded artifact
pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: ModelInfoResponse = client.get("api/v1/model/info").await?;
    let info = response.model_info;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            let metadata = &info.model_metadata;
            print_table(vec![
                detail("Model type", info.model_type.clone()),
                detail("Path", metadata.source_path.display().to_string()),
                detail("Loaded at", format_timestamp(&metadata.loaded_at)),
                detail("Checksum", short_checksum(&metadata.checksum)),
                detail("Size", format_bytes(metadata.size_bytes)),
                detail("Encoded columns", info.feature_names.len().to_string()),
            ]);
        }
    }

    Ok(())
}

/// Show service health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: ServiceHealth = client.get("api/v1/health").await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("Status:  {}", color_status(&health.status));
            println!("Version: {}", health.version);
            match &health.model_info {
                Some(model) if health.model_loaded => print_info(&format!(
                    "Model {} loaded from {}",
                    model.artifact_kind,
                    model.source_path.display()
                )),
                _ => print_warning("No model loaded; predictions are unavailable"),
            }
        }
    }

    Ok(())
}
