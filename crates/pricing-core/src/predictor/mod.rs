//! Regression artifacts and prediction post-processing

mod features;
mod forest;
mod inference;
mod loader;
mod output;
mod stub;

pub use features::{FeatureLayout, NUMERIC_COLUMNS};
pub use forest::ForestRegressor;
pub use inference::{OnnxRegressor, ONNX_KIND};
pub use loader::{compute_checksum, load_artifact, ArtifactFormat, LoadedArtifact};
pub use output::{
    confidence, format_price, HIGH_MILEAGE_KM, LOW_MILEAGE_KM, OLD_YEAR_CUTOFF, RECENT_YEARS,
};
pub use stub::{StubRegressor, STUB_KIND};

use crate::models::VehicleRecord;
use anyhow::Result;

/// Trait for price regression artifacts
pub trait PriceRegressor: Send + Sync {
    /// Predict the sale price of a validated vehicle
    fn predict(&self, record: &VehicleRecord) -> Result<f64>;

    /// Declared type name of the artifact
    fn kind(&self) -> &str;

    /// Whether concurrent `predict` calls are safe without serialization
    fn is_reentrant(&self) -> bool {
        false
    }
}
