//! Core data models for the price predictor

use crate::error::{PredictionErrorKind, ValidationError, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Wire names of the eight vehicle attributes
pub mod fields {
    pub const BRAND: &str = "Brand";
    pub const BODY_STYLE: &str = "Model";
    pub const YEAR: &str = "Year";
    pub const KM_DRIVEN: &str = "KM_Driven";
    pub const FUEL: &str = "Fuel";
    pub const SELLER_TYPE: &str = "Seller_Type";
    pub const TRANSMISSION: &str = "Transmission";
    pub const OWNER: &str = "Owner";

    /// Every required field, in schema order
    pub const REQUIRED: [&str; 8] = [
        BRAND,
        BODY_STYLE,
        YEAR,
        KM_DRIVEN,
        FUEL,
        SELLER_TYPE,
        TRANSMISSION,
        OWNER,
    ];
}

/// Oldest accepted model year
pub const YEAR_MIN: i64 = 1900;

/// Newest accepted model year
pub const YEAR_MAX: i64 = 2030;

/// A categorical attribute with a fixed set of wire spellings
pub trait ClosedSet: Sized + Copy + 'static {
    /// Parse an exact wire spelling
    fn from_wire(value: &str) -> Option<Self>;

    /// Wire spelling of this value
    fn as_wire(&self) -> &'static str;

    /// All accepted spellings, in declaration order
    fn allowed_values() -> Vec<&'static str>;
}

macro_rules! closed_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl ClosedSet for $name {
            fn from_wire(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn as_wire(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            fn allowed_values() -> Vec<&'static str> {
                vec![$($wire),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_wire())
            }
        }
    };
}

closed_set! {
    /// Vehicle manufacturer
    Brand {
        Toyota => "Toyota",
        Honda => "Honda",
        Ford => "Ford",
        Bmw => "BMW",
        Mercedes => "Mercedes",
        Audi => "Audi",
        Volkswagen => "Volkswagen",
        Hyundai => "Hyundai",
    }
}

closed_set! {
    /// Body style, sent on the wire as `Model`
    BodyStyle {
        Sedan => "Sedan",
        Suv => "SUV",
        Hatchback => "Hatchback",
        Coupe => "Coupe",
        Truck => "Truck",
        Convertible => "Convertible",
    }
}

closed_set! {
    FuelType {
        Petrol => "Petrol",
        Diesel => "Diesel",
        Electric => "Electric",
        Hybrid => "Hybrid",
    }
}

closed_set! {
    SellerType {
        Individual => "Individual",
        Dealer => "Dealer",
        TrustmarkDealer => "Trustmark Dealer",
    }
}

closed_set! {
    Transmission {
        Manual => "Manual",
        Automatic => "Automatic",
    }
}

closed_set! {
    /// Ownership history
    OwnerCount {
        First => "First Owner",
        Second => "Second Owner",
        Third => "Third Owner",
        FourthAndAbove => "Fourth & Above Owner",
    }
}

/// A vehicle description that has passed validation.
///
/// The only way to obtain one is [`crate::validator::validate`], so holders
/// never need to re-check field constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleRecord {
    #[serde(rename = "Brand")]
    brand: Brand,
    #[serde(rename = "Model")]
    body_style: BodyStyle,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "KM_Driven")]
    km_driven: u64,
    #[serde(rename = "Fuel")]
    fuel_type: FuelType,
    #[serde(rename = "Seller_Type")]
    seller_type: SellerType,
    #[serde(rename = "Transmission")]
    transmission: Transmission,
    #[serde(rename = "Owner")]
    owner_count: OwnerCount,
}

impl VehicleRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        brand: Brand,
        body_style: BodyStyle,
        year: i32,
        km_driven: u64,
        fuel_type: FuelType,
        seller_type: SellerType,
        transmission: Transmission,
        owner_count: OwnerCount,
    ) -> Self {
        Self {
            brand,
            body_style,
            year,
            km_driven,
            fuel_type,
            seller_type,
            transmission,
            owner_count,
        }
    }

    pub fn brand(&self) -> Brand {
        self.brand
    }

    pub fn body_style(&self) -> BodyStyle {
        self.body_style
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn km_driven(&self) -> u64 {
        self.km_driven
    }

    pub fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    pub fn seller_type(&self) -> SellerType {
        self.seller_type
    }

    pub fn transmission(&self) -> Transmission {
        self.transmission
    }

    pub fn owner_count(&self) -> OwnerCount {
        self.owner_count
    }

    /// Categorical attributes as `(wire field, wire value)` pairs, in the
    /// column order used by the training pipeline
    pub fn categorical_values(&self) -> [(&'static str, &'static str); 6] {
        [
            (fields::BRAND, self.brand.as_wire()),
            (fields::BODY_STYLE, self.body_style.as_wire()),
            (fields::FUEL, self.fuel_type.as_wire()),
            (fields::SELLER_TYPE, self.seller_type.as_wire()),
            (fields::TRANSMISSION, self.transmission.as_wire()),
            (fields::OWNER, self.owner_count.as_wire()),
        ]
    }
}

/// Information about the loaded regression artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Declared type name of the artifact
    #[serde(rename = "model_type")]
    pub artifact_kind: String,
    pub loaded_at: DateTime<Utc>,
    #[serde(rename = "model_path")]
    pub source_path: PathBuf,
    /// SHA-256 of the artifact blob, hex encoded; empty for in-memory artifacts
    pub checksum: String,
    pub size_bytes: u64,
}

/// Successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSuccess {
    #[serde(rename = "predicted_price")]
    pub price: f64,
    pub formatted_price: String,
    pub confidence: f64,
    pub model_info: ModelMetadata,
    pub input_features: VehicleRecord,
}

/// Failed prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionFailure {
    #[serde(rename = "error_type")]
    pub error_kind: PredictionErrorKind,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ValidationError>,
}

impl PredictionFailure {
    pub fn new(error_kind: PredictionErrorKind, message: impl Into<String>) -> Self {
        Self {
            error_kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            error_kind: PredictionErrorKind::ValidationError,
            message: errors.to_string(),
            details: errors.into_inner(),
        }
    }
}

/// Outcome of a single prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PredictionResult {
    Success(PredictionSuccess),
    Failure(PredictionFailure),
}

impl PredictionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResult::Success(_))
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            PredictionResult::Success(s) => Some(s.price),
            PredictionResult::Failure(_) => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            PredictionResult::Success(s) => Some(s.confidence),
            PredictionResult::Failure(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<PredictionErrorKind> {
        match self {
            PredictionResult::Success(_) => None,
            PredictionResult::Failure(f) => Some(f.error_kind),
        }
    }

    /// Label used for metrics and logs
    pub fn outcome(&self) -> &'static str {
        match self {
            PredictionResult::Success(_) => "success",
            PredictionResult::Failure(f) => f.error_kind.as_label(),
        }
    }
}
