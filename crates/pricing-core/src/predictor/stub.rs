//! Deterministic in-memory regressor for tests and local runs

use super::PriceRegressor;
use crate::models::{BodyStyle, Brand, VehicleRecord};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Declared kind for stub artifacts
pub const STUB_KIND: &str = "StubRegressor";

/// Model year the depreciation curve is anchored to
const REFERENCE_YEAR: i32 = 2024;

/// Floor for heuristic prices
const MIN_HEURISTIC_PRICE: f64 = 500.0;

#[derive(Debug, Clone)]
enum Mode {
    Fixed(f64),
    Depreciation,
    Failing(String),
}

/// Stub regressor with a fixed, heuristic, or failing response
#[derive(Debug, Clone)]
pub struct StubRegressor {
    mode: Mode,
    calls: Arc<AtomicU64>,
}

impl StubRegressor {
    /// Always predict `price`
    pub fn fixed(price: f64) -> Self {
        Self::with_mode(Mode::Fixed(price))
    }

    /// Predict from a simple brand, body style, age and mileage curve
    pub fn depreciation() -> Self {
        Self::with_mode(Mode::Depreciation)
    }

    /// Fail every call with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_mode(Mode::Failing(message.into()))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of `predict` invocations
    pub fn call_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.calls)
    }

    fn depreciated_price(record: &VehicleRecord) -> f64 {
        let base = match record.brand() {
            Brand::Bmw | Brand::Mercedes | Brand::Audi => 42_000.0,
            Brand::Toyota | Brand::Honda | Brand::Volkswagen => 26_000.0,
            Brand::Ford | Brand::Hyundai => 22_000.0,
        };
        let body = match record.body_style() {
            BodyStyle::Suv | BodyStyle::Truck => 1.2,
            BodyStyle::Convertible | BodyStyle::Coupe => 1.1,
            BodyStyle::Sedan => 1.0,
            BodyStyle::Hatchback => 0.85,
        };
        let age = (REFERENCE_YEAR - record.year()).max(0);
        let age_factor = 0.9_f64.powi(age);
        let km_factor = 1.0 / (1.0 + record.km_driven() as f64 / 250_000.0);

        (base * body * age_factor * km_factor).max(MIN_HEURISTIC_PRICE)
    }
}

impl PriceRegressor for StubRegressor {
    fn predict(&self, record: &VehicleRecord) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.mode {
            Mode::Fixed(price) => Ok(*price),
            Mode::Depreciation => Ok(Self::depreciated_price(record)),
            Mode::Failing(message) => bail!("{}", message),
        }
    }

    fn kind(&self) -> &str {
        STUB_KIND
    }
}
