//! Feature encoding for numeric artifacts
//!
//! Mirrors the column transformer used at training time: numeric columns are
//! passed through, then each categorical column is one-hot encoded with its
//! categories in sorted order.

use crate::models::{
    fields, BodyStyle, Brand, ClosedSet, FuelType, OwnerCount, SellerType, Transmission,
    VehicleRecord,
};
use std::collections::HashMap;

/// Numeric columns, passed through unchanged
pub const NUMERIC_COLUMNS: [&str; 2] = [fields::YEAR, fields::KM_DRIVEN];

/// Column layout of the encoded feature row
#[derive(Debug, Clone)]
pub struct FeatureLayout {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureLayout {
    /// The layout produced by the training pipeline
    pub fn standard() -> Self {
        let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        push_one_hot::<Brand>(&mut columns, fields::BRAND);
        push_one_hot::<BodyStyle>(&mut columns, fields::BODY_STYLE);
        push_one_hot::<FuelType>(&mut columns, fields::FUEL);
        push_one_hot::<SellerType>(&mut columns, fields::SELLER_TYPE);
        push_one_hot::<Transmission>(&mut columns, fields::TRANSMISSION);
        push_one_hot::<OwnerCount>(&mut columns, fields::OWNER);

        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { columns, index }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Encode a record into a flat row of `width()` values
    pub fn encode(&self, record: &VehicleRecord) -> Vec<f64> {
        let mut row = vec![0.0; self.width()];
        row[0] = f64::from(record.year());
        row[1] = record.km_driven() as f64;

        for (field, value) in record.categorical_values() {
            if let Some(i) = self.index_of(&one_hot_column(field, value)) {
                row[i] = 1.0;
            }
        }
        row
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::standard()
    }
}

fn one_hot_column(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}

fn push_one_hot<T: ClosedSet>(columns: &mut Vec<String>, field: &str) {
    let mut values = T::allowed_values();
    values.sort_unstable();
    columns.extend(values.into_iter().map(|value| one_hot_column(field, value)));
}
