//! Feature validation
//!
//! Turns an untyped JSON object into a [`VehicleRecord`], collecting every
//! problem in one pass so a caller can fix all of them in a single round trip.

use crate::error::{ValidationError, ValidationErrors};
use crate::models::{
    fields, BodyStyle, Brand, ClosedSet, FuelType, OwnerCount, SellerType, Transmission,
    VehicleRecord, YEAR_MAX, YEAR_MIN,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One raw input record as received from the transport layer
pub type RawRecord = Map<String, Value>;

/// Largest float that still converts to an integer without loss
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Validate a raw record.
///
/// Missing fields are reported on their own; type, range and enum checks run
/// only once every required field is present.
pub fn validate(raw: &RawRecord) -> Result<VehicleRecord, ValidationErrors> {
    let missing: Vec<&'static str> = fields::REQUIRED
        .iter()
        .copied()
        .filter(|field| !raw.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationErrors::new(vec![ValidationError::MissingFields {
            fields: missing,
        }]));
    }

    let mut errors = Vec::new();

    let brand = check_enum::<Brand>(raw, fields::BRAND, &mut errors);
    let body_style = check_enum::<BodyStyle>(raw, fields::BODY_STYLE, &mut errors);
    let year = check_integer(
        raw,
        fields::YEAR,
        |year| (YEAR_MIN..=YEAR_MAX).contains(&year),
        "must be between 1900 and 2030",
        &mut errors,
    )
    .and_then(|year| i32::try_from(year).ok());
    let km_driven = check_integer(
        raw,
        fields::KM_DRIVEN,
        |km| km >= 0,
        "must be non-negative",
        &mut errors,
    )
    .and_then(|km| u64::try_from(km).ok());
    let fuel_type = check_enum::<FuelType>(raw, fields::FUEL, &mut errors);
    let seller_type = check_enum::<SellerType>(raw, fields::SELLER_TYPE, &mut errors);
    let transmission = check_enum::<Transmission>(raw, fields::TRANSMISSION, &mut errors);
    let owner_count = check_enum::<OwnerCount>(raw, fields::OWNER, &mut errors);

    match (
        brand,
        body_style,
        year,
        km_driven,
        fuel_type,
        seller_type,
        transmission,
        owner_count,
    ) {
        (
            Some(brand),
            Some(body_style),
            Some(year),
            Some(km_driven),
            Some(fuel_type),
            Some(seller_type),
            Some(transmission),
            Some(owner_count),
        ) if errors.is_empty() => Ok(VehicleRecord::new(
            brand,
            body_style,
            year,
            km_driven,
            fuel_type,
            seller_type,
            transmission,
            owner_count,
        )),
        _ => Err(ValidationErrors::new(errors)),
    }
}

fn check_enum<T: ClosedSet>(
    raw: &RawRecord,
    field: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Option<T> {
    let parsed = raw
        .get(field)
        .and_then(Value::as_str)
        .and_then(|value| T::from_wire(value.trim()));
    if parsed.is_none() {
        errors.push(ValidationError::InvalidEnum {
            field,
            allowed_values: T::allowed_values(),
        });
    }
    parsed
}

fn check_integer(
    raw: &RawRecord,
    field: &'static str,
    in_range: impl Fn(i64) -> bool,
    range_reason: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<i64> {
    match raw.get(field).and_then(coerce_integer) {
        Some(value) if in_range(value) => Some(value),
        Some(_) => {
            errors.push(ValidationError::InvalidRange {
                field,
                reason: range_reason.to_string(),
            });
            None
        }
        None => {
            errors.push(ValidationError::InvalidRange {
                field,
                reason: "must be a valid integer".to_string(),
            });
            None
        }
    }
}

/// Coerce a JSON value to an integer: integers, integral floats, and
/// numeric strings are accepted
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Description of one accepted input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSpec {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Categorical,
    Numerical,
}

impl FeatureSpec {
    fn categorical<T: ClosedSet>() -> Self {
        Self {
            kind: FeatureKind::Categorical,
            required: true,
            valid_values: Some(T::allowed_values()),
            min_value: None,
            max_value: None,
        }
    }

    fn numerical(min_value: i64, max_value: Option<i64>) -> Self {
        Self {
            kind: FeatureKind::Numerical,
            required: true,
            valid_values: None,
            min_value: Some(min_value),
            max_value,
        }
    }
}

/// Accepted fields and their valid values, keyed by wire name
pub fn feature_catalog() -> BTreeMap<&'static str, FeatureSpec> {
    BTreeMap::from([
        (fields::BRAND, FeatureSpec::categorical::<Brand>()),
        (fields::BODY_STYLE, FeatureSpec::categorical::<BodyStyle>()),
        (fields::YEAR, FeatureSpec::numerical(YEAR_MIN, Some(YEAR_MAX))),
        (fields::KM_DRIVEN, FeatureSpec::numerical(0, None)),
        (fields::FUEL, FeatureSpec::categorical::<FuelType>()),
        (fields::SELLER_TYPE, FeatureSpec::categorical::<SellerType>()),
        (fields::TRANSMISSION, FeatureSpec::categorical::<Transmission>()),
        (fields::OWNER, FeatureSpec::categorical::<OwnerCount>()),
    ])
}
