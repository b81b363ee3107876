//! Prediction post-processing
//!
//! Confidence scoring and price formatting for artifact outputs.

use std::ops::RangeInclusive;

/// Model years that earn a confidence bonus
pub const RECENT_YEARS: RangeInclusive<i64> = 2015..=2023;

/// Model years before this lose confidence
pub const OLD_YEAR_CUTOFF: i64 = 2010;

/// Mileage below this earns a confidence bonus
pub const LOW_MILEAGE_KM: i64 = 100_000;

/// Mileage above this loses confidence
pub const HIGH_MILEAGE_KM: i64 = 200_000;

// Points are hundredths of confidence so every result is an exact decimal.
const BASE_POINTS: i64 = 80;
const YEAR_POINTS: i64 = 10;
const MILEAGE_POINTS: i64 = 5;
const MIN_POINTS: i64 = 10;
const MAX_POINTS: i64 = 100;

/// Heuristic confidence for a prediction, in [0.1, 1.0].
///
/// Not a calibrated uncertainty estimate: newer, lower-mileage vehicles score
/// higher because their prices are more predictable.
pub fn confidence(year: i64, km_driven: i64) -> f64 {
    let mut points = BASE_POINTS;

    if RECENT_YEARS.contains(&year) {
        points += YEAR_POINTS;
    } else if year < OLD_YEAR_CUTOFF {
        points -= YEAR_POINTS;
    }

    if km_driven < LOW_MILEAGE_KM {
        points += MILEAGE_POINTS;
    } else if km_driven > HIGH_MILEAGE_KM {
        points -= MILEAGE_POINTS;
    }

    points.clamp(MIN_POINTS, MAX_POINTS) as f64 / 100.0
}

/// Format a price as dollars with thousands separators, e.g. `$12,345.67`
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return format!("${}", price);
    }

    let fixed = format!("{:.2}", price.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_reference_points() {
        assert_eq!(confidence(2020, 50_000), 0.95);
        assert_eq!(confidence(2005, 250_000), 0.65);
        assert_eq!(confidence(2024, 150_000), 0.8);
        assert_eq!(confidence(2018, 50_000), 0.95);
    }

    #[test]
    fn test_confidence_breakpoints() {
        // Year boundaries
        assert_eq!(confidence(2015, 150_000), 0.9);
        assert_eq!(confidence(2023, 150_000), 0.9);
        assert_eq!(confidence(2014, 150_000), 0.8);
        assert_eq!(confidence(2010, 150_000), 0.8);
        assert_eq!(confidence(2009, 150_000), 0.7);

        // Mileage boundaries
        assert_eq!(confidence(2012, 99_999), 0.85);
        assert_eq!(confidence(2012, 100_000), 0.8);
        assert_eq!(confidence(2012, 200_000), 0.8);
        assert_eq!(confidence(2012, 200_001), 0.75);
    }

    #[test]
    fn test_confidence_bounded_for_any_input() {
        let years = [i64::MIN, -1, 0, 1899, 2009, 2010, 2015, 2023, 2024, 9999, i64::MAX];
        let kms = [i64::MIN, -1, 0, 99_999, 100_000, 200_000, 200_001, i64::MAX];
        for year in years {
            for km in kms {
                let c = confidence(year, km);
                assert!((0.1..=1.0).contains(&c), "confidence({}, {}) = {}", year, km, c);
            }
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0.0), "$0.00");
        assert_eq!(format_price(999.5), "$999.50");
        assert_eq!(format_price(1000.0), "$1,000.00");
        assert_eq!(format_price(12345.678), "$12,345.68");
        assert_eq!(format_price(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_price(-2500.0), "$-2,500.00");
    }
}
