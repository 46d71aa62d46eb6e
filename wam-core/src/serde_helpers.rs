//! Field (de)serializers for the loosely typed CSV exports the model is fed
//! with: day-first dates, whole numbers written as floats ("3.0"), and
//! numeric cells that may be empty or "NaN".

use serde::{Deserialize, Deserializer, Serializer};

/// Tokens treated as a missing value in numeric cells.
pub const MISSING_TOKENS: [&str; 6] = ["", "nan", "na", "n/a", "null", "none"];

/// True if `s` is one of the [`MISSING_TOKENS`] (case-insensitive).
pub fn is_missing(s: &str) -> bool {
    let lowered = s.trim().to_lowercase();
    MISSING_TOKENS.contains(&lowered.as_str())
}

/// Parse a numeric cell, mapping missing tokens to `None`.
pub fn parse_optional_number(s: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    if is_missing(s) {
        return Ok(None);
    }
    s.trim().parse::<f64>().map(|v| if v.is_nan() { None } else { Some(v) })
}

/// Parse a whole number that may be written as a float ("3.0").
pub fn parse_whole_number(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return Some(n);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Some(v as u32),
        _ => None,
    }
}

/// Dates accepted in any format `wam_utils::dates::parse_date_flexible`
/// understands, written back day-first.
pub mod day_first_date {
    use super::*;
    use serde::de::Error as _;
    use chrono::NaiveDate;
    use wam_utils::dates::{format_day_first, parse_date_flexible};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_day_first(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date_flexible(&raw).map_err(D::Error::custom)
    }
}

/// Numeric cells where empty or NaN means "not specified".
pub mod optional_number {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_optional_number(&raw).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

/// Month numbers and band numbers, tolerating "7.0".
pub mod whole_number {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_whole_number(&raw)
            .ok_or_else(|| D::Error::custom(format!("expected a whole number, got '{}'", raw)))
    }
}
