//! Small lookup tables: allow-lists of WAPs or consents, and consumption
//! fractions per use type.

use crate::error::{CoreError, Result};
use crate::serde_helpers::parse_optional_number;
use csv::ReaderBuilder;
use std::collections::{BTreeSet, HashMap};

/// Read the distinct values of `column` from a CSV string.
pub fn parse_id_list(csv_object: &str, column: &str) -> Result<BTreeSet<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_object.as_bytes());
    let index = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| CoreError::MissingColumn(column.to_string()))?;
    let mut ids = BTreeSet::new();
    for row in rdr.records() {
        let record = row?;
        if let Some(value) = record.get(index).map(str::trim).filter(|v| !v.is_empty()) {
            ids.insert(value.to_string());
        }
    }
    Ok(ids)
}

/// Consumption fraction per (renamed) use type. Positional columns:
/// use type, consumption.
pub fn parse_consumption_csv(csv_object: &str) -> Result<HashMap<String, f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_object.as_bytes());
    let mut table = HashMap::new();
    for row in rdr.records() {
        let record = row?;
        let use_type = record.get(0).unwrap_or("").trim();
        let raw = record.get(1).unwrap_or("");
        let value = parse_optional_number(raw)
            .map_err(|_| CoreError::InvalidFormat(format!("consumption '{}' for '{}'", raw, use_type)))?;
        if let (false, Some(value)) = (use_type.is_empty(), value) {
            table.insert(use_type.to_string(), value);
        }
    }
    Ok(table)
}
