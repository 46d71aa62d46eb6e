//! Query result model structs.
//!
//! All structs derive `Serialize` so they can be written out as JSON or CSV.

use serde::Serialize;

/// A single (date, value) pair. Dates are ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateValue {
    pub date: String,
    pub value: f64,
}

/// Stored aquifer properties of one WAP with its stream depletion factor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WellInfo {
    pub wap: String,
    /// Distance to the stream (m)
    pub distance: f64,
    pub storage_coefficient: f64,
    /// Transmissivity (m²/day)
    pub transmissivity: f64,
    /// Stream depletion factor L²S/T (days)
    pub sdf: f64,
}

/// Inclusive range of dates covered by the pumping table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Total pumping and depletion volume per WAP over the stored period.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WapSummary {
    pub wap: String,
    pub total_pumping: f64,
    pub total_depletion: f64,
    /// Number of days with a missing pumping reading
    pub missing_days: i64,
}
