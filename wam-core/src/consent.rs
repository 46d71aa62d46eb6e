use crate::error::{CoreError, Result};
use crate::serde_helpers::{day_first_date, optional_number, parse_whole_number, whole_number};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a consent authorises at a WAP.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Activity {
    #[serde(rename = "Take Groundwater")]
    TakeGroundwater,
    #[serde(rename = "Take Surface Water")]
    TakeSurfaceWater,
    #[serde(rename = "Divert Surface Water")]
    DivertSurfaceWater,
    #[serde(rename = "Discharge water to water")]
    Discharge,
}

impl Activity {
    /// Activities that appear under the model's WAP branches.
    pub const ABSTRACTIONS: [Activity; 3] = [
        Activity::TakeGroundwater,
        Activity::TakeSurfaceWater,
        Activity::DivertSurfaceWater,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Activity::TakeGroundwater => "Take Groundwater",
            Activity::TakeSurfaceWater => "Take Surface Water",
            Activity::DivertSurfaceWater => "Divert Surface Water",
            Activity::Discharge => "Discharge water to water",
        }
    }

    /// Takes count against consented volumes; diverts and discharges do not.
    pub fn is_take(&self) -> bool {
        matches!(self, Activity::TakeGroundwater | Activity::TakeSurfaceWater)
    }

    pub fn is_discharge(&self) -> bool {
        matches!(self, Activity::Discharge)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One consent / WAP / activity combination from the consents export.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub crc: String,
    pub wap: String,
    /// Model node name of the WAP
    pub wap_name: String,
    /// Unique WAP name within the consent; falls back to `wap_name`
    #[serde(default)]
    pub wap_name_long: Option<String>,
    #[serde(rename = "Activity")]
    pub activity: Activity,
    #[serde(rename = "fmDate", with = "day_first_date")]
    pub from_date: NaiveDate,
    #[serde(rename = "toDate", with = "day_first_date")]
    pub to_date: NaiveDate,
    #[serde(with = "whole_number")]
    pub from_month: u32,
    #[serde(with = "whole_number")]
    pub to_month: u32,
    #[serde(rename = "wap_max_rate [l/s]", with = "optional_number", default)]
    pub wap_max_rate: Option<f64>,
    #[serde(rename = "wap_max_rate_pro_rata [l/s]", with = "optional_number", default)]
    pub wap_max_rate_pro_rata: Option<f64>,
    #[serde(rename = "wap_max_vol_pro_rata [m3]", with = "optional_number", default)]
    pub wap_max_vol_pro_rata: Option<f64>,
    #[serde(rename = "wap_return_period [d]", with = "optional_number", default)]
    pub wap_return_period: Option<f64>,
    #[serde(rename = "crc_vol_return_period [m3]", with = "optional_number", default)]
    pub crc_vol_return_period: Option<f64>,
    #[serde(rename = "crc_return_period [d]", with = "optional_number", default)]
    pub crc_return_period: Option<f64>,
    #[serde(rename = "crc_ann_vol [m3]", with = "optional_number", default)]
    pub crc_ann_vol: Option<f64>,
    #[serde(rename = "crc_ann_vol_combined [m3]", with = "optional_number", default)]
    pub crc_ann_vol_combined: Option<f64>,
    /// Comma separated consents sharing a combined annual volume
    #[serde(default)]
    pub associated_crcs: Option<String>,
    #[serde(with = "optional_number", default)]
    pub lowflow_restriction: Option<f64>,
    #[serde(rename = "BandNo", default)]
    pub band_no: Option<String>,
    #[serde(default)]
    pub use_type: Option<String>,
    #[serde(default)]
    pub use_type_renamed: Option<String>,
    #[serde(with = "optional_number", default)]
    pub consumption: Option<f64>,
}

impl ConsentRecord {
    /// The WAP name that is unique within this consent.
    pub fn long_name(&self) -> &str {
        match &self.wap_name_long {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.wap_name,
        }
    }

    /// Column name of this record in the consent/WAP activity series.
    pub fn crc_wap_key(&self) -> String {
        format!("{}_{}", self.crc, self.long_name())
    }

    /// Associated consent numbers, whitespace trimmed.
    pub fn associated(&self) -> Vec<String> {
        self.associated_crcs
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Low-flow band number, normalised so that "3.0" reads as 3.
    pub fn band(&self) -> Option<u32> {
        self.band_no.as_deref().and_then(parse_whole_number)
    }

    /// True unless the export flags the take as unrestricted (0).
    pub fn has_lowflow_restriction(&self) -> bool {
        !matches!(self.lowflow_restriction, Some(v) if v == 0.0)
    }

    /// Months (1..=12) in which the WAP may take, wrapping through December.
    pub fn season_months(&self) -> Vec<u32> {
        let (from, to) = (self.from_month, self.to_month);
        if from < to {
            (from..=to).collect()
        } else if from > to {
            (from..=12).chain(1..=to).collect()
        } else {
            vec![from]
        }
    }

    /// Parse a CSV string of consent records.
    pub fn parse_consent_csv(csv_object: &str) -> Result<Vec<ConsentRecord>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let record: ConsentRecord = row?;
            if !(1..=12).contains(&record.from_month) || !(1..=12).contains(&record.to_month) {
                return Err(CoreError::InvalidFormat(format!(
                    "consent {} / {}: months must be within 1..=12",
                    record.crc, record.wap
                )));
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Render consent records as CSV with the same headers they were read with.
    pub fn to_csv_string(records: &[ConsentRecord]) -> Result<String> {
        let mut wtr = WriterBuilder::new().from_writer(Vec::new());
        for record in records {
            wtr.serialize(record)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| CoreError::InvalidFormat(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::InvalidFormat(e.to_string()))
    }
}
