use crate::error::{CoreError, Result};
use crate::serde_helpers::{day_first_date, optional_number, parse_whole_number, whole_number};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

/// A low-flow restriction band as recorded for a site on a given date.
///
/// Expected CSV columns: site, date, band_num, waterway, location, min_trig, max_trig
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BandRecord {
    pub site: String,
    #[serde(with = "day_first_date")]
    pub date: NaiveDate,
    #[serde(with = "whole_number")]
    pub band_num: u32,
    pub waterway: String,
    pub location: String,
    /// Flow at or below which the band is fully restricted
    #[serde(with = "optional_number", default)]
    pub min_trig: Option<f64>,
    /// Flow at or above which the band is unrestricted
    #[serde(with = "optional_number", default)]
    pub max_trig: Option<f64>,
}

impl BandRecord {
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Display name of the restriction site, e.g. "Ashburton River at SH1".
    pub fn site_name(&self) -> String {
        format!("{} at {}", self.waterway, self.location)
    }

    pub fn parse_band_csv(csv_object: &str) -> Result<Vec<BandRecord>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        rdr.deserialize()
            .map(|row| row.map_err(CoreError::from))
            .collect()
    }
}

/// Link between a band number and its description for one site.
#[derive(Debug, PartialEq, Clone)]
pub struct BandLink {
    pub band_no: u32,
    pub description: String,
}

impl BandLink {
    /// Parse a band link table. Columns are positional (band number,
    /// description) because the exports use inconsistent header names.
    pub fn parse_band_link_csv(csv_object: &str) -> Result<Vec<BandLink>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_object.as_bytes());
        let mut links = Vec::new();
        for row in rdr.records() {
            let record = row?;
            let raw_band = record.get(0).unwrap_or("");
            let band_no = parse_whole_number(raw_band).ok_or_else(|| {
                CoreError::InvalidFormat(format!("band number '{}' is not a whole number", raw_band))
            })?;
            let description = record.get(1).unwrap_or("").trim().to_string();
            if description.is_empty() {
                continue;
            }
            links.push(BandLink { band_no, description });
        }
        Ok(links)
    }
}

/// A measured flow at a low-flow site, the input to the IRF series.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub site: String,
    #[serde(with = "day_first_date")]
    pub date: NaiveDate,
    #[serde(with = "optional_number", default)]
    pub flow: Option<f64>,
}

impl FlowRecord {
    pub fn parse_flow_csv(csv_object: &str) -> Result<Vec<FlowRecord>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        rdr.deserialize()
            .map(|row| row.map_err(CoreError::from))
            .collect()
    }
}

/// One band of a low-flow site for one month, ready for the model.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelBand {
    pub site: String,
    #[serde(rename = "LF_site_name")]
    pub site_name: String,
    #[serde(with = "whole_number")]
    pub month: u32,
    #[serde(with = "whole_number")]
    pub band_num: u32,
    #[serde(rename = "BandDesc")]
    pub description: String,
    #[serde(with = "optional_number", default)]
    pub min_trig: Option<f64>,
    #[serde(with = "optional_number", default)]
    pub max_trig: Option<f64>,
}

impl ModelBand {
    pub fn to_csv_string(bands: &[ModelBand]) -> Result<String> {
        let mut wtr = WriterBuilder::new().from_writer(Vec::new());
        for band in bands {
            wtr.serialize(band)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| CoreError::InvalidFormat(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::InvalidFormat(e.to_string()))
    }
}
