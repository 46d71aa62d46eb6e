//! Low-flow band preparation.

use anyhow::Context;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use wam_core::band::{BandLink, BandRecord, FlowRecord, ModelBand};
use wam_core::table::SeriesTable;
use wam_utils::dates::DailyDates;

/// Column name of the IRF series files.
pub const IRF_COLUMN: &str = "flow";

/// The current state of every band: one record per (site, month, band).
///
/// Later records win; a trigger missing in the latest record keeps the
/// last value recorded for it. Output is ordered by site, month and band.
pub fn latest_bands(records: &[BandRecord]) -> Vec<BandRecord> {
    let mut grouped: BTreeMap<(String, u32, u32), BandRecord> = BTreeMap::new();
    for record in records {
        let key = (record.site.clone(), record.month(), record.band_num);
        match grouped.get_mut(&key) {
            Some(current) => {
                let min_trig = record.min_trig.or(current.min_trig);
                let max_trig = record.max_trig.or(current.max_trig);
                *current = BandRecord {
                    min_trig,
                    max_trig,
                    ..record.clone()
                };
            }
            None => {
                grouped.insert(key, record.clone());
            }
        }
    }
    grouped.into_values().collect()
}

/// Attach band descriptions per site.
///
/// Bands without a description, or without both triggers, are no longer
/// part of the banding system and are dropped.
pub fn attach_descriptions(bands: Vec<BandRecord>, links: &BTreeMap<String, Vec<BandLink>>) -> Vec<ModelBand> {
    let mut model_bands = Vec::with_capacity(bands.len());
    for band in bands {
        let description = links
            .get(&band.site)
            .and_then(|site_links| site_links.iter().find(|l| l.band_no == band.band_num))
            .map(|l| l.description.clone());
        let Some(description) = description else {
            info!("Dropping band {} of site {}: no description", band.band_num, band.site);
            continue;
        };
        if band.min_trig.is_none() || band.max_trig.is_none() {
            warn!(
                "Dropping band {} of site {} month {}: missing trigger",
                band.band_num,
                band.site,
                band.month()
            );
            continue;
        }
        model_bands.push(ModelBand {
            site_name: band.site_name(),
            month: band.month(),
            band_num: band.band_num,
            description,
            min_trig: band.min_trig,
            max_trig: band.max_trig,
            site: band.site,
        });
    }
    model_bands
}

/// Number of distinct bands at each site, by site name.
pub fn bands_per_site(bands: &[ModelBand]) -> BTreeMap<String, usize> {
    let mut per_site: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for band in bands {
        let nums = per_site.entry(band.site_name.clone()).or_default();
        if !nums.contains(&band.band_num) {
            nums.push(band.band_num);
        }
    }
    per_site
        .into_iter()
        .map(|(site, nums)| (site, nums.len()))
        .collect()
}

/// Per-site daily flow series covering every day from `start` to `end`,
/// for the IRF branches. Days without a record are `NaN`.
pub fn irf_series(flows: &[FlowRecord], start: NaiveDate, end: NaiveDate) -> anyhow::Result<BTreeMap<String, SeriesTable>> {
    let dates: Vec<NaiveDate> = DailyDates::new(start, end).collect();
    let mut by_site: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for flow in flows.iter().filter(|f| f.date >= start && f.date <= end) {
        let row = (flow.date - start).num_days() as usize;
        by_site
            .entry(flow.site.clone())
            .or_insert_with(|| vec![f64::NAN; dates.len()])[row] = flow.flow.unwrap_or(f64::NAN);
    }
    let mut series = BTreeMap::new();
    for (site, values) in by_site {
        let missing = values.iter().filter(|v| v.is_nan()).count();
        if missing > 0 {
            debug!("IRF series for site {} has {} days without flow", site, missing);
        }
        let mut table = SeriesTable::with_dates(dates.clone())?;
        table
            .push_column(IRF_COLUMN, values)
            .with_context(|| format!("IRF series for site {}", site))?;
        series.insert(site, table);
    }
    Ok(series)
}
