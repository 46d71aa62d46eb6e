//! Low-flow band stage: the model band table and the IRF series.

use crate::config::{BandsConfig, ModelConfig};
use crate::files::{read_input, write_output};
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;
use wam_core::band::{BandLink, BandRecord, FlowRecord, ModelBand};
use wam_core::table::DateStyle;
use wam_data::activity::series_start;
use wam_data::bands::{attach_descriptions, bands_per_site, irf_series, latest_bands};

pub const MODEL_BANDS_CSV: &str = "model_bands.csv";
pub const IRF_DIR: &str = "IRF";

#[derive(Debug, Clone)]
pub struct PreparedBands {
    pub bands: Vec<ModelBand>,
    /// Distinct bands per low-flow site name
    pub band_counts: BTreeMap<String, usize>,
    /// Directory holding `<site>_IRF.csv`, when flows were given
    pub irf_dir: Option<PathBuf>,
}

pub fn prepare(config: &ModelConfig, section: &BandsConfig) -> anyhow::Result<PreparedBands> {
    let records = BandRecord::parse_band_csv(&read_input(&config.resolve(&section.bands_csv))?)?;
    let latest = latest_bands(&records);
    info!("{} band records reduced to {} site/month/band rows", records.len(), latest.len());

    let mut links = BTreeMap::new();
    for (site, path) in &section.band_links {
        links.insert(
            site.clone(),
            BandLink::parse_band_link_csv(&read_input(&config.resolve(path))?)?,
        );
    }
    let bands = attach_descriptions(latest, &links);
    let band_counts = bands_per_site(&bands);
    for (site, count) in &band_counts {
        info!("Lowflow site {} has {} bands", site, count);
    }

    let output_dir = config.resolve(&section.output_dir);
    write_output(&output_dir.join(MODEL_BANDS_CSV), &ModelBand::to_csv_string(&bands)?)?;

    let irf_dir = match &section.flows_csv {
        Some(path) => {
            let flows = FlowRecord::parse_flow_csv(&read_input(&config.resolve(path))?)?;
            let dir = output_dir.join(IRF_DIR);
            for (site, table) in irf_series(&flows, series_start(config.start_date), config.end_date)? {
                write_output(
                    &dir.join(format!("{}_IRF.csv", site)),
                    &table.to_csv_string(DateStyle::DayFirst, false)?,
                )?;
            }
            Some(dir)
        }
        None => None,
    };
    Ok(PreparedBands {
        bands,
        band_counts,
        irf_dir,
    })
}
