//! Expression stage: every branch expression the model needs, written as
//! a `branch,variable,expression` table.

use crate::bands::PreparedBands;
use crate::config::{DemandConfig, ExpressionsConfig, ModelConfig};
use crate::consents::PreparedConsents;
use crate::files::{read_input, write_output};
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::Path;
use wam_core::band::ModelBand;
use wam_expr::{depletion, lowflow, Assignment, ConsentExpressions, ConsentSettings, DemandSource, SeriesFile};

/// A demand series file with the column names after its date column.
fn demand_series(path: &Path) -> anyhow::Result<SeriesFile> {
    let text = read_input(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let columns = rdr
        .headers()?
        .iter()
        .skip(1)
        .map(|h| h.trim().to_string())
        .collect();
    Ok(SeriesFile::new(path.to_string_lossy(), columns))
}

fn demand_source(config: &ModelConfig, demand: &DemandConfig) -> anyhow::Result<DemandSource> {
    Ok(match demand {
        DemandConfig::Restriction => DemandSource::Restriction,
        DemandConfig::Zero => DemandSource::Zero,
        DemandConfig::Series { path } => DemandSource::Series(demand_series(&config.resolve(path))?),
    })
}

/// Low-flow site name and band numbers for the consent tree.
pub fn consent_settings(low_flow_site: Option<&str>, bands: Option<&[ModelBand]>) -> ConsentSettings {
    let Some(site) = low_flow_site else {
        return ConsentSettings::default();
    };
    let site_bands: Vec<&ModelBand> = bands
        .unwrap_or_default()
        .iter()
        .filter(|b| b.site == site)
        .collect();
    match site_bands.first() {
        Some(first) => ConsentSettings {
            low_flow_site: Some(first.site_name.clone()),
            known_bands: Some(site_bands.iter().map(|b| b.band_num).collect::<BTreeSet<u32>>()),
        },
        None => {
            warn!("Low-flow site {} has no prepared bands; consents are not restricted", site);
            ConsentSettings::default()
        }
    }
}

/// Every expression of the prepared stages. `stream_depletion` is the
/// written depletion table, if that stage ran.
pub fn generate(
    config: &ModelConfig,
    section: &ExpressionsConfig,
    stream_depletion: Option<&SeriesFile>,
    consents: Option<&PreparedConsents>,
    bands: Option<&PreparedBands>,
) -> anyhow::Result<Vec<Assignment>> {
    let mut assignments = Vec::new();
    if let Some(series) = stream_depletion {
        let zero = config.depletion.as_ref().is_some_and(|d| d.zero_sd);
        assignments.extend(depletion::stream_depletion_assignments(series, zero));
    }
    if let Some(prepared) = bands {
        assignments.extend(lowflow::band_assignments(&prepared.bands, &section.irf_sources));
        if let Some(dir) = &prepared.irf_dir {
            assignments.extend(lowflow::irf_assignments(&prepared.bands, dir));
        }
    }
    if let Some(prepared) = consents {
        let settings = consent_settings(
            section.low_flow_site.as_deref(),
            bands.map(|b| b.bands.as_slice()),
        );
        let expressions = ConsentExpressions::new(
            &prepared.records,
            &prepared.crc_active,
            &prepared.crc_wap_active,
            &settings,
        );
        let demand = demand_source(config, &section.demand)?;
        assignments.extend(expressions.all(&demand)?);
        assignments.extend(expressions.link_assignments(section.restrict_links));
    }
    info!("Generated {} expressions", assignments.len());
    Ok(assignments)
}

/// Generate and write the expression table.
pub fn write(
    config: &ModelConfig,
    section: &ExpressionsConfig,
    stream_depletion: Option<&SeriesFile>,
    consents: Option<&PreparedConsents>,
    bands: Option<&PreparedBands>,
) -> anyhow::Result<()> {
    let assignments = generate(config, section, stream_depletion, consents, bands)?;
    write_output(
        &config.resolve(&section.output_csv),
        &Assignment::to_csv_string(&assignments)?,
    )
}
