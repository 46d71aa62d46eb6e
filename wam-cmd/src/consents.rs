//! Consent stage: filter and clean the consent table, then write the
//! activity series the model reads the `Active` switches from.

use crate::config::{AllowList, ConsentsConfig, ModelConfig};
use crate::files::{read_input, write_output};
use chrono::NaiveDate;
use log::info;
use std::path::Path;
use wam_core::consent::{Activity, ConsentRecord};
use wam_core::lists::{parse_consumption_csv, parse_id_list};
use wam_core::table::{DateStyle, SeriesTable};
use wam_data::activity::{consent_active, consent_wap_active, series_start};
use wam_data::consents::{cleanup, filter_discharges, filter_waps};
use wam_expr::SeriesFile;

pub const CLEANED_CSV: &str = "consents_cleaned.csv";
pub const CRC_ACTIVE_CSV: &str = "crc_active.csv";
pub const CRC_WAP_ACTIVE_CSV: &str = "crc_wap_active.csv";

/// Cleaned consents and the series files describing when they are active.
#[derive(Debug, Clone)]
pub struct PreparedConsents {
    pub records: Vec<ConsentRecord>,
    pub crc_active: SeriesFile,
    pub crc_wap_active: SeriesFile,
}

fn allowed(config: &ModelConfig, list: &AllowList) -> anyhow::Result<std::collections::BTreeSet<String>> {
    let ids = parse_id_list(&read_input(&config.resolve(&list.path))?, &list.column)?;
    info!("{} ids allowed by {}", ids.len(), list.path.display());
    Ok(ids)
}

/// Read, filter and clean the consent table.
pub fn load_consents(config: &ModelConfig, section: &ConsentsConfig) -> anyhow::Result<Vec<ConsentRecord>> {
    let mut records = ConsentRecord::parse_consent_csv(&read_input(&config.resolve(&section.consents_csv))?)?;
    info!("Read {} consent records", records.len());

    let wap_lists = [
        (Activity::TakeGroundwater, &section.groundwater_waps),
        (Activity::TakeSurfaceWater, &section.surface_water_waps),
        (Activity::DivertSurfaceWater, &section.divert_waps),
    ];
    for (activity, list) in wap_lists {
        if let Some(list) = list {
            records = filter_waps(records, activity, &allowed(config, list)?);
        }
    }
    if let Some(list) = &section.discharge_consents {
        records = filter_discharges(records, &allowed(config, list)?);
    }

    let consumption = match &section.consumption_csv {
        Some(path) => Some(parse_consumption_csv(&read_input(&config.resolve(path))?)?),
        None => None,
    };
    Ok(cleanup(records, consumption.as_ref()))
}

fn write_series(table: &SeriesTable, path: &Path) -> anyhow::Result<SeriesFile> {
    write_output(path, &table.to_csv_string(DateStyle::DayFirst, false)?)?;
    Ok(SeriesFile::new(path.to_string_lossy(), table.names().to_vec()))
}

/// Write the consent and consent/WAP active series into `output_dir`,
/// from the current-accounts date to `end`.
pub fn write_activity_series(
    records: &[ConsentRecord],
    start: NaiveDate,
    end: NaiveDate,
    output_dir: &Path,
) -> anyhow::Result<(SeriesFile, SeriesFile)> {
    let first = series_start(start);
    let crc_active = write_series(&consent_active(records, first, end)?, &output_dir.join(CRC_ACTIVE_CSV))?;
    let crc_wap_active = write_series(
        &consent_wap_active(records, first, end)?,
        &output_dir.join(CRC_WAP_ACTIVE_CSV),
    )?;
    Ok((crc_active, crc_wap_active))
}

/// The whole consent stage.
pub fn prepare(config: &ModelConfig, section: &ConsentsConfig) -> anyhow::Result<PreparedConsents> {
    let records = load_consents(config, section)?;
    let output_dir = config.resolve(&section.output_dir);
    write_output(&output_dir.join(CLEANED_CSV), &ConsentRecord::to_csv_string(&records)?)?;
    let (crc_active, crc_wap_active) =
        write_activity_series(&records, config.start_date, config.end_date, &output_dir)?;
    Ok(PreparedConsents {
        records,
        crc_active,
        crc_wap_active,
    })
}

/// Activity series from an already cleaned consent table.
pub fn run_active_series(consents_csv: &Path, start: NaiveDate, end: NaiveDate, output_dir: &Path) -> anyhow::Result<()> {
    let records = ConsentRecord::parse_consent_csv(&read_input(consents_csv)?)?;
    write_activity_series(&records, start, end, output_dir)?;
    Ok(())
}
