//! Stream depletion commands.

use crate::files::{read_input, write_output};
use log::info;
use std::path::Path;
use wam_core::table::{DateStyle, TOTAL_COLUMN};
use wam_data::depletion::{consistency_report, deplete};
use wam_db::Database;
use wam_depletion::{theis, AquiferGeometry};
use wam_expr::SeriesFile;

/// Print the stream depletion factor of one well.
pub fn run_sdf(distance: f64, storage_coefficient: f64, transmissivity: f64) -> anyhow::Result<()> {
    let geometry = AquiferGeometry::new(distance, storage_coefficient, transmissivity)?;
    println!("{:.6}", geometry.stream_depletion_factor());
    Ok(())
}

/// Print the single-pulse response of one well as JSON.
pub fn run_theis(
    distance: f64,
    storage_coefficient: f64,
    transmissivity: f64,
    rate: f64,
    days: f64,
) -> anyhow::Result<()> {
    let geometry = AquiferGeometry::new(distance, storage_coefficient, transmissivity)?;
    let response = theis(&geometry, rate, days)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Options of a depletion run.
#[derive(Debug, Clone, Copy)]
pub struct DepletionRun<'a> {
    pub wells_csv: &'a Path,
    pub pumping_csv: &'a Path,
    pub output_csv: &'a Path,
    pub with_total: bool,
    pub check_consistency: bool,
}

/// Result of a depletion run.
pub struct DepletionOutput {
    /// Store holding inputs and results
    pub db: Database,
    /// The written table as the model reads it
    pub series: SeriesFile,
}

/// Load wells and pumping into the store, compute the depletion of every
/// pumped well and write it as a day-first wide table.
pub fn run_depletion(run: DepletionRun<'_>) -> anyhow::Result<DepletionOutput> {
    let db = Database::new()?;
    db.load_wells(&read_input(run.wells_csv)?)?;
    db.load_pumping(&read_input(run.pumping_csv)?)?;

    let wells = db.well_records()?;
    let pumping = db.pumping_table()?;
    let depleted = deplete(&wells, &pumping)?;
    db.store_depletion(&depleted)?;
    write_output(
        run.output_csv,
        &depleted.to_csv_string(DateStyle::DayFirst, run.with_total)?,
    )?;
    let mut columns = depleted.names().to_vec();
    if run.with_total {
        columns.push(TOTAL_COLUMN.to_string());
    }
    let series = SeriesFile::new(run.output_csv.to_string_lossy(), columns);

    if run.check_consistency {
        let report = consistency_report(&wells, &pumping, &depleted)?;
        let diverging = report.iter().filter(|d| !d.within_tolerance()).count();
        info!(
            "Consistency check: {} of {} wells diverge between batch and interactive results",
            diverging,
            report.len()
        );
    }
    Ok(DepletionOutput { db, series })
}

/// Run depletion and optionally write per-WAP totals as JSON.
pub fn run_deplete_command(run: DepletionRun<'_>, summary_json: Option<&Path>) -> anyhow::Result<()> {
    let output = run_depletion(run)?;
    if let Some(path) = summary_json {
        let summaries = output.db.query_wap_summaries()?;
        write_output(path, &serde_json::to_string_pretty(&summaries)?)?;
    }
    Ok(())
}
