//! CSV loading and result storage for the depletion store.
//!
//! # CSV Formats
//!
//! - **Wells** (has headers): `wap,distance_m,storage_coefficient,transmissivity_m2d`
//! - **Pumping** (wide, has headers): `Date,<wap>,<wap>,...` with ISO or day-first dates
//!
//! Parsing is delegated to the `wam-core` record types so that the store
//! accepts exactly what the file-based pipeline accepts.

use crate::Database;
use rusqlite::params;
use wam_core::table::SeriesTable;
use wam_core::well::Well;
use wam_utils::dates::format_date;

impl Database {
    /// Load well properties from a CSV string, replacing rows for WAPs
    /// already present.
    ///
    /// # Example CSV
    /// ```text
    /// wap,distance_m,storage_coefficient,transmissivity_m2d
    /// J36/0001,500,0.002,300
    /// ```
    pub fn load_wells(&self, csv_data: &str) -> anyhow::Result<()> {
        let wells = Well::parse_well_csv(csv_data)?;
        self.store_wells(&wells)
    }

    /// Insert or replace typed well records.
    pub fn store_wells(&self, wells: &[Well]) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "INSERT OR REPLACE INTO wells (wap, distance, storage_coefficient, transmissivity)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for well in wells {
            stmt.execute(params![
                well.well_id,
                well.distance,
                well.storage_coefficient,
                well.transmissivity
            ])?;
        }
        log::info!("loader: Loaded {} wells", wells.len());
        Ok(())
    }

    /// Load a wide pumping table from a CSV string.
    ///
    /// Missing cells are stored as NULL so the gap stays visible to queries;
    /// they only become zero when the depletion is computed.
    ///
    /// # Example CSV
    /// ```text
    /// Date,J36/0001,J36/0002
    /// 01/07/2019,12.5,0
    /// 02/07/2019,,3.1
    /// ```
    pub fn load_pumping(&self, csv_data: &str) -> anyhow::Result<()> {
        let table = SeriesTable::parse_csv(csv_data)?;
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "INSERT OR REPLACE INTO pumping (wap, date, rate) VALUES (?1, ?2, ?3)",
        )?;
        let mut count = 0u32;
        let mut missing = 0u32;
        for (wap, rates) in table.iter() {
            for (date, rate) in table.dates().iter().zip(rates) {
                let rate = if rate.is_nan() {
                    missing += 1;
                    None
                } else {
                    Some(*rate)
                };
                stmt.execute(params![wap, format_date(date), rate])?;
                count += 1;
            }
        }
        log::info!(
            "loader: Loaded {} pumping rows for {} WAPs, {} missing",
            count,
            table.names().len(),
            missing
        );
        Ok(())
    }

    /// Store a computed depletion table, one row per WAP and day.
    ///
    /// A `Total` column, if present, is not stored; totals are derived by
    /// [`query_total_depletion`](Self::query_total_depletion).
    pub fn store_depletion(&self, depletion: &SeriesTable) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "INSERT OR REPLACE INTO depletion (wap, date, value) VALUES (?1, ?2, ?3)",
        )?;
        let mut count = 0u32;
        for (wap, values) in depletion.iter() {
            if wap == wam_core::table::TOTAL_COLUMN {
                continue;
            }
            for (date, value) in depletion.dates().iter().zip(values) {
                stmt.execute(params![wap, format_date(date), value])?;
                count += 1;
            }
        }
        log::info!("loader: Stored {} depletion rows", count);
        Ok(())
    }
}
