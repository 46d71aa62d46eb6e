//! Typed query methods over the depletion store.
//!
//! Date arguments and results are ISO `YYYY-MM-DD` strings; ranges are
//! inclusive at both ends.

use crate::models::{DateRange, DateValue, WapSummary, WellInfo};
use crate::Database;
use rusqlite::params;
use wam_core::table::SeriesTable;
use wam_core::well::Well;
use wam_utils::dates::{parse_date, DailyDates};

impl Database {
    // ───────────────────── Wells ─────────────────────

    /// All stored wells ordered by WAP, with the stream depletion factor
    /// computed in SQL.
    pub fn query_wells(&self) -> anyhow::Result<Vec<WellInfo>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT wap, distance, storage_coefficient, transmissivity,
                    distance * distance * storage_coefficient / transmissivity AS sdf
             FROM wells
             ORDER BY wap",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(WellInfo {
                    wap: row.get(0)?,
                    distance: row.get(1)?,
                    storage_coefficient: row.get(2)?,
                    transmissivity: row.get(3)?,
                    sdf: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("query: query_wells returned {} records", rows.len());
        Ok(rows)
    }

    /// Stored wells as records for the depletion pipeline.
    pub fn well_records(&self) -> anyhow::Result<Vec<Well>> {
        Ok(self
            .query_wells()?
            .into_iter()
            .map(|info| Well {
                well_id: info.wap,
                distance: info.distance,
                storage_coefficient: info.storage_coefficient,
                transmissivity: info.transmissivity,
            })
            .collect())
    }

    // ───────────────────── Pumping ─────────────────────

    /// Recorded pumping rates of one WAP, ordered by date. Missing readings
    /// are left out.
    pub fn query_pumping(&self, wap: &str) -> anyhow::Result<Vec<DateValue>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT date, rate FROM pumping
             WHERE wap = ?1 AND rate IS NOT NULL
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(params![wap], |row| {
                Ok(DateValue {
                    date: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("query: query_pumping returned {} records", rows.len());
        Ok(rows)
    }

    /// Earliest and latest pumping dates, or `None` when nothing is loaded.
    pub fn query_date_range(&self) -> anyhow::Result<Option<DateRange>> {
        let conn = self.conn.borrow();
        let (min_date, max_date) =
            conn.query_row("SELECT MIN(date), MAX(date) FROM pumping", [], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
        let range = match (min_date, max_date) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        };
        log::debug!("query: query_date_range returned {:?}", range);
        Ok(range)
    }

    /// The pumping table in wide form over the full stored date range.
    ///
    /// Days with no row, or a NULL rate, come back as `NaN` so the depletion
    /// stage applies its missing-data policy.
    pub fn pumping_table(&self) -> anyhow::Result<SeriesTable> {
        let range = match self.query_date_range()? {
            Some(range) => range,
            None => return Ok(SeriesTable::with_dates(Vec::new())?),
        };
        let start = parse_date(&range.start)?;
        let end = parse_date(&range.end)?;
        let dates: Vec<_> = DailyDates::new(start, end).collect();

        let conn = self.conn.borrow();
        let mut stmt = conn.prepare("SELECT wap, date, rate FROM pumping ORDER BY wap, date")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut table = SeriesTable::with_dates(dates.clone())?;
        let mut current: Option<(String, Vec<f64>)> = None;
        for (wap, date, rate) in rows {
            if current.as_ref().map_or(true, |(name, _)| *name != wap) {
                if let Some((name, values)) = current.take() {
                    table.push_column(name, values)?;
                }
                current = Some((wap, vec![f64::NAN; dates.len()]));
            }
            let offset = (parse_date(&date)? - start).num_days() as usize;
            if let Some((_, values)) = current.as_mut() {
                values[offset] = rate.unwrap_or(f64::NAN);
            }
        }
        if let Some((name, values)) = current {
            table.push_column(name, values)?;
        }
        log::info!(
            "query: pumping_table has {} WAPs over {} days",
            table.names().len(),
            table.len()
        );
        Ok(table)
    }

    // ───────────────────── Depletion ─────────────────────

    /// Stream depletion of one WAP between two dates, ordered by date.
    pub fn query_depletion(
        &self,
        wap: &str,
        start_date: &str,
        end_date: &str,
    ) -> anyhow::Result<Vec<DateValue>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT date, value FROM depletion
             WHERE wap = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(params![wap, start_date, end_date], |row| {
                Ok(DateValue {
                    date: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("query: query_depletion returned {} records", rows.len());
        Ok(rows)
    }

    /// Depletion summed over all WAPs per date.
    pub fn query_total_depletion(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> anyhow::Result<Vec<DateValue>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT date, SUM(value) AS total
             FROM depletion
             WHERE date >= ?1 AND date <= ?2
             GROUP BY date
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(params![start_date, end_date], |row| {
                Ok(DateValue {
                    date: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("query: query_total_depletion returned {} records", rows.len());
        Ok(rows)
    }

    /// Per-WAP totals of pumping and depletion plus the count of missing
    /// pumping days, ordered by WAP.
    pub fn query_wap_summaries(&self) -> anyhow::Result<Vec<WapSummary>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT p.wap,
                    COALESCE(SUM(p.rate), 0.0),
                    COALESCE((SELECT SUM(d.value) FROM depletion d WHERE d.wap = p.wap), 0.0),
                    SUM(CASE WHEN p.rate IS NULL THEN 1 ELSE 0 END)
             FROM pumping p
             GROUP BY p.wap
             ORDER BY p.wap",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(WapSummary {
                    wap: row.get(0)?,
                    total_pumping: row.get(1)?,
                    total_depletion: row.get(2)?,
                    missing_days: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("query: query_wap_summaries returned {} records", rows.len());
        Ok(rows)
    }
}
