//! Wide daily time-series tables: one row per day, one column per entity.
//!
//! This is the layout of pumping histories coming in and of depletion and
//! activity series going out to the host model's `ReadFromFile` reader:
//!
//! ```text
//! Date,WAP_A,WAP_B
//! 01/07/2019,12.5,0
//! 02/07/2019,,3.1
//! ```
//!
//! Missing cells are stored as `NaN`.

use crate::error::{CoreError, Result};
use crate::serde_helpers::parse_optional_number;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use wam_utils::dates::{format_date, format_day_first, parse_date_flexible, DailyDates};

/// How dates are written in the first column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// "YYYY-MM-DD"
    Iso,
    /// "DD/MM/YYYY", read by the host model
    DayFirst,
}

/// Name of the optional per-row sum column.
pub const TOTAL_COLUMN: &str = "Total";

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SeriesTable {
    /// An all-zero table covering every day from `start` to `end`.
    pub fn zeros(start: NaiveDate, end: NaiveDate, names: Vec<String>) -> Self {
        let dates: Vec<NaiveDate> = DailyDates::new(start, end).collect();
        let columns = names.iter().map(|_| vec![0.0; dates.len()]).collect();
        Self { dates, names, columns }
    }

    /// An empty table over a fixed date index, to be filled with [`push_column`](Self::push_column).
    /// The dates must be consecutive days.
    pub fn with_dates(dates: Vec<NaiveDate>) -> Result<Self> {
        check_consecutive(&dates)?;
        Ok(Self {
            dates,
            names: Vec::new(),
            columns: Vec::new(),
        })
    }

    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(CoreError::InvalidFormat(format!(
                "column '{}' has {} values for {} dates",
                name,
                values.len(),
                self.dates.len()
            )));
        }
        if self.names.contains(&name) {
            return Err(CoreError::InvalidFormat(format!("duplicate column '{}'", name)));
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        let i = self.names.iter().position(|n| n == name)?;
        Some(&mut self.columns[i])
    }

    /// Set a single cell; returns false if the column or date is unknown.
    pub fn set(&mut self, name: &str, date: NaiveDate, value: f64) -> bool {
        let Some(row) = self.row_of(date) else {
            return false;
        };
        match self.column_mut(name) {
            Some(column) => {
                column[row] = value;
                true
            }
            None => false,
        }
    }

    /// Index of `date` in the (contiguous) date index.
    pub fn row_of(&self, date: NaiveDate) -> Option<usize> {
        let first = *self.dates.first()?;
        let offset = (date - first).num_days();
        if offset < 0 || offset as usize >= self.dates.len() {
            None
        } else {
            Some(offset as usize)
        }
    }

    /// (name, values) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Number of missing (NaN) cells per column.
    pub fn missing_counts(&self) -> Vec<(&str, usize)> {
        self.iter()
            .map(|(name, values)| (name, values.iter().filter(|v| v.is_nan()).count()))
            .collect()
    }

    /// Sum across columns for each row, missing cells counting as zero.
    pub fn row_totals(&self) -> Vec<f64> {
        (0..self.dates.len())
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c[row])
                    .filter(|v| !v.is_nan())
                    .sum()
            })
            .collect()
    }

    /// Parse a wide CSV whose first column holds dates. Rows must be
    /// consecutive days.
    pub fn parse_csv(csv_object: &str) -> Result<SeriesTable> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_object.as_bytes());
        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(CoreError::MissingColumn("Date".to_string()));
        }
        let names: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut columns: Vec<Vec<f64>> = names.iter().map(|_| Vec::new()).collect();

        for row in rdr.records() {
            let record = row?;
            let raw_date = record.get(0).unwrap_or("");
            let date = parse_date_flexible(raw_date)
                .map_err(|e| CoreError::DateParse(e.to_string()))?;
            dates.push(date);
            for (i, column) in columns.iter_mut().enumerate() {
                let cell = record.get(i + 1).unwrap_or("");
                let value = parse_optional_number(cell).map_err(|_| {
                    CoreError::InvalidFormat(format!(
                        "'{}' in column '{}' on {} is not a number",
                        cell,
                        names[i],
                        format_date(&date)
                    ))
                })?;
                column.push(value.unwrap_or(f64::NAN));
            }
        }

        log::debug!("Parsed series table: {} columns over {} days", names.len(), dates.len());
        let mut table = SeriesTable::with_dates(dates)?;
        for (name, values) in names.into_iter().zip(columns) {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Render as CSV. Missing cells are written empty.
    pub fn to_csv_string(&self, style: DateStyle, with_total: bool) -> Result<String> {
        let mut wtr = WriterBuilder::new().from_writer(Vec::new());
        let mut header = vec!["Date".to_string()];
        header.extend(self.names.iter().cloned());
        if with_total {
            header.push(TOTAL_COLUMN.to_string());
        }
        wtr.write_record(&header)?;

        let totals = if with_total { self.row_totals() } else { Vec::new() };
        for (row, date) in self.dates.iter().enumerate() {
            let mut record = vec![match style {
                DateStyle::Iso => format_date(date),
                DateStyle::DayFirst => format_day_first(date),
            }];
            record.extend(self.columns.iter().map(|c| format_cell(c[row])));
            if with_total {
                record.push(format_cell(totals[row]));
            }
            wtr.write_record(&record)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| CoreError::InvalidFormat(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::InvalidFormat(e.to_string()))
    }
}

fn check_consecutive(dates: &[NaiveDate]) -> Result<()> {
    for pair in dates.windows(2) {
        if pair[0].succ_opt() != Some(pair[1]) {
            return Err(CoreError::NonContiguousDates {
                previous: format_date(&pair[0]),
                next: format_date(&pair[1]),
            });
        }
    }
    Ok(())
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUMPING: &str = "\
Date,L36/0001,L36/0002
2019-07-01,12.5,0
2019-07-02,,3.1
2019-07-03,NaN,4
";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_wide_csv() {
        let table = SeriesTable::parse_csv(PUMPING).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.names(), &["L36/0001".to_string(), "L36/0002".to_string()]);
        let first = table.column("L36/0001").unwrap();
        assert_eq!(first[0], 12.5);
        assert!(first[1].is_nan());
        assert!(first[2].is_nan());
        assert_eq!(table.column("L36/0002").unwrap(), &[0.0, 3.1, 4.0]);
        assert_eq!(table.missing_counts(), vec![("L36/0001", 2), ("L36/0002", 0)]);
    }

    #[test]
    fn test_parse_day_first_dates() {
        let csv = "Date,W1\n31/12/2019,1\n01/01/2020,2\n";
        let table = SeriesTable::parse_csv(csv).unwrap();
        assert_eq!(table.dates(), &[ymd(2019, 12, 31), ymd(2020, 1, 1)]);
    }

    #[test]
    fn test_rejects_gap_in_dates() {
        let csv = "Date,W1\n2019-07-01,1\n2019-07-03,2\n";
        assert!(matches!(
            SeriesTable::parse_csv(csv),
            Err(CoreError::NonContiguousDates { .. })
        ));
    }

    #[test]
    fn test_rejects_non_numeric_cell() {
        let csv = "Date,W1\n2019-07-01,lots\n";
        assert!(matches!(
            SeriesTable::parse_csv(csv),
            Err(CoreError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_write_day_first_with_total() {
        let table = SeriesTable::parse_csv(PUMPING).unwrap();
        let out = table.to_csv_string(DateStyle::DayFirst, true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Date,L36/0001,L36/0002,Total");
        assert_eq!(lines[1], "01/07/2019,12.5,0,12.5");
        assert_eq!(lines[2], "02/07/2019,,3.1,3.1");
    }

    #[test]
    fn test_zeros_and_set() {
        let mut table = SeriesTable::zeros(ymd(2020, 2, 28), ymd(2020, 3, 1), vec!["CRC1".into()]);
        assert_eq!(table.len(), 3);
        assert!(table.set("CRC1", ymd(2020, 2, 29), 1.0));
        assert!(!table.set("CRC1", ymd(2020, 3, 2), 1.0));
        assert!(!table.set("CRC2", ymd(2020, 2, 29), 1.0));
        assert_eq!(table.column("CRC1").unwrap(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_push_column_checks_length() {
        let mut table = SeriesTable::with_dates(vec![ymd(2020, 1, 1)]).unwrap();
        assert!(table.push_column("A", vec![1.0, 2.0]).is_err());
        table.push_column("A", vec![1.0]).unwrap();
        assert!(table.push_column("A", vec![1.0]).is_err());
    }

    #[test]
    fn test_with_dates_rejects_missing_day() {
        let gap = SeriesTable::with_dates(vec![ymd(2019, 7, 1), ymd(2019, 7, 3)]);
        match gap {
            Err(CoreError::NonContiguousDates { previous, next }) => {
                assert_eq!(previous, "2019-07-01");
                assert_eq!(next, "2019-07-03");
            }
            other => panic!("expected a date gap error, got {:?}", other),
        }
        assert!(SeriesTable::with_dates(vec![ymd(2019, 7, 2), ymd(2019, 7, 1)]).is_err());
        assert!(SeriesTable::with_dates(Vec::new()).unwrap().is_empty());
    }
}
