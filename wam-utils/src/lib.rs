//! Shared utility functions for WAM crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    /// ISO date format, used in configuration files.
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    /// Day-first date format read by the host model's `ReadFromFile`.
    pub const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// Format a NaiveDate as "DD/MM/YYYY"
    pub fn format_day_first(date: &NaiveDate) -> String {
        date.format(DAY_FIRST_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), ISO_FORMAT)?)
    }

    /// Parse a date in any of the formats found in model input tables:
    /// "YYYY-MM-DD", "DD/MM/YYYY" or compact "YYYYMMDD". A trailing time
    /// component ("2020-01-01 00:00:00") is ignored.
    pub fn parse_date_flexible(s: &str) -> anyhow::Result<NaiveDate> {
        let trimmed = s.trim();
        let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
        for format in [ISO_FORMAT, DAY_FIRST_FORMAT, "%Y%m%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                return Ok(date);
            }
        }
        anyhow::bail!(crate::error::DateError(format!(
            "unrecognised date '{}'",
            trimmed
        )))
    }

    /// Time step of a date in the host model's daily calendar.
    ///
    /// The model always runs 366 steps per year. In non-leap years every
    /// date after 28 February is shifted by one so that step 60 (29 Feb) is
    /// simply never visited.
    pub fn model_day_of_year(date: &NaiveDate) -> u32 {
        let ordinal = date.ordinal();
        let is_leap = NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some();
        if !is_leap && date.month() > 2 {
            ordinal + 1
        } else {
            ordinal
        }
    }

    /// The current-accounts date: the model start date moved back one year.
    ///
    /// 29 February maps onto 28 February of the previous year.
    pub fn current_accounts_date(start: &NaiveDate) -> NaiveDate {
        let year = start.year() - 1;
        NaiveDate::from_ymd_opt(year, start.month(), start.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, start.month(), 28))
            .unwrap_or(*start)
    }

    /// Inclusive iterator over every calendar day between two dates.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DailyDates {
        next: Option<NaiveDate>,
        end: NaiveDate,
    }

    impl DailyDates {
        pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
            let next = if start <= end { Some(start) } else { None };
            Self { next, end }
        }

        /// Number of days still to be yielded.
        pub fn remaining(&self) -> usize {
            match self.next {
                Some(next) => ((self.end - next).num_days() + 1) as usize,
                None => 0,
            }
        }
    }

    impl Iterator for DailyDates {
        type Item = NaiveDate;

        fn next(&mut self) -> Option<Self::Item> {
            let current = self.next?;
            self.next = current.succ_opt().filter(|d| *d <= self.end);
            Some(current)
        }

        fn size_hint(&self) -> (usize, Option<usize>) {
            let n = self.remaining();
            (n, Some(n))
        }
    }

    impl ExactSizeIterator for DailyDates {}

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        #[test]
        fn test_model_day_of_year() {
            assert_eq!(model_day_of_year(&ymd(2021, 1, 1)), 1);
            assert_eq!(model_day_of_year(&ymd(2021, 2, 28)), 59);
            // Non-leap years skip step 60
            assert_eq!(model_day_of_year(&ymd(2021, 3, 1)), 61);
            assert_eq!(model_day_of_year(&ymd(2021, 12, 31)), 366);
            assert_eq!(model_day_of_year(&ymd(2020, 2, 29)), 60);
            assert_eq!(model_day_of_year(&ymd(2020, 3, 1)), 61);
            assert_eq!(model_day_of_year(&ymd(2020, 12, 31)), 366);
        }

        #[test]
        fn test_format_and_parse() {
            let date = ymd(2023, 6, 15);
            assert_eq!(format_date(&date), "2023-06-15");
            assert_eq!(format_day_first(&date), "15/06/2023");
            assert_eq!(parse_date("2023-06-15").unwrap(), date);
        }

        #[test]
        fn test_parse_date_flexible() {
            let date = ymd(2019, 7, 1);
            assert_eq!(parse_date_flexible("2019-07-01").unwrap(), date);
            assert_eq!(parse_date_flexible("01/07/2019").unwrap(), date);
            assert_eq!(parse_date_flexible("20190701").unwrap(), date);
            assert_eq!(parse_date_flexible(" 2019-07-01 00:00:00 ").unwrap(), date);
            assert!(parse_date_flexible("July 1st").is_err());
        }

        #[test]
        fn test_current_accounts_date() {
            assert_eq!(current_accounts_date(&ymd(2016, 7, 1)), ymd(2015, 7, 1));
            assert_eq!(current_accounts_date(&ymd(2016, 2, 29)), ymd(2015, 2, 28));
        }

        #[test]
        fn test_daily_dates() {
            let dates: Vec<NaiveDate> = DailyDates::new(ymd(2020, 2, 27), ymd(2020, 3, 1)).collect();
            assert_eq!(dates.len(), 4);
            assert_eq!(dates[2], ymd(2020, 2, 29));
            assert_eq!(DailyDates::new(ymd(2020, 1, 1), ymd(2020, 1, 1)).count(), 1);
            assert_eq!(DailyDates::new(ymd(2020, 1, 2), ymd(2020, 1, 1)).count(), 0);
            assert_eq!(DailyDates::new(ymd(2020, 1, 1), ymd(2020, 12, 31)).len(), 366);
        }
    }
}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
