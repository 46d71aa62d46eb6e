//! Daily on/off (1/0) series telling the model when consents are in force.

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use wam_core::consent::ConsentRecord;
use wam_core::table::SeriesTable;
use wam_utils::dates::{current_accounts_date, DailyDates};

/// First day of the activity series: the current-accounts date.
pub fn series_start(model_start: NaiveDate) -> NaiveDate {
    current_accounts_date(&model_start)
}

fn flag(active: bool) -> f64 {
    if active {
        1.0
    } else {
        0.0
    }
}

/// One column per consent, 1 between its first record's `fmDate` and
/// `toDate` (inclusive).
pub fn consent_active(records: &[ConsentRecord], start: NaiveDate, end: NaiveDate) -> anyhow::Result<SeriesTable> {
    let dates: Vec<NaiveDate> = DailyDates::new(start, end).collect();
    let mut table = SeriesTable::with_dates(dates.clone())?;
    let mut crcs: Vec<&str> = Vec::new();
    for r in records {
        if crcs.contains(&r.crc.as_str()) {
            continue;
        }
        crcs.push(&r.crc);
        let values = dates
            .iter()
            .map(|d| flag(*d >= r.from_date && *d <= r.to_date))
            .collect();
        table
            .push_column(r.crc.clone(), values)
            .with_context(|| format!("consent active series for {}", r.crc))?;
    }
    info!("Consent active series: {} consents over {} days", crcs.len(), dates.len());
    Ok(table)
}

/// One column per consent/WAP (`<crc>_<wap_name_long>`), 1 while the
/// consent is in force and the month lies in the WAP's season.
///
/// Discharges have no WAP column. When a key repeats, the later record
/// replaces the earlier one's values in the first one's column position.
pub fn consent_wap_active(records: &[ConsentRecord], start: NaiveDate, end: NaiveDate) -> anyhow::Result<SeriesTable> {
    let dates: Vec<NaiveDate> = DailyDates::new(start, end).collect();
    let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
    for r in records.iter().filter(|r| !r.activity.is_discharge()) {
        let key = r.crc_wap_key();
        let months = r.season_months();
        let values: Vec<f64> = dates
            .iter()
            .map(|d| flag(*d >= r.from_date && *d <= r.to_date && months.contains(&d.month())))
            .collect();
        match columns.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => {
                warn!("Duplicate consent/WAP column {}, the later record wins", key);
                *existing = values;
            }
            None => columns.push((key, values)),
        }
    }
    let mut table = SeriesTable::with_dates(dates)?;
    for (key, values) in columns {
        table
            .push_column(key.clone(), values)
            .with_context(|| format!("consent/WAP active series for {}", key))?;
    }
    info!(
        "Consent/WAP active series: {} columns over {} days",
        table.names().len(),
        table.len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wam_core::table::DateStyle;

    const CONSENTS: &str = "\
crc,wap,wap_name,Activity,fmDate,toDate,from_month,to_month,wap_max_rate [l/s]
CRC1,SW01,SW01_SW,Take Surface Water,15/01/2020,10/03/2020,2,2,10
CRC1,L36/0001,L36_0001_GW,Take Groundwater,15/01/2020,10/03/2020,12,1,5
CRC2,OUT1,OUT1,Discharge water to water,01/01/2020,31/12/2020,1,12,1
";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_start_is_one_year_back() {
        assert_eq!(series_start(ymd(2016, 7, 1)), ymd(2015, 7, 1));
    }

    #[test]
    fn test_consent_active() {
        let records = ConsentRecord::parse_consent_csv(CONSENTS).unwrap();
        let table = consent_active(&records, ymd(2020, 1, 1), ymd(2020, 3, 31)).unwrap();
        assert_eq!(table.names(), &["CRC1".to_string(), "CRC2".to_string()]);
        let crc1 = table.column("CRC1").unwrap();
        assert_eq!(crc1[13], 0.0); // 14 Jan
        assert_eq!(crc1[14], 1.0); // 15 Jan
        assert_eq!(crc1[69], 1.0); // 10 Mar
        assert_eq!(crc1[70], 0.0); // 11 Mar
        assert!(table.column("CRC2").unwrap().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_consent_wap_active_respects_season() {
        let records = ConsentRecord::parse_consent_csv(CONSENTS).unwrap();
        let table = consent_wap_active(&records, ymd(2020, 1, 1), ymd(2020, 3, 31)).unwrap();
        assert_eq!(
            table.names(),
            &["CRC1_SW01_SW".to_string(), "CRC1_L36_0001_GW".to_string()]
        );
        let sw = table.column("CRC1_SW01_SW").unwrap();
        assert_eq!(sw[14], 0.0); // January is out of season
        assert_eq!(sw[31], 1.0); // 1 Feb
        assert_eq!(sw[60], 0.0); // 1 Mar
        let gw = table.column("CRC1_L36_0001_GW").unwrap();
        assert_eq!(gw[14], 1.0); // season wraps through December into January
        assert_eq!(gw[31], 0.0);

        let csv = table.to_csv_string(DateStyle::DayFirst, false).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("01/01/2020,0,0"));
    }

    #[test]
    fn test_consent_wap_active_later_duplicate_wins() {
        let csv = "\
crc,wap,wap_name,Activity,fmDate,toDate,from_month,to_month,wap_max_rate [l/s]
CRC1,SW01,SW01_SW,Take Surface Water,15/01/2020,10/03/2020,2,2,10
CRC1,L36/0001,L36_0001_GW,Take Groundwater,15/01/2020,10/03/2020,12,1,5
CRC1,SW01,SW01_SW,Take Surface Water,15/01/2020,10/03/2020,3,3,10
";
        let records = ConsentRecord::parse_consent_csv(csv).unwrap();
        let table = consent_wap_active(&records, ymd(2020, 1, 1), ymd(2020, 3, 31)).unwrap();
        assert_eq!(
            table.names(),
            &["CRC1_SW01_SW".to_string(), "CRC1_L36_0001_GW".to_string()]
        );
        let sw = table.column("CRC1_SW01_SW").unwrap();
        assert_eq!(sw[31], 0.0); // February came from the earlier record
        assert_eq!(sw[60], 1.0); // 1 Mar
        assert_eq!(sw[69], 1.0); // 10 Mar
        assert_eq!(sw[70], 0.0); // consent ended
    }
}
