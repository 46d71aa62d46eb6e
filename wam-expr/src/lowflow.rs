//! Low-flow band trigger lookups, `Ballocated` fractions and IRF inputs.

use crate::assignment::Assignment;
use crate::branch::{irf_branch, low_flow_band};
use crate::expr::Expr;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::Path;
use wam_core::band::ModelBand;

/// IRF source used when a site has none configured.
pub const DEFAULT_IRF_SOURCE: &str = "database";

/// A low-flow site: its id and display name, in first-appearance order.
pub fn sites(bands: &[ModelBand]) -> Vec<(&str, &str)> {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    for band in bands {
        if !seen.iter().any(|(site, _)| *site == band.site) {
            seen.push((band.site.as_str(), band.site_name.as_str()));
        }
    }
    seen
}

/// `Lookup(X, Y, Step, Month, ...)` of one trigger for one band of a site.
pub fn monthly_trigger_lookup<F>(site_bands: &[&ModelBand], band_num: u32, trigger: F, label: &str) -> Expr
where
    F: Fn(&ModelBand) -> Option<f64>,
{
    let points = (1..=12)
        .map(|month| {
            let value = site_bands
                .iter()
                .find(|b| b.band_num == band_num && b.month == month)
                .and_then(|b| trigger(b));
            if value.is_none() {
                let site = site_bands.first().map(|b| b.site_name.as_str()).unwrap_or("");
                warn!(
                    "No {} value for {} month {} band {}",
                    label, site, month, band_num
                );
            }
            (month, value)
        })
        .collect();
    Expr::MonthlyLookup(points)
}

/// Fraction of the consented take allowed for the current IRF.
///
/// Fully allowed at or above `max_trig`, nothing at or below `min_trig`,
/// linear in between. Equal triggers make it a step at `max_trig`.
pub fn ballocated(irf: Expr) -> Expr {
    let max_trig = || Expr::var("max_trig");
    let min_trig = || Expr::var("min_trig");
    Expr::if_else(
        Expr::equal(max_trig(), min_trig()),
        Expr::if_else(Expr::at_least(irf.clone(), max_trig()), Expr::num(1.0), Expr::num(0.0)),
        Expr::max(
            Expr::num(0.0),
            Expr::min(Expr::num(1.0), (irf - min_trig()) / (max_trig() - min_trig())),
        ),
    )
}

/// `max_trig`, `min_trig` and `Ballocated` for every band of every site.
///
/// `irf_sources` maps a site id to the IRF branch feeding it.
pub fn band_assignments(bands: &[ModelBand], irf_sources: &BTreeMap<String, String>) -> Vec<Assignment> {
    let mut assignments = Vec::new();
    for (site, site_name) in sites(bands) {
        let source = irf_sources.get(site).map(String::as_str).unwrap_or_else(|| {
            debug!("No IRF source configured for {}, using {}", site_name, DEFAULT_IRF_SOURCE);
            DEFAULT_IRF_SOURCE
        });
        let site_bands: Vec<&ModelBand> = bands.iter().filter(|b| b.site == site).collect();
        let mut band_nums: Vec<u32> = Vec::new();
        for band in &site_bands {
            if !band_nums.contains(&band.band_num) {
                band_nums.push(band.band_num);
            }
        }
        for band_num in band_nums {
            let branch = low_flow_band(site_name, band_num);
            assignments.push(Assignment::activity_level(
                branch.child("max_trig"),
                monthly_trigger_lookup(&site_bands, band_num, |b| b.max_trig, "max_trig"),
            ));
            assignments.push(Assignment::activity_level(
                branch.child("min_trig"),
                monthly_trigger_lookup(&site_bands, band_num, |b| b.min_trig, "min_trig"),
            ));
            assignments.push(Assignment::activity_level(
                branch.child("Ballocated"),
                ballocated(Expr::key(["IRF", site_name, source])),
            ));
        }
    }
    assignments
}

/// IRF time series of each site read from `<irf_dir>/<site>_IRF.csv`.
pub fn irf_assignments(bands: &[ModelBand], irf_dir: &Path) -> Vec<Assignment> {
    sites(bands)
        .into_iter()
        .map(|(site, site_name)| {
            let file = irf_dir.join(format!("{}_IRF.csv", site));
            Assignment::activity_level(
                irf_branch(site_name, DEFAULT_IRF_SOURCE),
                Expr::read_from_file(file.to_string_lossy(), 1),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(site: &str, month: u32, band_num: u32, min_trig: f64, max_trig: f64) -> ModelBand {
        ModelBand {
            site: site.to_string(),
            site_name: format!("River {}", site),
            month,
            band_num,
            description: format!("Band {}", band_num),
            min_trig: Some(min_trig),
            max_trig: Some(max_trig),
        }
    }

    #[test]
    fn test_ballocated_rendering() {
        let expr = ballocated(Expr::key(["IRF", "Opihi River at SH1", "database"]));
        assert_eq!(
            expr.to_string(),
            "If(max_trig=min_trig, If(Key\\IRF\\Opihi River at SH1\\database>=max_trig, 1, 0), \
             Max(0, Min(1, (Key\\IRF\\Opihi River at SH1\\database - min_trig) / (max_trig - min_trig))))"
        );
    }

    #[test]
    fn test_monthly_lookup_fills_known_months() {
        let bands: Vec<ModelBand> = (1..=12).map(|m| band("1", m, 1, m as f64, 10.0 * m as f64)).collect();
        let refs: Vec<&ModelBand> = bands.iter().collect();
        let lookup = monthly_trigger_lookup(&refs, 1, |b| b.max_trig, "max_trig").to_string();
        assert!(lookup.starts_with("Lookup(X, Y, Step, Month, 1, 10, 2, 20, "));
        assert!(lookup.ends_with("12, 120)"));
    }

    #[test]
    fn test_band_assignments() {
        let bands = vec![
            band("1", 1, 1, 100.0, 200.0),
            band("1", 1, 2, 200.0, 300.0),
            band("2", 6, 1, 50.0, 50.0),
        ];
        let mut sources = BTreeMap::new();
        sources.insert("2".to_string(), "simulated".to_string());
        let assignments = band_assignments(&bands, &sources);
        assert_eq!(assignments.len(), 9);
        assert_eq!(
            assignments[0].branch.to_string(),
            "\\Key Assumptions\\Low Flows\\River 1\\band_num_1\\max_trig"
        );
        assert_eq!(
            assignments[0].expression.to_string(),
            "Lookup(X, Y, Step, Month, 1, 200, 2, , 3, , 4, , 5, , 6, , 7, , 8, , 9, , 10, , 11, , 12, )"
        );
        assert!(assignments[2].expression.to_string().contains("Key\\IRF\\River 1\\database>=max_trig"));
        assert!(assignments[8].expression.to_string().contains("Key\\IRF\\River 2\\simulated"));
    }

    #[test]
    fn test_irf_assignments() {
        let bands = vec![band("69505", 1, 1, 1.0, 2.0), band("69505", 2, 1, 1.0, 2.0)];
        let assignments = irf_assignments(&bands, Path::new("lowflows"));
        assert_eq!(assignments.len(), 1);
        assert_eq!(
            assignments[0].branch.to_string(),
            "\\Key Assumptions\\IRF\\River 69505\\database"
        );
        let expected = format!(
            "ReadFromFile({}, 1, , , , Interpolate)",
            Path::new("lowflows").join("69505_IRF.csv").to_string_lossy()
        );
        assert_eq!(assignments[0].expression.to_string(), expected);
    }
}
