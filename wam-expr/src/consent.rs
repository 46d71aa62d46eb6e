//! Consent and WAP expressions under `\Other Assumptions\Consents` and
//! `\Key Assumptions\WAPs`.
//!
//! Every consent/WAP pair gets its activity switches, maximum daily rate,
//! share of the WAP (`Fraction`), supplied volume, low-flow allocation and
//! the restriction daily volume. The restriction starts at the maximum
//! daily rate and is capped in turn by each volume condition the consent
//! carries:
//!
//! 1. consent volume over a return period (takes only)
//! 2. WAP pro-rata volume over its own return period
//! 3. consent annual volume (takes only)
//! 4. combined annual volume shared with associated consents
//!
//! and is finally scaled by `Ballocated` and floored at zero.

use crate::assignment::{Assignment, CONSUMPTION, DAILY_DEMAND, MAXIMUM_DIVERSION, MAXIMUM_FLOW_VOLUME};
use crate::branch::{
    consent_branch, consent_wap_branch, demand_site, low_flow_band, river_node, transmission_link,
    wap_branch, BranchPath,
};
use crate::expr::Expr;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use wam_core::consent::{Activity, ConsentRecord};
use wam_core::error::{CoreError, Result};

pub const ACTIVE: &str = "Active";
pub const BALLOCATED: &str = "Ballocated";
pub const DEMAND: &str = "Demand";
pub const FRACTION: &str = "Fraction";
pub const MAX_DAILY_RATE: &str = "Max daily rate";
pub const MAX_DAILY_RATE_PRO_RATA: &str = "Max daily rate pro rata";
pub const MAX_VOLUME_PRO_RATA: &str = "Max volume pro rata";
pub const RETURN_PERIOD: &str = "Return period";
pub const SUM_MAX_VOLUME_PRO_RATA: &str = "Sum max volume pro rata";
pub const VOLUME_RETURN_PERIOD: &str = "Volume return period";
pub const ANNUAL_VOLUME: &str = "Annual volume";
pub const ANNUAL_VOLUME_COMBINED: &str = "Annual volume combined";
pub const SUPPLIED_DAILY_VOLUME: &str = "Supplied daily volume";
pub const RESTRICTION_DAILY_VOLUME: &str = "Restriction daily volume";
pub const NON_COMPLIANCE_DAILY_VOLUME: &str = "Non_compliance daily volume";

/// l/s to m³/day
const LITRES_PER_SECOND_TO_DAILY_M3: f64 = 86.4;

/// Window of the annual volume conditions, in model steps.
const ANNUAL_WINDOW: f64 = 366.0;

/// A day-first series CSV read by the model, with its column names in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFile {
    pub path: String,
    pub columns: Vec<String>,
}

impl SeriesFile {
    pub fn new(path: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }

    /// `ReadFromFile` of the named column, if present.
    pub fn column(&self, name: &str) -> Option<Expr> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| Expr::read_from_file(self.path.clone(), i + 1))
    }
}

/// What drives the demand of take WAPs.
#[derive(Debug, Clone, PartialEq)]
pub enum DemandSource {
    /// Demand equals the restriction daily volume: the worst case.
    Restriction,
    Zero,
    /// A metered or estimated series with one column per WAP.
    Series(SeriesFile),
}

/// Options for generating the consent tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsentSettings {
    /// Low-flow site whose bands restrict the consents
    pub low_flow_site: Option<String>,
    /// Bands defined at that site; `None` accepts any band number
    pub known_bands: Option<BTreeSet<u32>>,
}

/// Volume conditions that apply to a consent as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConsentLimits {
    pub volume_return_period: Option<(f64, f64)>,
    pub annual_volume: Option<f64>,
    pub annual_volume_combined: Option<f64>,
}

fn max_present<'a, I: Iterator<Item = &'a ConsentRecord>>(records: I, field: fn(&ConsentRecord) -> Option<f64>) -> Option<f64> {
    records.filter_map(field).fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

impl ConsentLimits {
    /// Consent level values repeat on every record; the largest one wins.
    pub fn of(records: &[&ConsentRecord]) -> Self {
        let volume = max_present(records.iter().copied(), |r| r.crc_vol_return_period);
        let period = max_present(records.iter().copied(), |r| r.crc_return_period);
        Self {
            volume_return_period: volume.zip(period),
            annual_volume: max_present(records.iter().copied(), |r| r.crc_ann_vol),
            annual_volume_combined: max_present(records.iter().copied(), |r| r.crc_ann_vol_combined),
        }
    }
}

fn has_pro_rata_volume(record: &ConsentRecord) -> bool {
    record.wap_max_vol_pro_rata.is_some() && record.wap_return_period.is_some()
}

/// Volume conditions compare whole numbers of days and cubic metres.
fn whole(value: f64) -> i64 {
    value.trunc() as i64
}

/// Water delivered to a take node in the previous step.
fn supply_delivered(wap_name: &str) -> Expr {
    Expr::result(demand_site(wap_name), "Supply Delivered", "m^3")
}

/// Flow through a WAP's river node in the previous step.
fn streamflow(wap_name: &str) -> Expr {
    Expr::result(river_node(wap_name), "Streamflow", "m^3")
}

fn diverted_inflow(wap_name: &str) -> Expr {
    let reach = river_node(wap_name)
        .child("Reaches")
        .child(format!("Below {} Diverted Inflow", wap_name));
    Expr::result(reach, "Streamflow", "m^3")
}

fn record_branch(record: &ConsentRecord) -> BranchPath {
    consent_wap_branch(&record.crc, record.long_name())
}

fn branch_expr(path: BranchPath) -> Expr {
    Expr::Branch(path)
}

/// Generates every consent and WAP expression for a set of consent records.
pub struct ConsentExpressions<'a> {
    records: Vec<&'a ConsentRecord>,
    crc_active: &'a SeriesFile,
    crc_wap_active: &'a SeriesFile,
    settings: &'a ConsentSettings,
}

impl<'a> ConsentExpressions<'a> {
    /// Discharge consents are ignored.
    pub fn new(
        records: &'a [ConsentRecord],
        crc_active: &'a SeriesFile,
        crc_wap_active: &'a SeriesFile,
        settings: &'a ConsentSettings,
    ) -> Self {
        Self {
            records: records.iter().filter(|r| !r.activity.is_discharge()).collect(),
            crc_active,
            crc_wap_active,
            settings,
        }
    }

    /// Consent numbers in first-appearance order.
    pub fn consents(&self) -> Vec<&'a str> {
        let mut crcs: Vec<&'a str> = Vec::new();
        for r in self.records.iter().copied() {
            if !crcs.contains(&r.crc.as_str()) {
                crcs.push(r.crc.as_str());
            }
        }
        crcs
    }

    fn records_of(&self, crc: &str) -> Vec<&'a ConsentRecord> {
        self.records.iter().copied().filter(|r| r.crc == crc).collect()
    }

    /// WAP node names of one activity in first-appearance order.
    pub fn waps(&self, activity: Activity) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = Vec::new();
        for r in self.records.iter().copied().filter(|r| r.activity == activity) {
            if !names.contains(&r.wap_name.as_str()) {
                names.push(r.wap_name.as_str());
            }
        }
        names
    }

    /// Every assignment in the order the model needs them.
    pub fn all(&self, demand: &DemandSource) -> Result<Vec<Assignment>> {
        let mut assignments = self.supplied_assignments();
        assignments.extend(self.consent_assignments()?);
        assignments.extend(self.wap_assignments());
        assignments.extend(self.demand_assignments(demand));
        assignments.extend(self.consumption_assignments());
        Ok(assignments)
    }

    /// Supplied daily volume of each WAP, read back from the previous step.
    pub fn supplied_assignments(&self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for activity in Activity::ABSTRACTIONS {
            for wap in self.waps(activity) {
                let source = if activity == Activity::DivertSurfaceWater {
                    diverted_inflow(wap)
                } else {
                    supply_delivered(wap)
                };
                assignments.push(Assignment::activity_level(
                    wap_branch(activity, SUPPLIED_DAILY_VOLUME, wap),
                    Expr::prev_ts_value(source),
                ));
            }
        }
        assignments
    }

    /// The `\Other Assumptions\Consents` tree.
    pub fn consent_assignments(&self) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        for crc in self.consents() {
            info!("Adding conditions for {}", crc);
            let records = self.records_of(crc);
            let consent = consent_branch(crc);
            let limits = ConsentLimits::of(&records);

            let crc_active = self
                .crc_active
                .column(crc)
                .ok_or_else(|| CoreError::MissingColumn(format!("{} in {}", crc, self.crc_active.path)))?;
            assignments.push(Assignment::activity_level(consent.child(ACTIVE), crc_active));

            for record in &records {
                assignments.extend(self.wap_record_assignments(record, &records, &limits)?);
            }

            let pro_rata: Vec<Expr> = records
                .iter()
                .filter(|r| has_pro_rata_volume(r))
                .map(|r| branch_expr(record_branch(r).child(MAX_VOLUME_PRO_RATA)))
                .collect();
            if !pro_rata.is_empty() {
                assignments.push(Assignment::activity_level(
                    consent.child(SUM_MAX_VOLUME_PRO_RATA),
                    Expr::sum(pro_rata),
                ));
            }
            if let Some((volume, period)) = limits.volume_return_period {
                assignments.push(Assignment::activity_level(consent.child(VOLUME_RETURN_PERIOD), Expr::num(volume)));
                assignments.push(Assignment::activity_level(consent.child(RETURN_PERIOD), Expr::num(period)));
            }
            if let Some(volume) = limits.annual_volume {
                assignments.push(Assignment::activity_level(consent.child(ANNUAL_VOLUME), Expr::num(volume)));
            }
            if let Some(volume) = limits.annual_volume_combined {
                assignments.push(Assignment::activity_level(
                    consent.child(ANNUAL_VOLUME_COMBINED),
                    Expr::num(volume),
                ));
            }

            let supplied = consent.child(SUPPLIED_DAILY_VOLUME);
            assignments.push(Assignment::activity_level(
                supplied.clone(),
                Expr::sum(
                    records
                        .iter()
                        .map(|r| branch_expr(record_branch(r).child(SUPPLIED_DAILY_VOLUME))),
                ),
            ));
            let restrictions = Expr::sum(
                records
                    .iter()
                    .map(|r| branch_expr(record_branch(r).child(RESTRICTION_DAILY_VOLUME))),
            );
            assignments.push(Assignment::activity_level(
                consent.child(NON_COMPLIANCE_DAILY_VOLUME),
                Expr::max(Expr::num(0.0), branch_expr(supplied) - restrictions),
            ));
        }
        Ok(assignments)
    }

    fn wap_record_assignments(
        &self,
        record: &ConsentRecord,
        consent_records: &[&ConsentRecord],
        limits: &ConsentLimits,
    ) -> Result<Vec<Assignment>> {
        let branch = record_branch(record);
        let key = record.crc_wap_key();
        let wap_active = self
            .crc_wap_active
            .column(&key)
            .ok_or_else(|| CoreError::MissingColumn(format!("{} in {}", key, self.crc_wap_active.path)))?;

        let rate = record.wap_max_rate.unwrap_or_else(|| {
            warn!("{} / {} has no maximum rate, using 0", record.crc, record.wap);
            0.0
        });
        let max_daily_rate = Expr::num(rate * LITRES_PER_SECOND_TO_DAILY_M3)
            * branch_expr(consent_branch(&record.crc).child(ACTIVE))
            * branch_expr(branch.child(ACTIVE));
        let fraction = branch_expr(branch.child(MAX_DAILY_RATE))
            / branch_expr(wap_branch(record.activity, MAX_DAILY_RATE, &record.wap_name));
        let supplied = branch_expr(wap_branch(record.activity, SUPPLIED_DAILY_VOLUME, &record.wap_name))
            * branch_expr(branch.child(FRACTION));

        let mut assignments = vec![
            Assignment::activity_level(branch.child(ACTIVE), wap_active),
            Assignment::activity_level(branch.child(BALLOCATED), self.ballocated(record)),
            Assignment::activity_level(branch.child(MAX_DAILY_RATE), max_daily_rate),
            Assignment::activity_level(branch.child(FRACTION), fraction),
        ];
        if let Some(pro_rata) = record.wap_max_rate_pro_rata {
            assignments.push(Assignment::activity_level(
                branch.child(MAX_DAILY_RATE_PRO_RATA),
                Expr::num(pro_rata * LITRES_PER_SECOND_TO_DAILY_M3),
            ));
        }
        if let (Some(volume), Some(period)) = (record.wap_max_vol_pro_rata, record.wap_return_period) {
            assignments.push(Assignment::activity_level(branch.child(MAX_VOLUME_PRO_RATA), Expr::num(volume)));
            assignments.push(Assignment::activity_level(branch.child(RETURN_PERIOD), Expr::num(period)));
        }
        assignments.push(Assignment::activity_level(branch.child(SUPPLIED_DAILY_VOLUME), supplied));
        assignments.push(Assignment::activity_level(
            branch.child(RESTRICTION_DAILY_VOLUME),
            self.restriction_daily_volume(record, consent_records, limits),
        ));
        Ok(assignments)
    }

    /// Band allocation of a consent/WAP, or 1 when it is not restricted.
    pub fn ballocated(&self, record: &ConsentRecord) -> Expr {
        if !record.has_lowflow_restriction() {
            return Expr::num(1.0);
        }
        let site = self.settings.low_flow_site.as_deref();
        let band = record.band();
        match (site, band) {
            (Some(site), Some(band))
                if self
                    .settings
                    .known_bands
                    .as_ref()
                    .map_or(true, |known| known.contains(&band)) =>
            {
                debug!("Adding Ballocated for {} {} band_num_{}", record.crc, record.long_name(), band);
                branch_expr(low_flow_band(site, band).child(BALLOCATED))
            }
            _ => {
                warn!(
                    "Ballocated for {} {} band {:?} is set to 1",
                    record.crc,
                    record.long_name(),
                    record.band_no
                );
                Expr::num(1.0)
            }
        }
    }

    /// Sum of what the given takes delivered over a window, each weighted
    /// by its consent's share of the WAP.
    fn delivered_over(takes: &[&ConsentRecord], window: &Expr) -> Vec<Expr> {
        takes
            .iter()
            .map(|t| {
                Expr::prev_ts_sum(supply_delivered(&t.wap_name), window.clone())
                    * branch_expr(record_branch(t).child(FRACTION))
            })
            .collect()
    }

    /// The restriction daily volume of one consent/WAP.
    pub fn restriction_daily_volume(
        &self,
        record: &ConsentRecord,
        consent_records: &[&ConsentRecord],
        limits: &ConsentLimits,
    ) -> Expr {
        let branch = record_branch(record);
        let consent = consent_branch(&record.crc);
        let takes: Vec<&ConsentRecord> = consent_records
            .iter()
            .copied()
            .filter(|r| r.activity.is_take())
            .collect();
        let mut restriction = branch_expr(branch.child(MAX_DAILY_RATE));

        if let Some((_, period)) = limits.volume_return_period {
            if whole(period) > 1 {
                let window = branch_expr(consent.child(RETURN_PERIOD));
                restriction = cap(
                    restriction,
                    branch_expr(consent.child(VOLUME_RETURN_PERIOD)),
                    Self::delivered_over(&takes, &window),
                    record,
                    VOLUME_RETURN_PERIOD,
                );
            }
        }

        if let (true, Some(period)) = (has_pro_rata_volume(record), record.wap_return_period) {
            if whole(period) > 1 {
                let terms = consent_records
                    .iter()
                    .filter(|r| has_pro_rata_volume(r))
                    .map(|r| {
                        let used = if r.wap_name.contains("_SW") || r.wap_name.contains("_GW") {
                            supply_delivered(&r.wap_name)
                        } else {
                            streamflow(&r.wap_name)
                        };
                        let window = branch_expr(record_branch(r).child(RETURN_PERIOD));
                        Expr::prev_ts_sum(used, window) * branch_expr(record_branch(r).child(FRACTION))
                    })
                    .collect();
                restriction = cap(
                    restriction,
                    branch_expr(consent.child(SUM_MAX_VOLUME_PRO_RATA)),
                    terms,
                    record,
                    SUM_MAX_VOLUME_PRO_RATA,
                );
            } else {
                restriction = Expr::min(restriction, branch_expr(branch.child(MAX_VOLUME_PRO_RATA)));
            }
        }

        let annual_window = Expr::num(ANNUAL_WINDOW);
        if let Some(volume) = limits.annual_volume {
            if whole(volume) > 0 {
                restriction = cap(
                    restriction,
                    branch_expr(consent.child(ANNUAL_VOLUME)),
                    Self::delivered_over(&takes, &annual_window),
                    record,
                    ANNUAL_VOLUME,
                );
            }
        }

        if let Some(volume) = limits.annual_volume_combined {
            if whole(volume) > 0 {
                let associated = consent_records
                    .first()
                    .map(|r| r.associated())
                    .unwrap_or_default();
                if associated.is_empty() {
                    info!("No associated consents found for {}", record.crc);
                } else {
                    let mut terms = Vec::new();
                    for other in &associated {
                        let other_records = self.records_of(other);
                        match ConsentLimits::of(&other_records).annual_volume_combined {
                            Some(v) if whole(v) == whole(volume) => {
                                let other_takes: Vec<&ConsentRecord> = other_records
                                    .into_iter()
                                    .filter(|r| r.activity.is_take())
                                    .collect();
                                terms.extend(Self::delivered_over(&other_takes, &annual_window));
                            }
                            Some(_) => debug!(
                                "Associated consent {} has a different combined annual volume than {}",
                                other, record.crc
                            ),
                            None => info!(
                                "Associated consent {} has no combined annual volume and is not added",
                                other
                            ),
                        }
                    }
                    terms.extend(Self::delivered_over(&takes, &annual_window));
                    restriction = cap(
                        restriction,
                        branch_expr(consent.child(ANNUAL_VOLUME_COMBINED)),
                        terms,
                        record,
                        ANNUAL_VOLUME_COMBINED,
                    );
                }
            }
        }

        let ballocated = branch_expr(branch.child(BALLOCATED));
        match record.wap_max_rate_pro_rata {
            Some(_) => Expr::max(
                Expr::num(0.0),
                Expr::min(branch_expr(branch.child(MAX_DAILY_RATE_PRO_RATA)), restriction) * ballocated,
            ),
            None => Expr::max(Expr::num(0.0), restriction * ballocated),
        }
    }

    /// Per-WAP sums over consents under `\Key Assumptions\WAPs`.
    pub fn wap_assignments(&self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for activity in Activity::ABSTRACTIONS {
            for wap in self.waps(activity) {
                let holders: Vec<&ConsentRecord> = self
                    .records
                    .iter()
                    .copied()
                    .filter(|r| r.activity == activity && r.wap_name == wap)
                    .collect();
                let summed = |quantity: &str| {
                    Expr::sum(holders.iter().map(|r| branch_expr(record_branch(r).child(quantity))))
                };
                let restriction = wap_branch(activity, RESTRICTION_DAILY_VOLUME, wap);
                assignments.push(Assignment::activity_level(
                    wap_branch(activity, MAX_DAILY_RATE, wap),
                    summed(MAX_DAILY_RATE),
                ));
                assignments.push(Assignment::activity_level(restriction.clone(), summed(RESTRICTION_DAILY_VOLUME)));
                assignments.push(Assignment::activity_level(
                    wap_branch(activity, NON_COMPLIANCE_DAILY_VOLUME, wap),
                    Expr::max(
                        Expr::num(0.0),
                        branch_expr(wap_branch(activity, SUPPLIED_DAILY_VOLUME, wap)) - branch_expr(restriction),
                    ),
                ));
            }
        }
        assignments
    }

    /// Demand of every take WAP and the link from its demand node.
    pub fn demand_assignments(&self, demand: &DemandSource) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for activity in [Activity::TakeGroundwater, Activity::TakeSurfaceWater] {
            for wap in self.waps(activity) {
                let expression = match demand {
                    DemandSource::Restriction => {
                        branch_expr(wap_branch(activity, RESTRICTION_DAILY_VOLUME, wap))
                    }
                    DemandSource::Zero => Expr::num(0.0),
                    DemandSource::Series(file) => {
                        let column = demand_column(wap);
                        match file.column(&column) {
                            Some(expr) => expr,
                            None => {
                                warn!("No demand column {} for {} in {}, skipped", column, wap, file.path);
                                continue;
                            }
                        }
                    }
                };
                let demand_branch = wap_branch(activity, DEMAND, wap);
                assignments.push(Assignment::activity_level(demand_branch.clone(), expression));
                if !wap.contains("_SD") {
                    assignments.push(Assignment::new(demand_site(wap), DAILY_DEMAND, branch_expr(demand_branch)));
                }
            }
        }
        assignments
    }

    /// Consumption (%) of each take node: the consumption of its use types
    /// weighted by maximum rate. Stream depletion nodes return everything.
    pub fn consumption_assignments(&self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for activity in [Activity::TakeGroundwater, Activity::TakeSurfaceWater] {
            for wap in self.waps(activity) {
                let expression = if wap.contains("_SD") {
                    Expr::num(0.0)
                } else {
                    let holders: Vec<&ConsentRecord> = self
                        .records
                        .iter()
                        .copied()
                        .filter(|r| r.wap_name == wap)
                        .collect();
                    match weighted_consumption(&holders) {
                        Some(value) => Expr::num(value),
                        None => {
                            warn!("No consumption for {}, not set", wap);
                            continue;
                        }
                    }
                };
                assignments.push(Assignment::new(demand_site(wap), CONSUMPTION, expression));
            }
        }
        assignments
    }

    /// Cap transmission links and diverts at the restriction daily volume,
    /// converted to a flow. With `restrict` off the caps are cleared to 0.
    pub fn link_assignments(&self, restrict: bool) -> Vec<Assignment> {
        let to_flow = |activity: Activity, wap: &str| {
            if restrict {
                branch_expr(wap_branch(activity, RESTRICTION_DAILY_VOLUME, wap))
                    / (Expr::num(24.0) * Expr::num(3600.0))
            } else {
                Expr::num(0.0)
            }
        };
        let mut assignments = Vec::new();
        for wap in self.waps(Activity::TakeSurfaceWater) {
            if wap.contains("_SW") {
                assignments.push(Assignment::new(
                    transmission_link(wap),
                    MAXIMUM_FLOW_VOLUME,
                    to_flow(Activity::TakeSurfaceWater, wap),
                ));
            }
        }
        for wap in self.waps(Activity::TakeGroundwater) {
            if wap.contains("_GW") && !wap.contains("_SD") {
                assignments.push(Assignment::new(
                    transmission_link(wap),
                    MAXIMUM_FLOW_VOLUME,
                    to_flow(Activity::TakeGroundwater, wap),
                ));
            }
        }
        for wap in self.waps(Activity::DivertSurfaceWater) {
            if wap.contains("_Divert") {
                assignments.push(Assignment::new(
                    river_node(wap),
                    MAXIMUM_DIVERSION,
                    to_flow(Activity::DivertSurfaceWater, wap),
                ));
            }
        }
        assignments
    }
}

/// `Min(restriction, limit - (terms))`; without terms the cap is skipped.
fn cap(restriction: Expr, limit: Expr, terms: Vec<Expr>, record: &ConsentRecord, condition: &str) -> Expr {
    if terms.is_empty() {
        warn!(
            "{} of {} has no takes to count against it, condition skipped for {}",
            condition,
            record.crc,
            record.long_name()
        );
        return restriction;
    }
    Expr::min(restriction, limit - Expr::sum(terms))
}

/// Rate-weighted mean consumption, rounded to two decimals.
fn weighted_consumption(records: &[&ConsentRecord]) -> Option<f64> {
    let total_rate: f64 = records.iter().filter_map(|r| r.wap_max_rate).sum();
    if total_rate <= 0.0 {
        return None;
    }
    let weighted: Vec<f64> = records
        .iter()
        .filter_map(|r| Some(r.consumption? * r.wap_max_rate? / total_rate))
        .collect();
    if weighted.is_empty() {
        return None;
    }
    let sum: f64 = weighted.iter().sum();
    Some((sum * 100.0).round() / 100.0)
}

/// Demand series column of a WAP: its id without the node suffix.
fn demand_column(wap_name: &str) -> String {
    let id = wap_name
        .split("_GW")
        .next()
        .unwrap_or(wap_name)
        .split("_SW")
        .next()
        .unwrap_or(wap_name);
    id.replace('_', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONSENTS: &str = "\
crc,wap,wap_name,wap_name_long,Activity,fmDate,toDate,from_month,to_month,wap_max_rate [l/s],wap_max_rate_pro_rata [l/s],wap_max_vol_pro_rata [m3],wap_return_period [d],crc_vol_return_period [m3],crc_return_period [d],crc_ann_vol [m3],crc_ann_vol_combined [m3],associated_crcs,lowflow_restriction,BandNo,use_type
CRC1,L36/0001,L36_0001_GW,L36_0001_GW,Take Groundwater,01/07/2015,30/06/2030,1,12,10,,,,5000,7,,,,1,2,Irrigation
CRC1,SW01,SW01_SW,SW01_SW,Take Surface Water,01/07/2015,30/06/2030,1,12,25,20,,,,,,,,0,,Irrigation
CRC2,SW01,SW01_SW,SW01_SW,Take Surface Water,01/07/2015,30/06/2030,1,12,5,,2000,1,,,100000,,,1,9,Irrigation
CRC3,DV01,DV01_Divert,DV01_Divert,Divert Surface Water,01/07/2015,30/06/2030,1,12,50,,3000,5,,,,80000,CRC4,1,,Other
CRC4,L36/0009,L36_0009_GW,L36_0009_GW,Take Groundwater,01/07/2015,30/06/2030,1,12,8,,,,,,,80000,CRC3,1,,Other
CRC5,OUT1,OUT1,OUT1,Discharge water to water,01/07/2015,30/06/2030,1,12,1,,,,,,,,,1,,Other
";

    fn records() -> Vec<ConsentRecord> {
        ConsentRecord::parse_consent_csv(CONSENTS).unwrap()
    }

    fn files() -> (SeriesFile, SeriesFile) {
        let crcs = ["CRC1", "CRC2", "CRC3", "CRC4"].iter().map(|s| s.to_string()).collect();
        let crc_waps = [
            "CRC1_L36_0001_GW",
            "CRC1_SW01_SW",
            "CRC2_SW01_SW",
            "CRC3_DV01_Divert",
            "CRC4_L36_0009_GW",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        (
            SeriesFile::new("crc_active.csv", crcs),
            SeriesFile::new("crc_wap_active.csv", crc_waps),
        )
    }

    fn settings() -> ConsentSettings {
        ConsentSettings {
            low_flow_site: Some("Opihi River at SH1".to_string()),
            known_bands: Some([1, 2, 3].into_iter().collect()),
        }
    }

    fn find<'a>(assignments: &'a [Assignment], branch: &str) -> &'a Assignment {
        assignments
            .iter()
            .find(|a| a.branch.full_name() == branch)
            .unwrap_or_else(|| panic!("no assignment for {}", branch))
    }

    #[test]
    fn test_consents_skip_discharges() {
        let records = records();
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        assert_eq!(gen.consents(), vec!["CRC1", "CRC2", "CRC3", "CRC4"]);
        assert_eq!(gen.waps(Activity::TakeSurfaceWater), vec!["SW01_SW"]);
    }

    #[test]
    fn test_wap_record_expressions() {
        let records = records();
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        let all = gen.consent_assignments().unwrap();

        let base = "\\Other Assumptions\\Consents\\CRC1\\SW01_SW";
        assert_eq!(
            find(&all, "\\Other Assumptions\\Consents\\CRC1\\Active").expression.to_string(),
            "ReadFromFile(crc_active.csv, 1, , , , Interpolate)"
        );
        assert_eq!(
            find(&all, &format!("{}\\Active", base)).expression.to_string(),
            "ReadFromFile(crc_wap_active.csv, 2, , , , Interpolate)"
        );
        assert_eq!(
            find(&all, &format!("{}\\Max daily rate", base)).expression.to_string(),
            format!(
                "{} * \\Other Assumptions\\Consents\\CRC1\\Active * {}\\Active",
                25.0 * 86.4,
                base
            )
        );
        assert_eq!(
            find(&all, &format!("{}\\Fraction", base)).expression.to_string(),
            format!(
                "{}\\Max daily rate / \\Key Assumptions\\WAPs\\Take Surface Water\\Max daily rate\\SW01_SW",
                base
            )
        );
        // unrestricted take
        assert_eq!(find(&all, &format!("{}\\Ballocated", base)).expression.to_string(), "1");
        // known band
        assert_eq!(
            find(&all, "\\Other Assumptions\\Consents\\CRC1\\L36_0001_GW\\Ballocated")
                .expression
                .to_string(),
            "\\Key Assumptions\\Low Flows\\Opihi River at SH1\\band_num_2\\Ballocated"
        );
        // unknown band falls back to 1
        assert_eq!(
            find(&all, "\\Other Assumptions\\Consents\\CRC2\\SW01_SW\\Ballocated")
                .expression
                .to_string(),
            "1"
        );
    }

    #[test]
    fn test_restriction_with_return_period_volume() {
        let records = records();
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        let all = gen.consent_assignments().unwrap();
        let c = "\\Other Assumptions\\Consents\\CRC1";
        let expected = format!(
            "Max(0, Min({c}\\SW01_SW\\Max daily rate pro rata, Min({c}\\SW01_SW\\Max daily rate, {c}\\Volume return period - \
             (PrevTSValue(Demand Sites and Catchments\\L36_0001_GW:Supply Delivered[m^3], 1, {c}\\Return period - 1, Sum) * {c}\\L36_0001_GW\\Fraction + \
             PrevTSValue(Demand Sites and Catchments\\SW01_SW:Supply Delivered[m^3], 1, {c}\\Return period - 1, Sum) * {c}\\SW01_SW\\Fraction))) * {c}\\SW01_SW\\Ballocated)",
            c = c
        );
        assert_eq!(
            find(&all, &format!("{}\\SW01_SW\\Restriction daily volume", c)).expression.to_string(),
            expected
        );
        assert_eq!(
            find(&all, &format!("{}\\Non_compliance daily volume", c)).expression.to_string(),
            format!(
                "Max(0, {c}\\Supplied daily volume - ({c}\\L36_0001_GW\\Restriction daily volume + {c}\\SW01_SW\\Restriction daily volume))",
                c = c
            )
        );
    }

    #[test]
    fn test_restriction_with_own_pro_rata_and_annual_volume() {
        let records = records();
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        let all = gen.consent_assignments().unwrap();
        let c = "\\Other Assumptions\\Consents\\CRC2";
        let expected = format!(
            "Max(0, Min(Min({c}\\SW01_SW\\Max daily rate, {c}\\SW01_SW\\Max volume pro rata), {c}\\Annual volume - \
             PrevTSValue(Demand Sites and Catchments\\SW01_SW:Supply Delivered[m^3], 1, 366 - 1, Sum) * {c}\\SW01_SW\\Fraction) * {c}\\SW01_SW\\Ballocated)",
            c = c
        );
        assert_eq!(
            find(&all, &format!("{}\\SW01_SW\\Restriction daily volume", c)).expression.to_string(),
            expected
        );
        assert_eq!(
            find(&all, &format!("{}\\Sum max volume pro rata", c)).expression.to_string(),
            format!("{}\\SW01_SW\\Max volume pro rata", c)
        );
    }

    #[test]
    fn test_restriction_divert_pro_rata_and_combined_volume() {
        let records = records();
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        let all = gen.consent_assignments().unwrap();

        // Divert pro-rata volume counts river streamflow; the combined
        // annual volume has no takes under CRC3 but counts CRC4's take.
        let c3 = "\\Other Assumptions\\Consents\\CRC3";
        let c4 = "\\Other Assumptions\\Consents\\CRC4";
        let expected = format!(
            "Max(0, Min(Min({c3}\\DV01_Divert\\Max daily rate, {c3}\\Sum max volume pro rata - \
             PrevTSValue(Supply and Resources\\River\\DV01_Divert:Streamflow[m^3], 1, {c3}\\DV01_Divert\\Return period - 1, Sum) * {c3}\\DV01_Divert\\Fraction), \
             {c3}\\Annual volume combined - PrevTSValue(Demand Sites and Catchments\\L36_0009_GW:Supply Delivered[m^3], 1, 366 - 1, Sum) * {c4}\\L36_0009_GW\\Fraction) * {c3}\\DV01_Divert\\Ballocated)",
            c3 = c3,
            c4 = c4
        );
        assert_eq!(
            find(&all, &format!("{}\\DV01_Divert\\Restriction daily volume", c3)).expression.to_string(),
            expected
        );
    }

    #[test]
    fn test_missing_activity_column_is_an_error() {
        let records = records();
        let (_, crc_wap) = files();
        let crc = SeriesFile::new("crc_active.csv", vec!["CRC1".to_string()]);
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        assert!(matches!(gen.consent_assignments(), Err(CoreError::MissingColumn(_))));
    }

    #[test]
    fn test_wap_sums_and_links() {
        let records = records();
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        let waps = gen.wap_assignments();
        let ka = "\\Key Assumptions\\WAPs\\Take Surface Water";
        assert_eq!(
            find(&waps, &format!("{}\\Max daily rate\\SW01_SW", ka)).expression.to_string(),
            "\\Other Assumptions\\Consents\\CRC1\\SW01_SW\\Max daily rate + \\Other Assumptions\\Consents\\CRC2\\SW01_SW\\Max daily rate"
        );
        assert_eq!(
            find(&waps, &format!("{}\\Non_compliance daily volume\\SW01_SW", ka)).expression.to_string(),
            format!("Max(0, {ka}\\Supplied daily volume\\SW01_SW - {ka}\\Restriction daily volume\\SW01_SW)", ka = ka)
        );

        let links = gen.link_assignments(true);
        assert_eq!(links.len(), 4);
        let divert = find(&links, "\\Supply and Resources\\River\\DV01_Divert");
        assert_eq!(divert.variable, MAXIMUM_DIVERSION);
        assert_eq!(
            divert.expression.to_string(),
            "\\Key Assumptions\\WAPs\\Divert Surface Water\\Restriction daily volume\\DV01_Divert / (24 * 3600)"
        );
        assert!(gen.link_assignments(false).iter().all(|a| a.expression == Expr::num(0.0)));
    }

    #[test]
    fn test_supplied_and_demand() {
        let records = records();
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        let supplied = gen.supplied_assignments();
        assert_eq!(
            find(&supplied, "\\Key Assumptions\\WAPs\\Divert Surface Water\\Supplied daily volume\\DV01_Divert")
                .expression
                .to_string(),
            "PrevTSValue(Supply and Resources\\River\\DV01_Divert\\Reaches\\Below DV01_Divert Diverted Inflow:Streamflow[m^3])"
        );

        let series = SeriesFile::new("demand.csv", vec!["L36/0001".to_string(), "SW01".to_string()]);
        let demand = gen.demand_assignments(&DemandSource::Series(series));
        assert_eq!(
            find(&demand, "\\Key Assumptions\\WAPs\\Take Groundwater\\Demand\\L36_0001_GW")
                .expression
                .to_string(),
            "ReadFromFile(demand.csv, 1, , , , Interpolate)"
        );
        // L36/0009 has no column and is skipped
        assert!(demand.iter().all(|a| !a.branch.full_name().ends_with("L36_0009_GW")));
        let link = find(&demand, "\\Demand Sites and Catchments\\SW01_SW");
        assert_eq!(link.variable, DAILY_DEMAND);

        let zero = gen.demand_assignments(&DemandSource::Zero);
        assert_eq!(zero.len(), 6);
    }

    #[test]
    fn test_consumption_weighted_by_rate() {
        let mut records = records();
        records[1].consumption = Some(80.0);
        records[2].consumption = Some(50.0);
        let (crc, crc_wap) = files();
        let settings = settings();
        let gen = ConsentExpressions::new(&records, &crc, &crc_wap, &settings);
        let consumption = gen.consumption_assignments();
        // SW01_SW: (80 * 25 + 50 * 5) / 30
        assert_eq!(consumption.len(), 1);
        assert_eq!(consumption[0].variable, CONSUMPTION);
        assert_eq!(consumption[0].expression, Expr::num(75.0));
    }

    #[test]
    fn test_demand_column() {
        assert_eq!(demand_column("L36_0001_GW"), "L36/0001");
        assert_eq!(demand_column("SW01_SW"), "SW01");
    }
}
