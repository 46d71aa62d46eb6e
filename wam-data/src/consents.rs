use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use wam_core::consent::{Activity, ConsentRecord};

/// Use types grouped into the classes consumption is defined for.
pub const USE_TYPE_CLASSES: [(&str, &str); 14] = [
    ("Irrigation - Pasture", "Irrigation"),
    ("Irrigation - Mixed", "Irrigation"),
    ("Irrigation - Arable (Cropping)", "Irrigation"),
    ("Aquaculture", "Other"),
    ("Recreation/Sport", "Other"),
    ("Firefighting", "Other"),
    ("Industrial Use - Other", "Other"),
    ("Construction", "Other"),
    ("Augment Flow/Wetland", "Other"),
    ("Viticulture", "Other"),
    ("Community Water Supply", "Domestic"),
    ("Domestic Use", "Domestic"),
    ("Cooling Water (non HVAC)", "Hydropower"),
    ("Power Generation", "Hydropower"),
];

/// The class of a use type; unknown use types are their own class.
pub fn reclassify_use_type(use_type: &str) -> &str {
    USE_TYPE_CLASSES
        .iter()
        .find(|(from, _)| *from == use_type)
        .map(|(_, to)| *to)
        .unwrap_or(use_type)
}

/// Keep records of `activity` only at allowed WAPs; other activities pass.
pub fn filter_waps(records: Vec<ConsentRecord>, activity: Activity, allowed: &BTreeSet<String>) -> Vec<ConsentRecord> {
    let before = records.len();
    let kept: Vec<ConsentRecord> = records
        .into_iter()
        .filter(|r| r.activity != activity || allowed.contains(&r.wap))
        .collect();
    info!("{}: kept {} of {} records", activity, kept.len(), before);
    kept
}

/// Keep discharge records only of allowed consents; other activities pass.
pub fn filter_discharges(records: Vec<ConsentRecord>, allowed: &BTreeSet<String>) -> Vec<ConsentRecord> {
    let before = records.len();
    let kept: Vec<ConsentRecord> = records
        .into_iter()
        .filter(|r| !r.activity.is_discharge() || allowed.contains(&r.crc))
        .collect();
    info!("{}: kept {} of {} records", Activity::Discharge, kept.len(), before);
    kept
}

/// A volume without a period applies per day; a period without a volume
/// means nothing.
pub fn apply_return_period_defaults(records: &mut [ConsentRecord]) {
    for r in records.iter_mut() {
        match (r.wap_max_vol_pro_rata, r.wap_return_period) {
            (Some(_), None) => r.wap_return_period = Some(1.0),
            (None, Some(_)) => r.wap_return_period = None,
            _ => {}
        }
        match (r.crc_vol_return_period, r.crc_return_period) {
            (Some(_), None) => r.crc_return_period = Some(1.0),
            (None, Some(_)) => r.crc_return_period = None,
            _ => {}
        }
    }
}

/// Drop exact duplicates, keeping the first occurrence.
pub fn remove_duplicates(records: Vec<ConsentRecord>) -> Vec<ConsentRecord> {
    let mut unique: Vec<ConsentRecord> = Vec::with_capacity(records.len());
    for r in records {
        if unique.contains(&r) {
            debug!("Dropping duplicate record {} / {}", r.crc, r.wap);
        } else {
            unique.push(r);
        }
    }
    unique
}

/// Give every WAP a name unique within its consent.
///
/// A WAP that appears more than once in a consent (e.g. different limits
/// for parts of the year) is numbered `<wap_name>_1`, `<wap_name>_2`, ...
/// All other records get their `wap_name`.
pub fn number_repeated_waps(records: &mut [ConsentRecord]) {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for r in records.iter().filter(|r| !r.activity.is_discharge()) {
        *counts.entry((r.crc.clone(), r.wap_name.clone())).or_insert(0) += 1;
    }
    let mut seen: HashMap<(String, String), usize> = HashMap::new();
    for r in records.iter_mut() {
        let key = (r.crc.clone(), r.wap_name.clone());
        let repeated = !r.activity.is_discharge() && counts.get(&key).copied().unwrap_or(0) > 1;
        if repeated {
            let n = seen.entry(key).or_insert(0);
            *n += 1;
            r.wap_name_long = Some(format!("{}_{}", r.wap_name, n));
        } else if r.wap_name_long.as_deref().map_or(true, |s| s.trim().is_empty()) {
            r.wap_name_long = Some(r.wap_name.clone());
        }
    }
}

/// Fix up a consent table before it is used to build the model.
///
/// Applies return period defaults, drops duplicates, numbers repeated
/// WAPs, reclassifies use types, joins consumption by use class when a
/// table is given and finally sorts by consent (stable).
pub fn cleanup(records: Vec<ConsentRecord>, consumption: Option<&HashMap<String, f64>>) -> Vec<ConsentRecord> {
    let mut records = records;
    apply_return_period_defaults(&mut records);
    let mut records = remove_duplicates(records);
    number_repeated_waps(&mut records);

    for r in records.iter_mut() {
        r.use_type_renamed = r
            .use_type
            .as_deref()
            .map(|u| reclassify_use_type(u).to_string());
    }

    match consumption {
        Some(table) => {
            for r in records.iter_mut() {
                r.consumption = r.use_type_renamed.as_ref().and_then(|u| table.get(u)).copied();
            }
        }
        None => warn!("No consumption table given; consumption cannot be set for demand nodes"),
    }

    let mut records = remove_duplicates(records);
    records.sort_by(|a, b| a.crc.cmp(&b.crc));
    info!("Consent table has {} records after cleanup", records.len());
    records
}
