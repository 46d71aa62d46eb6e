//! Stream depletion tables: every pumped well of a wide pumping table run
//! through the superposition model.

use anyhow::Context;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use wam_core::error::CoreError;
use wam_core::table::SeriesTable;
use wam_core::well::Well;
use wam_depletion::{batch_depletion, AquiferGeometry, InteractiveDepletion};

/// Largest difference tolerated between the batch and interactive results.
pub const CONSISTENCY_TOLERANCE: f64 = 1e-9;

fn geometries<'a>(wells: &'a [Well], pumping: &SeriesTable) -> anyhow::Result<Vec<(&'a str, AquiferGeometry)>> {
    let by_id: HashMap<&str, &Well> = wells.iter().map(|w| (w.well_id.as_str(), w)).collect();
    for well in wells {
        if pumping.column(&well.well_id).is_none() {
            info!("Well {} has no pumping record, skipped", well.well_id);
        }
    }
    pumping
        .names()
        .iter()
        .map(|name| -> anyhow::Result<(&'a str, AquiferGeometry)> {
            let well: &'a Well = *by_id
                .get(name.as_str())
                .ok_or_else(|| CoreError::UnknownWell(name.clone()))?;
            Ok((well.well_id.as_str(), well.geometry()?))
        })
        .collect()
}

/// Depletion of every pumped well, same dates and column order as `pumping`.
///
/// Every pumping column needs a well; wells that are never pumped are
/// skipped. Missing pumping values count as zero.
pub fn deplete(wells: &[Well], pumping: &SeriesTable) -> anyhow::Result<SeriesTable> {
    for (name, missing) in pumping.missing_counts() {
        if missing > 0 {
            warn!("Pumping for {} has {} missing days, treated as zero", name, missing);
        }
    }
    let mut table = SeriesTable::with_dates(pumping.dates().to_vec())?;
    for (well_id, geometry) in geometries(wells, pumping)? {
        let rates = pumping
            .column(well_id)
            .with_context(|| format!("pumping column {}", well_id))?;
        debug!(
            "Depleting {} (SDF {:.3} days) over {} days",
            well_id,
            geometry.stream_depletion_factor(),
            rates.len()
        );
        table.push_column(well_id, batch_depletion(&geometry, rates))?;
    }
    info!("Computed depletion for {} wells over {} days", table.names().len(), table.len());
    Ok(table)
}

/// Agreement between the batch and the step-by-step result of one well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Divergence {
    pub well: String,
    pub max_abs_difference: f64,
}

impl Divergence {
    pub fn within_tolerance(&self) -> bool {
        self.max_abs_difference <= CONSISTENCY_TOLERANCE
    }
}

/// Replay each well step by step and compare with the batch `depleted`
/// table. Divergence above [`CONSISTENCY_TOLERANCE`] is logged and
/// reported, never corrected.
pub fn consistency_report(wells: &[Well], pumping: &SeriesTable, depleted: &SeriesTable) -> anyhow::Result<Vec<Divergence>> {
    let mut report = Vec::new();
    for (well_id, geometry) in geometries(wells, pumping)? {
        let rates = pumping
            .column(well_id)
            .with_context(|| format!("pumping column {}", well_id))?;
        let batch = depleted
            .column(well_id)
            .with_context(|| format!("no depletion computed for {}", well_id))?;
        let mut driver = InteractiveDepletion::new(geometry);
        let mut max_abs_difference: f64 = 0.0;
        for (step, (rate, expected)) in rates.iter().zip(batch).enumerate() {
            let value = driver.advance(step, *rate)?;
            max_abs_difference = max_abs_difference.max((value - expected).abs());
        }
        let divergence = Divergence {
            well: well_id.to_string(),
            max_abs_difference,
        };
        if divergence.within_tolerance() {
            debug!("{}: batch and interactive agree ({:e})", well_id, max_abs_difference);
        } else {
            warn!(
                "{}: batch and interactive depletion differ by up to {:e}",
                well_id, max_abs_difference
            );
        }
        report.push(divergence);
    }
    Ok(report)
}
