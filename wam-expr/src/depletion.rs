//! `Daily Demand` of the stream depletion nodes: each groundwater take has a
//! `<wap_name>_SD` demand site that draws the depletion of its well from the
//! river.

use crate::assignment::{Assignment, DAILY_DEMAND};
use crate::branch::stream_depletion_site;
use crate::consent::SeriesFile;
use crate::expr::Expr;
use log::debug;
use wam_core::table::TOTAL_COLUMN;

/// One assignment per depleting well in `depletion`, reading its column of
/// the written table. With `zero` set every node gets a demand of 0.
pub fn stream_depletion_assignments(depletion: &SeriesFile, zero: bool) -> Vec<Assignment> {
    depletion
        .columns
        .iter()
        .filter(|name| name.as_str() != TOTAL_COLUMN)
        .filter_map(|well| {
            let expression = if zero {
                Expr::num(0.0)
            } else {
                depletion.column(well)?
            };
            debug!("Stream depletion demand for {}_SD: {}", well, expression);
            Some(Assignment::new(stream_depletion_site(well), DAILY_DEMAND, expression))
        })
        .collect()
}
