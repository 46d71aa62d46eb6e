//! Paths into the host model's branch tree, e.g.
//! `\Key Assumptions\Low Flows\Opihi River at SH1\band_num_2\Ballocated`.

use serde::{Serialize, Serializer};
use std::fmt;
use wam_core::consent::Activity;

pub const KEY_ASSUMPTIONS: &str = "Key Assumptions";
pub const OTHER_ASSUMPTIONS: &str = "Other Assumptions";
pub const DEMAND_SITES: &str = "Demand Sites and Catchments";
pub const SUPPLY_AND_RESOURCES: &str = "Supply and Resources";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchPath {
    segments: Vec<String>,
}

impl BranchPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn parent(&self) -> Option<BranchPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The path as the model prints it, with a leading backslash.
    pub fn full_name(&self) -> String {
        format!("\\{}", self.relative_name())
    }

    /// The path without the leading backslash, as used in result references.
    pub fn relative_name(&self) -> String {
        self.segments.join("\\")
    }
}

impl fmt::Display for BranchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl Serialize for BranchPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full_name())
    }
}

/// `\Key Assumptions\WAPs\<activity>\<quantity>\<wap_name>`
pub fn wap_branch(activity: Activity, quantity: &str, wap_name: &str) -> BranchPath {
    BranchPath::root(KEY_ASSUMPTIONS)
        .child("WAPs")
        .child(activity.label())
        .child(quantity)
        .child(wap_name)
}

/// `\Other Assumptions\Consents\<crc>`
pub fn consent_branch(crc: &str) -> BranchPath {
    BranchPath::root(OTHER_ASSUMPTIONS).child("Consents").child(crc)
}

/// `\Other Assumptions\Consents\<crc>\<wap_name_long>`
pub fn consent_wap_branch(crc: &str, wap_name_long: &str) -> BranchPath {
    consent_branch(crc).child(wap_name_long)
}

/// `\Key Assumptions\Low Flows\<site_name>\band_num_<band>`
pub fn low_flow_band(site_name: &str, band: u32) -> BranchPath {
    BranchPath::root(KEY_ASSUMPTIONS)
        .child("Low Flows")
        .child(site_name)
        .child(format!("band_num_{}", band))
}

/// `\Key Assumptions\IRF\<site_name>\<source>`
pub fn irf_branch(site_name: &str, source: &str) -> BranchPath {
    BranchPath::root(KEY_ASSUMPTIONS)
        .child("IRF")
        .child(site_name)
        .child(source)
}

/// Demand node of a take WAP.
pub fn demand_site(wap_name: &str) -> BranchPath {
    BranchPath::root(DEMAND_SITES).child(wap_name)
}

/// Stream depletion demand node of a groundwater take: `<wap_name>_SD`.
pub fn stream_depletion_site(wap_name: &str) -> BranchPath {
    demand_site(&format!("{}_SD", wap_name))
}

/// A river or divert node.
pub fn river_node(name: &str) -> BranchPath {
    BranchPath::root(SUPPLY_AND_RESOURCES).child("River").child(name)
}

/// Transmission link feeding a take WAP.
pub fn transmission_link(wap_name: &str) -> BranchPath {
    BranchPath::root(SUPPLY_AND_RESOURCES)
        .child("Transmission Links")
        .child(format!("to {}", wap_name))
}
