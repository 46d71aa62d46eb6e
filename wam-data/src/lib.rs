//! Data preparation for the water allocation model.
//!
//! Each stage takes typed tables from `wam-core` and returns new ones, so a
//! pipeline is just a sequence of calls:
//!
//! - [`consents`]: allow-list filters and cleanup of the consent table
//! - [`activity`]: daily on/off series of consents and consent/WAP pairs
//! - [`bands`]: latest low-flow bands with descriptions, IRF series
//! - [`depletion`]: stream depletion tables from pumping histories

pub mod activity;
pub mod bands;
pub mod consents;
pub mod depletion;
