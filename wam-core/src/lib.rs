pub mod band;
pub mod consent;
pub mod error;
pub mod lists;
pub mod serde_helpers;
pub mod table;
pub mod well;
