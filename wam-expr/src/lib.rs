//! Expressions for the host water allocation model.
//!
//! The model is configured by setting formula strings on branch variables.
//! This crate builds those formulas as typed [`Expr`] trees addressed by
//! [`BranchPath`]s and collects them as [`Assignment`]s that can be written
//! out as a `branch,variable,expression` table.
//!
//! ```
//! use wam_expr::{lowflow, Expr};
//!
//! let allocated = lowflow::ballocated(Expr::key(["IRF", "Opihi River at SH1", "database"]));
//! assert!(allocated.to_string().starts_with("If(max_trig=min_trig"));
//! ```

pub mod assignment;
pub mod branch;
pub mod consent;
pub mod depletion;
pub mod expr;
pub mod lowflow;

pub use assignment::Assignment;
pub use branch::BranchPath;
pub use consent::{ConsentExpressions, ConsentSettings, DemandSource, SeriesFile};
pub use expr::Expr;
