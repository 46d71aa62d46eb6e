//! Stream depletion caused by groundwater abstraction near a stream.
//!
//! The model is the analytical Theis/Glover solution: a well pumping at a
//! constant rate `q` for `d` days at distance `L` from a stream depletes the
//! stream at `erfc(sqrt(SDF / 4d)) * q`, where the stream depletion factor
//! `SDF = L²S/T`. Time-varying pumping is handled by superposing the
//! response of every step change in the pumping rate.
//!
//! # Usage
//!
//! ```rust
//! use wam_depletion::{AquiferGeometry, batch_depletion};
//!
//! let geometry = AquiferGeometry::new(500.0, 0.002, 300.0).unwrap();
//! let pumping = [10.0, 10.0, 0.0, f64::NAN, 5.0];
//! let depletion = batch_depletion(&geometry, &pumping);
//! assert_eq!(depletion.len(), pumping.len());
//! ```

pub mod error;
pub mod geometry;
pub mod interactive;
pub mod superposition;
pub mod theis;

pub use error::{DepletionError, Result};
pub use geometry::AquiferGeometry;
pub use interactive::{interactive_depletion, InteractiveDepletion};
pub use superposition::{batch_depletion, reconstruct, step_changes};
pub use theis::{theis, TheisResponse};
