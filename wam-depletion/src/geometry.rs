use crate::error::{DepletionError, Result};
use serde::{Deserialize, Serialize};

/// Hydraulic setting of one abstraction point relative to its stream.
///
/// Construction validates the parameters, so every `AquiferGeometry` in
/// circulation yields a finite, positive stream depletion factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AquiferGeometry {
    /// Shortest distance from well to stream (m)
    distance: f64,
    /// Storage coefficient (-)
    storage_coefficient: f64,
    /// Transmissivity (m²/day)
    transmissivity: f64,
}

fn check(parameter: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DepletionError::InvalidGeometry { parameter, value })
    }
}

impl AquiferGeometry {
    pub fn new(distance: f64, storage_coefficient: f64, transmissivity: f64) -> Result<Self> {
        Ok(Self {
            distance: check("distance", distance)?,
            storage_coefficient: check("storage coefficient", storage_coefficient)?,
            transmissivity: check("transmissivity", transmissivity)?,
        })
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn storage_coefficient(&self) -> f64 {
        self.storage_coefficient
    }

    pub fn transmissivity(&self) -> f64 {
        self.transmissivity
    }

    /// Stream depletion factor `L²S/T`, in days when L is in metres and T in m²/day.
    pub fn stream_depletion_factor(&self) -> f64 {
        self.distance.powi(2) * self.storage_coefficient / self.transmissivity
    }

    /// Fraction of a pumping step that has reached the stream after `days`
    /// of pumping. Callers guarantee `days > 0`.
    pub(crate) fn connection(&self, days: f64) -> f64 {
        libm::erfc((self.stream_depletion_factor() / (4.0 * days)).sqrt())
    }

    /// Response kernel for `len` daily steps: element `n` is the connection
    /// after `n + 1` days of pumping.
    pub(crate) fn kernel(&self, len: usize) -> Vec<f64> {
        let sdf = self.stream_depletion_factor();
        (1..=len)
            .map(|days| libm::erfc((sdf / (4.0 * days as f64)).sqrt()))
            .collect()
    }
}
