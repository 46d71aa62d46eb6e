//! Step-by-step depletion for use inside an external simulation loop.
//!
//! The host model's interactive mode asks for one depletion value per time
//! step. [`interactive_depletion`] is the pure form (history in, latest
//! value out); [`InteractiveDepletion`] owns the history and guards the
//! calling order.

use crate::error::{DepletionError, Result};
use crate::geometry::AquiferGeometry;
use crate::superposition::{depletion_at, step_changes};
use log::debug;

/// Depletion at the last step of `history`, the pumping rates from the
/// first time step up to and including the current one.
///
/// Equal to the last element of [`batch_depletion`](crate::batch_depletion)
/// over the same history. An empty history yields zero.
pub fn interactive_depletion(geometry: &AquiferGeometry, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let steps = step_changes(history);
    let kernel = geometry.kernel(steps.len());
    depletion_at(&kernel, &steps, steps.len() - 1)
}

/// Stateful driver for the interactive calculation.
///
/// Steps are zero-based and must arrive in order without gaps. A rejected
/// call leaves the accumulated history untouched.
#[derive(Debug, Clone)]
pub struct InteractiveDepletion {
    geometry: AquiferGeometry,
    history: Vec<f64>,
    kernel: Vec<f64>,
}

impl InteractiveDepletion {
    pub fn new(geometry: AquiferGeometry) -> Self {
        Self {
            geometry,
            history: Vec::new(),
            kernel: Vec::new(),
        }
    }

    /// The step index the next call to [`advance`](Self::advance) must carry.
    pub fn next_step(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn geometry(&self) -> &AquiferGeometry {
        &self.geometry
    }

    /// Record the pumping rate of time step `step` and return the stream
    /// depletion at that step.
    pub fn advance(&mut self, step: usize, rate: f64) -> Result<f64> {
        let expected = self.next_step();
        if step < expected {
            return Err(DepletionError::NonMonotonicStep { expected, got: step });
        }
        if step > expected {
            return Err(DepletionError::StepGap { expected, got: step });
        }
        self.history.push(if rate.is_nan() { 0.0 } else { rate });
        if self.kernel.len() < self.history.len() {
            // Kernel prefixes are stable, so growing it never changes earlier terms.
            let len = (self.history.len() * 2).max(64);
            self.kernel = self.geometry.kernel(len);
        }
        let steps = step_changes(&self.history);
        let value = depletion_at(&self.kernel, &steps, step);
        debug!("interactive depletion step {}: rate {} -> {}", step, rate, value);
        Ok(value)
    }

    /// Forget the accumulated history, e.g. at the start of a new scenario run.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superposition::batch_depletion;

    fn geometry() -> AquiferGeometry {
        AquiferGeometry::new(650.0, 0.01, 450.0).unwrap()
    }

    fn pumping() -> Vec<f64> {
        (0..120)
            .map(|i| match i % 17 {
                0..=5 => 15.0,
                6 => f64::NAN,
                7..=10 => 4.0 + i as f64 * 0.1,
                _ => 0.0,
            })
            .collect()
    }

    #[test]
    fn pure_form_matches_batch_at_every_step() {
        let g = geometry();
        let pumping = pumping();
        let batch = batch_depletion(&g, &pumping);
        for t in 0..pumping.len() {
            let value = interactive_depletion(&g, &pumping[..=t]);
            assert!(
                (value - batch[t]).abs() <= 1e-9,
                "step {}: interactive {} vs batch {}",
                t,
                value,
                batch[t]
            );
        }
    }

    #[test]
    fn driver_matches_batch_at_every_step() {
        let g = geometry();
        let pumping = pumping();
        let batch = batch_depletion(&g, &pumping);
        let mut driver = InteractiveDepletion::new(g);
        for (t, rate) in pumping.iter().enumerate() {
            let value = driver.advance(t, *rate).unwrap();
            assert!((value - batch[t]).abs() <= 1e-9);
        }
        assert_eq!(driver.next_step(), pumping.len());
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(interactive_depletion(&geometry(), &[]), 0.0);
    }

    #[test]
    fn rejects_repeated_step() {
        let mut driver = InteractiveDepletion::new(geometry());
        driver.advance(0, 5.0).unwrap();
        driver.advance(1, 5.0).unwrap();
        assert_eq!(
            driver.advance(1, 7.0),
            Err(DepletionError::NonMonotonicStep { expected: 2, got: 1 })
        );
        assert_eq!(driver.history(), &[5.0, 5.0]);
    }

    #[test]
    fn rejects_gap() {
        let mut driver = InteractiveDepletion::new(geometry());
        driver.advance(0, 5.0).unwrap();
        assert_eq!(
            driver.advance(3, 5.0),
            Err(DepletionError::StepGap { expected: 1, got: 3 })
        );
        assert_eq!(driver.next_step(), 1);
        assert!(driver.advance(1, 5.0).is_ok());
    }

    #[test]
    fn reset_starts_over() {
        let mut driver = InteractiveDepletion::new(geometry());
        let first = driver.advance(0, 9.0).unwrap();
        driver.advance(1, 9.0).unwrap();
        driver.reset();
        assert_eq!(driver.next_step(), 0);
        assert_eq!(driver.advance(0, 9.0).unwrap(), first);
    }
}
