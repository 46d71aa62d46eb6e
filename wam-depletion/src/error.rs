/// Error types for stream depletion calculations
use thiserror::Error;

/// Failure modes of the depletion kernel. All of them mean invalid input;
/// the calculation is pure, so retrying never helps.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DepletionError {
    /// Distance, storage coefficient or transmissivity is not strictly positive
    #[error("Invalid aquifer geometry: {parameter} must be a positive finite number (got {value})")]
    InvalidGeometry { parameter: &'static str, value: f64 },

    /// Pumping duration is not strictly positive
    #[error("Invalid pumping duration: {0} (must be > 0)")]
    InvalidDuration(f64),

    /// Interactive driver received a step it has already seen
    #[error("Time step {got} is not after the last accepted step (expected {expected})")]
    NonMonotonicStep { expected: usize, got: usize },

    /// Interactive driver received a step beyond the next one
    #[error("Time step {got} skips ahead (expected {expected})")]
    StepGap { expected: usize, got: usize },
}

/// Type alias for Results using DepletionError
pub type Result<T> = std::result::Result<T, DepletionError>;
