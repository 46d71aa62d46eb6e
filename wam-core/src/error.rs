/// Error types for model input tables
use thiserror::Error;
use wam_depletion::DepletionError;

/// Main error type for reading and validating model input tables
#[derive(Error, Debug)]
pub enum CoreError {
    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Date parsing failed
    #[error("Failed to parse date: {0}")]
    DateParse(String),

    /// A required column is absent from the header row
    #[error("Missing column '{0}'")]
    MissingColumn(String),

    /// Daily series rows are not consecutive days
    #[error("Dates are not contiguous: {previous} is followed by {next}")]
    NonContiguousDates { previous: String, next: String },

    /// Pumping refers to a well without aquifer properties
    #[error("No aquifer properties for well '{0}'")]
    UnknownWell(String),

    /// Well properties cannot form a valid geometry
    #[error("Well '{well}': {source}")]
    Geometry {
        well: String,
        #[source]
        source: DepletionError,
    },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Type alias for Results using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;
