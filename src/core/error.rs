use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be > 0")]
    NotPositive { field: &'static str },
    #[error("{field} must be >= 0")]
    Negative { field: &'static str },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("years must be > 0")]
    ZeroYears,
    #[error("horizon of {years} years exceeds the {max} year limit")]
    HorizonTooLong { years: u32, max: u32 },
}
