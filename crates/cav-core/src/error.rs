//! Parameter errors shared by the cavity crates.

use thiserror::Error;

pub type CavResult<T> = Result<T, CavError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CavError {
    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    /// Physical quantities such as Q factors, R/Q and time steps.
    #[error("{what} must be positive, got {value}")]
    NotPositive { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
