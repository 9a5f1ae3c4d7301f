//! Error types for cavity model construction and state handling.

use cav_core::CavError;
use cav_filter::FilterError;
use thiserror::Error;

/// Errors raised while building a cavity or addressing its state.
///
/// Numerical blow-up during stepping is not an error; callers check the
/// returned voltages themselves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("{what} must be positive, got {value}")]
    NotPositive { what: &'static str, value: f64 },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Mode {index} has {found} mechanical couplings, expected {expected}")]
    MechCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Cavity state was allocated for a different cavity")]
    StateMismatch,

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<CavError> for ModelError {
    fn from(e: CavError) -> Self {
        match e {
            CavError::NonFinite { what, value } => ModelError::NonFinite { what, value },
            CavError::NotPositive { what, value } => ModelError::NotPositive { what, value },
            CavError::InvalidArg { what } => ModelError::InvalidArg { what },
        }
    }
}
