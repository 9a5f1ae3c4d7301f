//! Error types for simulation runs.

use cav_core::CavError;
use cav_model::ModelError;
use thiserror::Error;

/// Errors encountered while setting up or running a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Only raised when the run asks to stop on the first bad sample.
    #[error("Non-finite cavity voltage at step {step}")]
    NonFinite { step: usize },

    #[error("Cavity model error: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Core(#[from] CavError),
}

pub type SimResult<T> = Result<T, SimError>;
