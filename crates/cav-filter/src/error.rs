//! Error types for filter construction.

use cav_core::CavError;
use thiserror::Error;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while describing a filter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    /// Appending would exceed the number of poles the filter was sized for.
    #[error("Filter capacity exceeded: requested {requested} poles, capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error(transparent)]
    Core(#[from] CavError),
}
