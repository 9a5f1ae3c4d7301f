//! cav-core: shared foundation for the cavity simulator.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real, Complex, tolerances, phasor helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CavError, CavResult};
pub use numeric::*;
pub use units::*;
