//! Continuous-state digital filters built from complex poles.
//!
//! A [`Filter`] is an immutable description (a bank of first-order sections,
//! one per appended pole). Its runtime memory lives in a separate
//! [`FilterState`] so one description can drive any number of independent runs.
//!
//! Every section is normalized to unity DC gain, so callers place poles and
//! never scale the input themselves.

pub mod error;
pub mod filter;

pub use error::{FilterError, FilterResult};
pub use filter::{Filter, FilterState};
