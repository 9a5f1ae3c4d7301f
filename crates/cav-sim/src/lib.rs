//! Time-domain driver for the cavity model.
//!
//! Provides:
//! - Drive waveforms and beam patterns fed to the cavity each step
//! - Detuning producers that write the per-mode frequency perturbation
//! - A fixed-step runner with decimated recording
//! - A parallel ensemble runner sharing one immutable cavity

pub mod detuning;
pub mod error;
pub mod sim;
pub mod stimulus;

// Re-exports for public API
pub use detuning::{Detuning, Microphonics, NoDetuning, StaticDetuning};
pub use error::{SimError, SimResult};
pub use sim::{
    ModeTrace, Scenario, SimOptions, SimRecord, cavity_dt, run_ensemble, run_sim, run_sim_from,
};
pub use stimulus::{BeamPattern, DriveWaveform};
