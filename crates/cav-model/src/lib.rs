//! Electromagnetic model of a multi-mode RF cavity.
//!
//! Each resonant mode is an [`ElecMode`]: a one-pole low-pass filter in the
//! mode's rotating baseband frame, driven by the forward RF and by beam charge.
//! A [`Cavity`] owns an ordered set of modes and sums their accelerating, probe
//! and emitted voltages every step.
//!
//! # Runtime state
//!
//! Descriptions are immutable after construction. Everything that changes
//! while simulating lives in [`CavityState`] / [`ElecModeState`], so a single
//! `Cavity` can back many independent runs:
//!
//! ```
//! use cav_core::{Complex, m, v_per_m};
//! use cav_model::{Cavity, CavityParams, ElecMode, ElecModeParams};
//!
//! let mode = ElecMode::new(&ElecModeParams {
//!     r_over_q: 1036.0,
//!     foffset_hz: 0.0,
//!     lo_w0_rad_s: 2.0 * std::f64::consts::PI * 1.3e9,
//!     q0: 1e10,
//!     q_drive: 4e7,
//!     q_probe: 2e9,
//!     rf_phase_rad: 0.0,
//!     phase_rev_rad: 0.0,
//!     phase_probe_rad: 0.0,
//!     dt_s: 1e-6,
//!     mech_couplings: vec![],
//! })
//! .unwrap();
//! let cavity = Cavity::new(
//!     vec![mode],
//!     CavityParams {
//!         length: m(1.038),
//!         nominal_gradient: v_per_m(16e6),
//!         rf_phase_rad: 0.0,
//!         design_voltage: None,
//!         fundamental_index: Some(0),
//!     },
//! )
//! .unwrap();
//!
//! let mut run_a = cavity.new_state();
//! let mut run_b = cavity.new_state();
//! cavity.step(0.0, Complex::new(1.0, 0.0), 0.0, &mut run_a).unwrap();
//! assert!(run_a.voltage().norm() > 0.0);
//! assert_eq!(run_b.voltage().norm(), 0.0);
//! # cavity.clear(&mut run_b).unwrap();
//! ```
//!
//! Frequency perturbations (microphonics, Lorentz-force detuning) are produced
//! outside this crate by writing [`ElecModeState::delta_omega`] between steps.

pub mod cavity;
pub mod elec_mode;
pub mod error;
pub mod waveguide;

pub use cavity::{Cavity, CavityParams, CavityState};
pub use elec_mode::{ElecMode, ElecModeParams, ElecModeState, MechCoupling, ModeOutput, loaded_q};
pub use error::{ModelError, ModelResult};
pub use waveguide::{IdealWaveguide, LossyWaveguide, TransmissionPath};
