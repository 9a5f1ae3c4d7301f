//! Producers of the per-mode frequency perturbation.
//!
//! The cavity model only consumes `ElecModeState::delta_omega`; whatever
//! writes it between steps implements [`Detuning`]. The sources here are
//! prescribed perturbations. A Lorentz-force model that closes the loop
//! through the stored energy and the mode's A/C couplings plugs in the same way.

use std::f64::consts::PI;
use std::fmt;

use cav_core::ensure_finite;
use cav_model::{Cavity, CavityState};

use crate::error::{SimError, SimResult};

/// Writes frequency perturbations into a cavity state before each step.
pub trait Detuning: fmt::Debug + Send {
    /// Check the producer against the cavity it will drive.
    fn validate(&self, cavity: &Cavity) -> SimResult<()>;

    /// Update `delta_omega` of every mode for the step starting at `t` (s).
    fn update(&mut self, t: f64, cavity: &Cavity, state: &mut CavityState) -> SimResult<()>;
}

/// Leaves every perturbation untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDetuning;

impl Detuning for NoDetuning {
    fn validate(&self, _cavity: &Cavity) -> SimResult<()> {
        Ok(())
    }

    fn update(&mut self, _t: f64, _cavity: &Cavity, _state: &mut CavityState) -> SimResult<()> {
        Ok(())
    }
}

/// Constant per-mode offset, e.g. a static tuner error.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticDetuning {
    offsets_rad_s: Vec<f64>,
}

impl StaticDetuning {
    /// One offset per mode, in Hz.
    pub fn from_hz(offsets_hz: &[f64]) -> SimResult<Self> {
        for &f in offsets_hz {
            ensure_finite(f, "static detuning")?;
        }
        Ok(Self {
            offsets_rad_s: offsets_hz.iter().map(|f| 2.0 * PI * f).collect(),
        })
    }

    pub fn offsets_rad_s(&self) -> &[f64] {
        &self.offsets_rad_s
    }
}

impl Detuning for StaticDetuning {
    fn validate(&self, cavity: &Cavity) -> SimResult<()> {
        check_len(self.offsets_rad_s.len(), cavity)
    }

    fn update(&mut self, _t: f64, _cavity: &Cavity, state: &mut CavityState) -> SimResult<()> {
        for (s, &d) in state.modes_mut().iter_mut().zip(&self.offsets_rad_s) {
            s.delta_omega = d;
        }
        Ok(())
    }
}

/// Sinusoidal microphonics: `δω_i(t) = 2π·a_i·sin(2π·f·t + φ)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Microphonics {
    amplitudes_rad_s: Vec<f64>,
    freq_hz: f64,
    phase_rad: f64,
}

impl Microphonics {
    /// # Arguments
    ///
    /// * `amplitudes_hz` - peak detuning per mode (Hz)
    /// * `freq_hz` - vibration frequency (Hz), must be non-negative
    /// * `phase_rad` - vibration phase at t = 0
    pub fn new(amplitudes_hz: &[f64], freq_hz: f64, phase_rad: f64) -> SimResult<Self> {
        for &a in amplitudes_hz {
            ensure_finite(a, "microphonics amplitude")?;
        }
        ensure_finite(freq_hz, "microphonics frequency")?;
        ensure_finite(phase_rad, "microphonics phase")?;
        if freq_hz < 0.0 {
            return Err(SimError::InvalidArg {
                what: "microphonics frequency cannot be negative",
            });
        }
        Ok(Self {
            amplitudes_rad_s: amplitudes_hz.iter().map(|a| 2.0 * PI * a).collect(),
            freq_hz,
            phase_rad,
        })
    }

    /// Perturbation of mode `i` at time `t`, `None` past the last mode.
    pub fn delta_omega(&self, i: usize, t: f64) -> Option<f64> {
        self.amplitudes_rad_s.get(i).map(|a| a * self.vibration(t))
    }

    fn vibration(&self, t: f64) -> f64 {
        (2.0 * PI * self.freq_hz * t + self.phase_rad).sin()
    }
}

impl Detuning for Microphonics {
    fn validate(&self, cavity: &Cavity) -> SimResult<()> {
        check_len(self.amplitudes_rad_s.len(), cavity)
    }

    fn update(&mut self, t: f64, _cavity: &Cavity, state: &mut CavityState) -> SimResult<()> {
        let vib = self.vibration(t);
        for (s, &a) in state.modes_mut().iter_mut().zip(&self.amplitudes_rad_s) {
            s.delta_omega = a * vib;
        }
        Ok(())
    }
}

fn check_len(len: usize, cavity: &Cavity) -> SimResult<()> {
    if len != cavity.n_modes() {
        return Err(SimError::InvalidArg {
            what: "detuning needs exactly one entry per cavity mode",
        });
    }
    Ok(())
}
