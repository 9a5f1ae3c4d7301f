//! A single resonant electromagnetic mode.
//!
//! The mode is simulated in its rotating baseband frame as a one-pole low-pass
//! filter:
//!
//! ```text
//! θ[n]   = θ[n-1] + (ω_d0 + δω)·dt
//! v_in   = (k_drive·K_fwd + k_beam·q·e^{-i·ω_LO·Δt_z})·e^{-iθ[n]}
//! V[n]   = H_lp(v_in)·e^{+iθ[n]}
//! ```
//!
//! where `H_lp` has its pole at `-ω_f = -ω_0/(2·Q_L)` and unity DC gain.

use std::f64::consts::PI;

use cav_core::constants::PICO;
use cav_core::{Complex, ensure_finite, ensure_finite_c, ensure_positive, phasor};
use cav_filter::{Filter, FilterState};
use tracing::debug;

use crate::error::{ModelError, ModelResult};

/// Physical parameters of one mode.
#[derive(Clone, Debug, PartialEq)]
pub struct ElecModeParams {
    /// Geometric shunt impedance over Q (Ω).
    pub r_over_q: f64,
    /// Resonance offset from the drive frequency (Hz).
    pub foffset_hz: f64,
    /// Drive (LO) angular frequency (rad/s).
    pub lo_w0_rad_s: f64,
    /// Intrinsic quality factor.
    pub q0: f64,
    /// Drive (fundamental power coupler) external Q.
    pub q_drive: f64,
    /// Probe port external Q.
    pub q_probe: f64,
    /// Beam phase relative to the RF (rad).
    pub rf_phase_rad: f64,
    /// Phase between cavity port and reverse ADC (rad).
    pub phase_rev_rad: f64,
    /// Phase between cavity port and probe ADC (rad).
    pub phase_probe_rad: f64,
    /// Simulation time step (s).
    pub dt_s: f64,
    /// Electro-mechanical couplings, one per mechanical mode ((rad/s)/V²).
    /// Either sign convention is accepted.
    pub mech_couplings: Vec<f64>,
}

/// Coefficients relating a mode to one mechanical mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MechCoupling {
    /// `sqrt(|k|/(R/Q)) / ω_0`
    pub a: f64,
    /// `-ω_0·sqrt(|k|·(R/Q))`
    pub c: f64,
}

/// Loaded Q: parallel combination of the intrinsic and port Qs.
pub fn loaded_q(q0: f64, q_drive: f64, q_probe: f64) -> f64 {
    1.0 / (1.0 / q0 + 1.0 / q_drive + 1.0 / q_probe)
}

/// Derived, immutable description of one cavity mode.
#[derive(Clone, Debug)]
pub struct ElecMode {
    loaded_q: f64,
    k_beam: Complex,
    k_drive: f64,
    k_probe: Complex,
    k_em: Complex,
    lo_w0: f64,
    omega_0: f64,
    omega_f: f64,
    omega_d0: f64,
    dt: f64,
    filter: Filter,
    mech: Vec<MechCoupling>,
}

/// Signals produced by one mode in one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModeOutput {
    /// Accelerating voltage seen by the beam (no port coupling).
    pub voltage: Complex,
    /// Voltage at the probe ADC.
    pub probe: Complex,
    /// Voltage emitted towards the reverse ADC.
    pub emitted: Complex,
}

impl ElecMode {
    /// Derive a mode from its physical parameters.
    ///
    /// # Errors
    ///
    /// Rejects non-positive Q factors, `r_over_q` or time step, non-finite
    /// inputs, and a non-positive resonance frequency.
    pub fn new(p: &ElecModeParams) -> ModelResult<Self> {
        let q0 = ensure_positive(p.q0, "q0")?;
        let q_drive = ensure_positive(p.q_drive, "q_drive")?;
        let q_probe = ensure_positive(p.q_probe, "q_probe")?;
        let r_over_q = ensure_positive(p.r_over_q, "r_over_q")?;
        let dt = ensure_positive(p.dt_s, "time step")?;
        let foffset = ensure_finite(p.foffset_hz, "foffset_hz")?;
        let lo_w0 = ensure_finite(p.lo_w0_rad_s, "lo_w0_rad_s")?;
        let rf_phase = ensure_finite(p.rf_phase_rad, "rf_phase_rad")?;
        let phase_rev = ensure_finite(p.phase_rev_rad, "phase_rev_rad")?;
        let phase_probe = ensure_finite(p.phase_probe_rad, "phase_probe_rad")?;
        for &k in &p.mech_couplings {
            ensure_finite(k, "mechanical coupling")?;
        }

        let omega_0 = lo_w0 + 2.0 * PI * foffset;
        if omega_0 <= 0.0 {
            return Err(ModelError::InvalidArg {
                what: "mode resonance frequency must be positive",
            });
        }

        let q_l = loaded_q(q0, q_drive, q_probe);
        let omega_f = ensure_finite(omega_0 / (2.0 * q_l), "mode bandwidth")?;

        let mut filter = Filter::with_capacity(1);
        filter.append_poles(&[Complex::new(-omega_f, 0.0)], dt)?;

        // Couplings are physically negative but often quoted as positive
        let mech = p
            .mech_couplings
            .iter()
            .map(|&k| {
                let a = (k.abs() / r_over_q).sqrt() / omega_0;
                let c = -omega_0 * (k.abs() * r_over_q).sqrt();
                Ok(MechCoupling {
                    a: ensure_finite(a, "mechanical coupling A")?,
                    c: ensure_finite(c, "mechanical coupling C")?,
                })
            })
            .collect::<ModelResult<Vec<_>>>()?;

        // Accepted inputs can still overflow the derived coefficients
        let k_beam = ensure_finite_c(r_over_q * q_l * phasor(-rf_phase) / dt * PICO, "k_beam")?;
        let k_drive = ensure_finite(2.0 * (q_drive * r_over_q).sqrt(), "k_drive")?;
        let k_probe = ensure_finite_c(phasor(phase_probe) / (q_probe * r_over_q).sqrt(), "k_probe")?;
        let k_em = ensure_finite_c(phasor(phase_rev) / (q_drive * r_over_q).sqrt(), "k_em")?;

        let mode = Self {
            loaded_q: q_l,
            k_beam,
            k_drive,
            k_probe,
            k_em,
            lo_w0,
            omega_0,
            omega_f,
            omega_d0: 2.0 * PI * foffset,
            dt,
            filter,
            mech,
        };
        debug!(
            loaded_q = mode.loaded_q,
            bandwidth_rad_s = mode.omega_f,
            n_mech = mode.mech.len(),
            "electrical mode derived"
        );
        Ok(mode)
    }

    /// Allocate a zeroed runtime state for this mode.
    pub fn new_state(&self) -> ElecModeState {
        ElecModeState {
            delta_omega: 0.0,
            phase: 0.0,
            v2: 0.0,
            filter_state: self.filter.new_state(),
        }
    }

    /// Advance the mode one time step.
    ///
    /// * `drive` - forward drive sample reaching the coupler
    /// * `beam_charge` - bunch charge this step (pC)
    /// * `delta_tz` - beam arrival deviation from nominal (s)
    ///
    /// Updates phase, stored energy and filter memory in `state`. No clamping
    /// is applied; a runaway drive yields runaway voltages.
    #[inline]
    pub fn step(
        &self,
        drive: Complex,
        beam_charge: f64,
        delta_tz: f64,
        state: &mut ElecModeState,
    ) -> ModeOutput {
        let v_beam = beam_charge * self.k_beam * phasor(-self.lo_w0 * delta_tz);
        let v_drive = drive * self.k_drive;

        let omega_now = self.omega_d0 + state.delta_omega;
        state.phase += omega_now * self.dt;

        // No ω_f factor here: the filter normalizes to unity DC gain
        let v_in = (v_drive + v_beam) * phasor(-state.phase);
        let v_out = self.filter.step(v_in, &mut state.filter_state) * phasor(state.phase);

        state.v2 = v_out.norm_sqr();

        ModeOutput {
            voltage: v_out,
            probe: v_out * self.k_probe,
            emitted: v_out * self.k_em,
        }
    }

    pub(crate) fn clear_filter(&self, state: &mut ElecModeState) {
        self.filter.clear_state(&mut state.filter_state);
    }

    pub fn loaded_q(&self) -> f64 {
        self.loaded_q
    }

    /// Charge-to-voltage factor, including the beam phase.
    pub fn k_beam(&self) -> Complex {
        self.k_beam
    }

    pub fn k_drive(&self) -> f64 {
        self.k_drive
    }

    pub fn k_probe(&self) -> Complex {
        self.k_probe
    }

    pub fn k_em(&self) -> Complex {
        self.k_em
    }

    pub fn lo_w0(&self) -> f64 {
        self.lo_w0
    }

    /// Resonance angular frequency (rad/s).
    pub fn omega_0(&self) -> f64 {
        self.omega_0
    }

    /// Open-loop half bandwidth (rad/s).
    pub fn bandwidth(&self) -> f64 {
        self.omega_f
    }

    /// Baseline offset from the drive frequency (rad/s).
    pub fn omega_d0(&self) -> f64 {
        self.omega_d0
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn mech_couplings(&self) -> &[MechCoupling] {
        &self.mech
    }
}

/// Runtime state of one mode in one simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct ElecModeState {
    /// Frequency perturbation (rad/s), written by the detuning model between steps.
    pub delta_omega: f64,
    phase: f64,
    v2: f64,
    filter_state: FilterState,
}

impl ElecModeState {
    /// Accumulated rotating-frame phase (rad), never wrapped.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Stored-energy proxy `|V|²` from the last step (V²).
    pub fn stored_energy(&self) -> f64 {
        self.v2
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter_state
    }
}
