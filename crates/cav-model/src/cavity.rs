//! Multi-mode cavity and its per-run state.

use std::sync::atomic::{AtomicU64, Ordering};

use cav_core::{Complex, Field, Length, Voltage, ZERO, ensure_finite, ensure_positive};
use tracing::debug;

use crate::elec_mode::{ElecMode, ElecModeState};
use crate::error::{ModelError, ModelResult};
use crate::waveguide::{IdealWaveguide, TransmissionPath};

static NEXT_CAVITY_ID: AtomicU64 = AtomicU64::new(1);

/// Cavity-level parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CavityParams {
    /// Active length.
    pub length: Length,
    /// Nominal accelerating gradient.
    pub nominal_gradient: Field,
    /// Nominal RF phase (rad).
    pub rf_phase_rad: f64,
    /// Reserved for RF-station bookkeeping; not read by the step.
    pub design_voltage: Option<Voltage>,
    /// Reserved index of the fundamental (accelerating) mode; not read by the step.
    pub fundamental_index: Option<usize>,
}

/// Immutable description of a cavity: an ordered set of electrical modes
/// plus the drive transmission path.
///
/// A `Cavity` is `Sync`; any number of [`CavityState`]s may be advanced
/// against one shared instance.
#[derive(Debug)]
pub struct Cavity {
    id: u64,
    modes: Vec<ElecMode>,
    n_mech: usize,
    params: CavityParams,
    path: Box<dyn TransmissionPath>,
}

impl Cavity {
    /// Build a cavity with an ideal waveguide.
    ///
    /// # Errors
    ///
    /// Fails on an empty mode list, non-physical cavity parameters, a
    /// fundamental index outside the mode list, or modes that disagree on the
    /// number of mechanical couplings.
    pub fn new(modes: Vec<ElecMode>, params: CavityParams) -> ModelResult<Self> {
        use uom::si::electric_field::volt_per_meter;
        use uom::si::electric_potential::volt;
        use uom::si::length::meter;

        if modes.is_empty() {
            return Err(ModelError::InvalidArg {
                what: "cavity needs at least one mode",
            });
        }
        ensure_positive(params.length.get::<meter>(), "cavity length")?;
        ensure_finite(params.nominal_gradient.get::<volt_per_meter>(), "nominal gradient")?;
        ensure_finite(params.rf_phase_rad, "cavity rf phase")?;
        if let Some(v) = params.design_voltage {
            ensure_finite(v.get::<volt>(), "design voltage")?;
        }
        if let Some(index) = params.fundamental_index {
            if index >= modes.len() {
                return Err(ModelError::IndexOob {
                    what: "fundamental mode",
                    index,
                    len: modes.len(),
                });
            }
        }

        let n_mech = modes[0].mech_couplings().len();
        if let Some((index, m)) = modes
            .iter()
            .enumerate()
            .find(|(_, m)| m.mech_couplings().len() != n_mech)
        {
            return Err(ModelError::MechCountMismatch {
                index,
                expected: n_mech,
                found: m.mech_couplings().len(),
            });
        }

        let id = NEXT_CAVITY_ID.fetch_add(1, Ordering::Relaxed);
        debug!(id, n_modes = modes.len(), n_mech, "cavity built");
        Ok(Self {
            id,
            modes,
            n_mech,
            params,
            path: Box::new(IdealWaveguide),
        })
    }

    /// Replace the drive transmission path.
    pub fn with_transmission<P: TransmissionPath + 'static>(mut self, path: P) -> Self {
        self.path = Box::new(path);
        self
    }

    /// Allocate a zeroed runtime state bound to this cavity.
    pub fn new_state(&self) -> CavityState {
        debug!(id = self.id, "cavity state allocated");
        CavityState {
            cavity_id: self.id,
            probe: ZERO,
            reflected: ZERO,
            drive: ZERO,
            voltage: ZERO,
            modes: self.modes.iter().map(ElecMode::new_state).collect(),
        }
    }

    /// Advance every mode one step and aggregate the cavity signals.
    ///
    /// * `delta_tz` - beam timing deviation (s), shared by all modes
    /// * `drive` - forward drive sample at the directional coupler
    /// * `beam_charge` - bunch charge this step (pC)
    ///
    /// Returns the total accelerating voltage seen by the beam. Does not
    /// allocate.
    ///
    /// # Errors
    ///
    /// [`ModelError::StateMismatch`] if `state` was allocated by another cavity.
    pub fn step(
        &self,
        delta_tz: f64,
        drive: Complex,
        beam_charge: f64,
        state: &mut CavityState,
    ) -> ModelResult<Complex> {
        self.check_state(state)?;

        let drive_fwd = self.path.forward(drive);

        let mut voltage = ZERO;
        let mut probe = ZERO;
        let mut emitted = ZERO;
        for (mode, mode_state) in self.modes.iter().zip(state.modes.iter_mut()) {
            let out = mode.step(drive_fwd, beam_charge, delta_tz, mode_state);
            voltage += out.voltage;
            probe += out.probe;
            emitted += out.emitted;
        }

        state.drive = drive;
        state.probe = probe;
        state.reflected = emitted - self.path.reverse(drive);
        state.voltage = voltage;

        Ok(voltage)
    }

    /// Zero the aggregate signals and every mode's filter memory.
    ///
    /// Phase accumulators, frequency perturbations and the last drive sample
    /// are kept: this resets signals between pulses, it does not re-initialize
    /// the mode dynamics.
    pub fn clear(&self, state: &mut CavityState) -> ModelResult<()> {
        self.check_state(state)?;

        state.probe = ZERO;
        state.reflected = ZERO;
        state.voltage = ZERO;
        for (mode, mode_state) in self.modes.iter().zip(state.modes.iter_mut()) {
            mode.clear_filter(mode_state);
        }
        Ok(())
    }

    fn check_state(&self, state: &CavityState) -> ModelResult<()> {
        if state.cavity_id != self.id {
            return Err(ModelError::StateMismatch);
        }
        debug_assert_eq!(state.modes.len(), self.modes.len());
        Ok(())
    }

    pub fn modes(&self) -> &[ElecMode] {
        &self.modes
    }

    /// Bounds-checked mode lookup.
    pub fn mode(&self, index: usize) -> ModelResult<&ElecMode> {
        self.modes.get(index).ok_or(ModelError::IndexOob {
            what: "cavity mode",
            index,
            len: self.modes.len(),
        })
    }

    pub fn n_modes(&self) -> usize {
        self.modes.len()
    }

    /// Number of mechanical modes every electrical mode couples to.
    pub fn n_mech(&self) -> usize {
        self.n_mech
    }

    pub fn params(&self) -> &CavityParams {
        &self.params
    }

    pub fn length(&self) -> Length {
        self.params.length
    }

    pub fn nominal_gradient(&self) -> Field {
        self.params.nominal_gradient
    }

    /// Length times nominal gradient.
    pub fn nominal_voltage(&self) -> Voltage {
        self.params.length * self.params.nominal_gradient
    }

    pub fn rf_phase_rad(&self) -> f64 {
        self.params.rf_phase_rad
    }

    pub fn design_voltage(&self) -> Option<Voltage> {
        self.params.design_voltage
    }

    pub fn fundamental_index(&self) -> Option<usize> {
        self.params.fundamental_index
    }

    pub fn fundamental(&self) -> Option<&ElecMode> {
        self.params.fundamental_index.and_then(|i| self.modes.get(i))
    }

    pub fn transmission(&self) -> &dyn TransmissionPath {
        self.path.as_ref()
    }
}

/// Runtime state of one simulated cavity.
///
/// Mode states are index-aligned with [`Cavity::modes`]; the collection is
/// sized at allocation and never resized.
#[derive(Clone, Debug, PartialEq)]
pub struct CavityState {
    cavity_id: u64,
    probe: Complex,
    reflected: Complex,
    drive: Complex,
    voltage: Complex,
    modes: Vec<ElecModeState>,
}

impl CavityState {
    /// Sum of the mode probe voltages.
    pub fn probe(&self) -> Complex {
        self.probe
    }

    /// Sum of the emitted voltages minus the reverse-propagated drive.
    pub fn reflected(&self) -> Complex {
        self.reflected
    }

    /// Last drive sample applied.
    pub fn drive(&self) -> Complex {
        self.drive
    }

    /// Total accelerating voltage from the last step.
    pub fn voltage(&self) -> Complex {
        self.voltage
    }

    pub fn modes(&self) -> &[ElecModeState] {
        &self.modes
    }

    /// Mutable access to every mode state, e.g. for a detuning model.
    pub fn modes_mut(&mut self) -> &mut [ElecModeState] {
        &mut self.modes
    }

    pub fn n_modes(&self) -> usize {
        self.modes.len()
    }

    pub fn mode_state(&self, index: usize) -> ModelResult<&ElecModeState> {
        let len = self.modes.len();
        self.modes.get(index).ok_or(ModelError::IndexOob {
            what: "mode state",
            index,
            len,
        })
    }

    pub fn mode_state_mut(&mut self, index: usize) -> ModelResult<&mut ElecModeState> {
        let len = self.modes.len();
        self.modes.get_mut(index).ok_or(ModelError::IndexOob {
            what: "mode state",
            index,
            len,
        })
    }
}
