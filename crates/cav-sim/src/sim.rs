//! Simulation runner and result recording.

use cav_core::{Complex, is_finite_c};
use cav_model::{Cavity, CavityState};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::detuning::{Detuning, NoDetuning};
use crate::error::{SimError, SimResult};
use crate::stimulus::{BeamPattern, DriveWaveform};

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Number of steps to advance
    pub n_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Abort with [`SimError::NonFinite`] instead of recording NaN/Inf voltages
    pub stop_on_non_finite: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            n_steps: 1000,
            record_every: 1,
            stop_on_non_finite: false,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if self.n_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "n_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        Ok(())
    }
}

/// Inputs of one simulated run.
#[derive(Debug)]
pub struct Scenario {
    pub drive: DriveWaveform,
    pub beam: BeamPattern,
    /// Fixed beam timing deviation (s)
    pub timing_jitter_s: f64,
    pub detuning: Box<dyn Detuning>,
    /// Steps before which the cavity signals are cleared (pulse boundaries)
    pub clear_at: Vec<usize>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            drive: DriveWaveform::Off,
            beam: BeamPattern::None,
            timing_jitter_s: 0.0,
            detuning: Box::new(NoDetuning),
            clear_at: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn new(drive: DriveWaveform, beam: BeamPattern) -> Self {
        Self {
            drive,
            beam,
            ..Self::default()
        }
    }

    pub fn with_detuning<D: Detuning + 'static>(mut self, detuning: D) -> Self {
        self.detuning = Box::new(detuning);
        self
    }

    pub fn with_timing_jitter(mut self, delta_tz_s: f64) -> Self {
        self.timing_jitter_s = delta_tz_s;
        self
    }

    pub fn with_clear_at(mut self, steps: Vec<usize>) -> Self {
        self.clear_at = steps;
        self
    }

    fn validate(&self, cavity: &Cavity) -> SimResult<()> {
        self.drive.validate()?;
        self.beam.validate()?;
        cav_core::ensure_finite(self.timing_jitter_s, "timing jitter")?;
        self.detuning.validate(cavity)
    }
}

/// Recorded samples of one mode.
#[derive(Clone, Debug, Default)]
pub struct ModeTrace {
    pub stored_energy: Vec<f64>,
    pub phase: Vec<f64>,
    pub delta_omega: Vec<f64>,
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time at the end of each recorded step (seconds)
    pub t: Vec<f64>,
    pub drive: Vec<Complex>,
    pub voltage: Vec<Complex>,
    pub probe: Vec<Complex>,
    pub reflected: Vec<Complex>,
    pub modes: Vec<ModeTrace>,
    /// First step that produced a non-finite voltage, if any
    pub first_non_finite: Option<usize>,
}

impl SimRecord {
    fn with_capacity(n_records: usize, n_modes: usize) -> Self {
        Self {
            t: Vec::with_capacity(n_records),
            drive: Vec::with_capacity(n_records),
            voltage: Vec::with_capacity(n_records),
            probe: Vec::with_capacity(n_records),
            reflected: Vec::with_capacity(n_records),
            modes: (0..n_modes)
                .map(|_| ModeTrace {
                    stored_energy: Vec::with_capacity(n_records),
                    phase: Vec::with_capacity(n_records),
                    delta_omega: Vec::with_capacity(n_records),
                })
                .collect(),
            first_non_finite: None,
        }
    }

    fn push(&mut self, t: f64, state: &CavityState) {
        self.t.push(t);
        self.drive.push(state.drive());
        self.voltage.push(state.voltage());
        self.probe.push(state.probe());
        self.reflected.push(state.reflected());
        for (trace, s) in self.modes.iter_mut().zip(state.modes()) {
            trace.stored_energy.push(s.stored_energy());
            trace.phase.push(s.phase());
            trace.delta_omega.push(s.delta_omega);
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Common time step of the cavity's modes.
pub fn cavity_dt(cavity: &Cavity) -> SimResult<f64> {
    let dt = cavity.mode(0)?.dt();
    if cavity.modes().iter().any(|m| m.dt() != dt) {
        return Err(SimError::InvalidArg {
            what: "all cavity modes must share one time step",
        });
    }
    Ok(dt)
}

/// Run one scenario on a fresh state.
pub fn run_sim(cavity: &Cavity, scenario: &mut Scenario, opts: &SimOptions) -> SimResult<SimRecord> {
    let mut state = cavity.new_state();
    run_sim_from(cavity, &mut state, scenario, opts, 0)
}

/// Run one scenario continuing from an existing state.
///
/// `start_step` is the absolute index of the first step. Stimuli, `clear_at`,
/// detuning time and recorded times all use absolute steps, so a run split
/// into chunks records the same trace as one uninterrupted run.
pub fn run_sim_from(
    cavity: &Cavity,
    state: &mut CavityState,
    scenario: &mut Scenario,
    opts: &SimOptions,
    start_step: usize,
) -> SimResult<SimRecord> {
    opts.validate()?;
    scenario.validate(cavity)?;
    let dt = cavity_dt(cavity)?;

    info!(
        n_steps = opts.n_steps,
        start_step,
        n_modes = cavity.n_modes(),
        dt,
        "starting cavity simulation"
    );

    let n_records = opts.n_steps.div_ceil(opts.record_every);
    let mut record = SimRecord::with_capacity(n_records, cavity.n_modes());

    let end = start_step + opts.n_steps;
    for n in start_step..end {
        if scenario.clear_at.contains(&n) {
            cavity.clear(state)?;
        }

        let t = n as f64 * dt;
        scenario.detuning.update(t, cavity, state)?;

        let v = cavity.step(
            scenario.timing_jitter_s,
            scenario.drive.sample(n),
            scenario.beam.sample(n),
            state,
        )?;

        if record.first_non_finite.is_none() && !is_finite_c(v) {
            if opts.stop_on_non_finite {
                return Err(SimError::NonFinite { step: n });
            }
            warn!(step = n, "cavity voltage is no longer finite");
            record.first_non_finite = Some(n);
        }

        let done = n + 1;
        if (done - start_step) % opts.record_every == 0 || done == end {
            record.push(done as f64 * dt, state);
        }
    }

    info!(records = record.len(), "cavity simulation finished");
    Ok(record)
}

/// Run independent scenarios in parallel against one shared cavity.
///
/// Each scenario gets its own state; results are in scenario order.
pub fn run_ensemble(
    cavity: &Cavity,
    scenarios: &mut [Scenario],
    opts: &SimOptions,
) -> Vec<SimResult<SimRecord>> {
    scenarios
        .par_iter_mut()
        .map(|scenario| run_sim(cavity, scenario, opts))
        .collect()
}
