//! Conversion of validated project definitions into runtime objects.

use cav_core::{Complex, m, v_per_m, volts};
use cav_model::{Cavity, CavityParams, ElecMode, ElecModeParams, LossyWaveguide};
use cav_sim::{
    BeamPattern, DriveWaveform, Microphonics, NoDetuning, Scenario, SimOptions, StaticDetuning,
};

use crate::ProjectResult;
use crate::schema::{BeamDef, CavityDef, DetuningDef, DriveDef, ModeDef, RunDef, WaveguideDef};

/// Physical parameters of one mode definition.
pub fn mode_params(cavity: &CavityDef, mode: &ModeDef) -> ElecModeParams {
    ElecModeParams {
        r_over_q: mode.r_over_q,
        foffset_hz: mode.foffset_hz,
        lo_w0_rad_s: cavity.lo_w0_rad_s,
        q0: mode.q0,
        q_drive: mode.q_drive,
        q_probe: mode.q_probe,
        rf_phase_rad: mode.rf_phase_rad,
        phase_rev_rad: mode.phase_rev_rad,
        phase_probe_rad: mode.phase_probe_rad,
        dt_s: cavity.dt_s,
        mech_couplings: mode.mech_couplings.clone(),
    }
}

pub fn build_cavity(def: &CavityDef) -> ProjectResult<Cavity> {
    let modes = def
        .modes
        .iter()
        .map(|mode| ElecMode::new(&mode_params(def, mode)))
        .collect::<Result<Vec<_>, _>>()?;

    let cavity = Cavity::new(
        modes,
        CavityParams {
            length: m(def.length_m),
            nominal_gradient: v_per_m(def.nominal_gradient_v_per_m),
            rf_phase_rad: def.rf_phase_rad,
            design_voltage: def.design_voltage_v.map(volts),
            fundamental_index: def.fundamental_index,
        },
    )?;

    Ok(match def.waveguide {
        WaveguideDef::Ideal => cavity,
        WaveguideDef::Lossy {
            attenuation_db,
            delay_s,
        } => cavity.with_transmission(LossyWaveguide::new(
            attenuation_db,
            delay_s,
            def.lo_w0_rad_s,
        )?),
    })
}

pub fn sim_options(run: &RunDef) -> SimOptions {
    SimOptions {
        n_steps: run.n_steps,
        record_every: run.record_every,
        stop_on_non_finite: run.stop_on_non_finite,
    }
}

pub fn build_scenario(run: &RunDef) -> ProjectResult<Scenario> {
    let drive = match run.drive {
        DriveDef::Off => DriveWaveform::Off,
        DriveDef::Constant { re, im } => DriveWaveform::Constant(Complex::new(re, im)),
        DriveDef::Pulse { re, im, start, len } => DriveWaveform::Pulse {
            amplitude: Complex::new(re, im),
            start,
            len,
        },
    };
    let beam = match run.beam {
        BeamDef::None => BeamPattern::None,
        BeamDef::Single { step, charge_pc } => BeamPattern::Single { step, charge_pc },
        BeamDef::Train {
            start,
            period,
            charge_pc,
        } => BeamPattern::Train {
            start,
            period,
            charge_pc,
        },
    };

    let scenario = Scenario::new(drive, beam)
        .with_timing_jitter(run.timing_jitter_s)
        .with_clear_at(run.clear_at.clone());

    Ok(match &run.detuning {
        DetuningDef::None => scenario.with_detuning(NoDetuning),
        DetuningDef::Static { offsets_hz } => {
            scenario.with_detuning(StaticDetuning::from_hz(offsets_hz)?)
        }
        DetuningDef::Microphonics {
            amplitudes_hz,
            freq_hz,
            phase_rad,
        } => scenario.with_detuning(Microphonics::new(amplitudes_hz, *freq_hz, *phase_rad)?),
    })
}
