//! End-to-end runs of the cavity simulator.

use std::f64::consts::PI;

use cav_core::constants::LO_W0_1300MHZ;
use cav_core::{Complex, Tolerances, ZERO, m, nearly_equal, nearly_equal_c, v_per_m};
use cav_model::{Cavity, CavityParams, ElecMode, ElecModeParams};
use cav_sim::{
    BeamPattern, DriveWaveform, Microphonics, NoDetuning, Scenario, SimError, SimOptions,
    StaticDetuning, run_ensemble, run_sim, run_sim_from,
};

fn mode(foffset_hz: f64, dt_s: f64) -> ElecMode {
    ElecMode::new(&ElecModeParams {
        r_over_q: 1036.0,
        foffset_hz,
        lo_w0_rad_s: LO_W0_1300MHZ,
        q0: 1e10,
        q_drive: 4e7,
        q_probe: 2e9,
        rf_phase_rad: 0.0,
        phase_rev_rad: 0.0,
        phase_probe_rad: 0.0,
        dt_s,
        mech_couplings: vec![-1.0],
    })
    .unwrap()
}

fn cavity(modes: Vec<ElecMode>) -> Cavity {
    Cavity::new(
        modes,
        CavityParams {
            length: m(1.038),
            nominal_gradient: v_per_m(16e6),
            rf_phase_rad: 0.0,
            design_voltage: None,
            fundamental_index: Some(0),
        },
    )
    .unwrap()
}

#[test]
fn record_decimation_and_final_sample() {
    let cav = cavity(vec![mode(0.0, 1e-6)]);
    let mut scenario = Scenario::new(DriveWaveform::Constant(Complex::new(1.0, 0.0)), BeamPattern::None);
    let opts = SimOptions {
        n_steps: 25,
        record_every: 10,
        stop_on_non_finite: false,
    };
    let record = run_sim(&cav, &mut scenario, &opts).unwrap();

    assert_eq!(record.len(), 3);
    let tol = Tolerances::default();
    assert!(nearly_equal(record.t[0], 10e-6, tol));
    assert!(nearly_equal(record.t[2], 25e-6, tol));
    assert_eq!(record.modes.len(), 1);
    assert_eq!(record.modes[0].stored_energy.len(), 3);
    assert!(record.first_non_finite.is_none());
}

#[test]
fn pulse_fills_then_decays() {
    let cav = cavity(vec![mode(0.0, 1e-5)]);
    let mut scenario = Scenario::new(
        DriveWaveform::Pulse {
            amplitude: Complex::new(1.0, 0.0),
            start: 0,
            len: 500,
        },
        BeamPattern::None,
    );
    let opts = SimOptions {
        n_steps: 1000,
        ..SimOptions::default()
    };
    let record = run_sim(&cav, &mut scenario, &opts).unwrap();

    let peak = record.voltage[499].norm();
    assert!(record.voltage[..500].windows(2).all(|w| w[1].norm() > w[0].norm()));
    assert!(record.voltage[500..].windows(2).all(|w| w[1].norm() < w[0].norm()));
    assert!(record.voltage[999].norm() < peak);
    assert_eq!(record.drive[600], ZERO);
}

#[test]
fn clear_at_pulse_boundary_restarts_fill() {
    let cav = cavity(vec![mode(0.0, 1e-6)]);
    let drive = DriveWaveform::Constant(Complex::new(1.0, 0.0));
    let opts = SimOptions {
        n_steps: 200,
        ..SimOptions::default()
    };

    let mut plain = Scenario::new(drive, BeamPattern::None);
    let mut cleared = Scenario::new(drive, BeamPattern::None).with_clear_at(vec![100]);
    let a = run_sim(&cav, &mut plain, &opts).unwrap();
    let b = run_sim(&cav, &mut cleared, &opts).unwrap();

    let tol = Tolerances::default();
    assert!(nearly_equal_c(b.voltage[100], a.voltage[0], tol));
    assert!(nearly_equal_c(b.voltage[199], a.voltage[99], tol));
    // Phase keeps integrating across the clear
    assert_eq!(a.modes[0].phase, b.modes[0].phase);
}

#[test]
fn half_bandwidth_detuning_drops_amplitude_by_sqrt2() {
    let dt = 1e-5;
    let cav = cavity(vec![mode(0.0, dt)]);
    let m0 = cav.mode(0).unwrap();
    let k_drive = m0.k_drive();
    let detune_hz = m0.bandwidth() / (2.0 * PI);

    let mut scenario = Scenario::new(DriveWaveform::Constant(Complex::new(1.0, 0.0)), BeamPattern::None)
        .with_detuning(StaticDetuning::from_hz(&[detune_hz]).unwrap());
    let opts = SimOptions {
        n_steps: 20_000,
        record_every: 100,
        stop_on_non_finite: true,
    };
    let record = run_sim(&cav, &mut scenario, &opts).unwrap();

    let settled = record.voltage.last().unwrap().norm();
    let expected = k_drive / 2f64.sqrt();
    assert!((settled - expected).abs() / expected < 1e-2, "{settled} vs {expected}");
    let last_dw = *record.modes[0].delta_omega.last().unwrap();
    assert!(nearly_equal(last_dw, m0.bandwidth(), Tolerances::default()));
}

#[test]
fn microphonics_modulate_phase() {
    let cav = cavity(vec![mode(0.0, 1e-6)]);
    let mut scenario = Scenario::new(DriveWaveform::Off, BeamPattern::None)
        .with_detuning(Microphonics::new(&[10.0], 100.0, 0.0).unwrap());
    let opts = SimOptions {
        n_steps: 10_000,
        ..SimOptions::default()
    };
    let record = run_sim(&cav, &mut scenario, &opts).unwrap();

    // One full vibration period: the phase excursion integrates back to ~0
    let phase_end = *record.modes[0].phase.last().unwrap();
    let phase_mid = record.modes[0].phase[4999];
    assert!(phase_mid > 0.0);
    assert!(phase_end.abs() < 1e-3 * phase_mid);
}

#[test]
fn bunch_train_accumulates_beam_loading() {
    let cav = cavity(vec![mode(0.0, 1e-6)]);
    let mut scenario = Scenario::new(
        DriveWaveform::Off,
        BeamPattern::Train {
            start: 0,
            period: 10,
            charge_pc: 1.0,
        },
    );
    let opts = SimOptions {
        n_steps: 100,
        ..SimOptions::default()
    };
    let record = run_sim(&cav, &mut scenario, &opts).unwrap();
    let k = cav.mode(0).unwrap().k_beam();
    // Induced voltage points along the beam coupling phase and keeps growing
    assert!(nearly_equal(record.voltage[99].arg(), k.arg(), Tolerances::default()));
    assert!(record.voltage[90].norm() > record.voltage[80].norm());
}

#[test]
fn non_finite_detected_post_hoc() {
    let cav = cavity(vec![mode(0.0, 1e-6)]);
    let drive = DriveWaveform::Constant(Complex::new(1e305, 0.0));

    let mut scenario = Scenario::new(drive, BeamPattern::None);
    let strict = SimOptions {
        n_steps: 10,
        record_every: 1,
        stop_on_non_finite: true,
    };
    assert_eq!(
        run_sim(&cav, &mut scenario, &strict).unwrap_err(),
        SimError::NonFinite { step: 0 }
    );

    let lenient = SimOptions {
        stop_on_non_finite: false,
        ..strict
    };
    let record = run_sim(&cav, &mut scenario, &lenient).unwrap();
    assert_eq!(record.first_non_finite, Some(0));
    assert_eq!(record.len(), 10);
}

#[test]
fn mismatched_time_steps_rejected() {
    let cav = cavity(vec![mode(0.0, 1e-6), mode(1e3, 2e-6)]);
    let mut scenario = Scenario::default();
    let err = run_sim(&cav, &mut scenario, &SimOptions::default()).unwrap_err();
    assert!(matches!(err, SimError::InvalidArg { .. }));
}

#[test]
fn detuning_length_checked_against_cavity() {
    let cav = cavity(vec![mode(0.0, 1e-6)]);
    let mut scenario =
        Scenario::default().with_detuning(StaticDetuning::from_hz(&[1.0, 2.0]).unwrap());
    assert!(run_sim(&cav, &mut scenario, &SimOptions::default()).is_err());
}

#[test]
fn ensemble_matches_sequential_runs() {
    let cav = cavity(vec![mode(0.0, 1e-6), mode(-8e5, 1e-6)]);
    let make = || -> Vec<Scenario> {
        (0..4)
            .map(|i| {
                Scenario::new(
                    DriveWaveform::Constant(Complex::from_polar(1.0, 0.5 * i as f64)),
                    BeamPattern::Single {
                        step: 10 * i,
                        charge_pc: 1.0,
                    },
                )
                .with_timing_jitter(1e-12 * i as f64)
                .with_detuning(NoDetuning)
            })
            .collect()
    };
    let opts = SimOptions {
        n_steps: 300,
        record_every: 3,
        stop_on_non_finite: true,
    };

    let mut parallel = make();
    let results = run_ensemble(&cav, &mut parallel, &opts);
    let mut sequential = make();
    for (scenario, par) in sequential.iter_mut().zip(results) {
        let seq = run_sim(&cav, scenario, &opts).unwrap();
        let par = par.unwrap();
        assert_eq!(seq.voltage, par.voltage);
        assert_eq!(seq.reflected, par.reflected);
    }
}

#[test]
fn chunked_run_matches_uninterrupted_run() {
    let cav = cavity(vec![mode(0.0, 1e-6)]);
    let make = || {
        Scenario::new(
            DriveWaveform::Pulse {
                amplitude: Complex::new(1.0, 0.0),
                start: 20,
                len: 120,
            },
            BeamPattern::Single {
                step: 150,
                charge_pc: 5.0,
            },
        )
        .with_detuning(Microphonics::new(&[50.0], 2e3, 0.3).unwrap())
        .with_clear_at(vec![170])
    };
    let whole_opts = SimOptions {
        n_steps: 200,
        record_every: 1,
        stop_on_non_finite: true,
    };
    let half_opts = SimOptions {
        n_steps: 100,
        ..whole_opts.clone()
    };

    let whole = run_sim(&cav, &mut make(), &whole_opts).unwrap();

    let mut scenario = make();
    let mut state = cav.new_state();
    let first = run_sim_from(&cav, &mut state, &mut scenario, &half_opts, 0).unwrap();
    let second = run_sim_from(&cav, &mut state, &mut scenario, &half_opts, 100).unwrap();

    assert_eq!(second.t[0], whole.t[100]);
    assert_eq!(&whole.t[..100], &first.t[..]);
    assert_eq!(&whole.voltage[..100], &first.voltage[..]);
    assert_eq!(&whole.voltage[100..], &second.voltage[..]);
    assert_eq!(&whole.modes[0].delta_omega[100..], &second.modes[0].delta_omega[..]);
}
