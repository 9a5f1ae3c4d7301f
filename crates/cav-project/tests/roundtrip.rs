use cav_project::schema::*;
use cav_project::{LATEST_VERSION, load_json, load_yaml, save_json, save_yaml, validate_project};

fn two_mode_project() -> Project {
    Project {
        version: LATEST_VERSION,
        name: "Two Mode Cavity".to_string(),
        cavity: CavityDef {
            length_m: 1.038,
            nominal_gradient_v_per_m: 16e6,
            rf_phase_rad: 0.0,
            design_voltage_v: Some(16.6e6),
            fundamental_index: Some(0),
            lo_w0_rad_s: 8_168_140_899.333_463,
            dt_s: 1e-6,
            waveguide: WaveguideDef::Lossy {
                attenuation_db: 0.5,
                delay_s: 2e-9,
            },
            modes: vec![
                ModeDef {
                    name: "pi".to_string(),
                    r_over_q: 1036.0,
                    foffset_hz: 0.0,
                    q0: 1e10,
                    q_drive: 4e7,
                    q_probe: 2e9,
                    rf_phase_rad: 0.0,
                    phase_rev_rad: 0.25,
                    phase_probe_rad: -0.5,
                    mech_couplings: vec![-1.0],
                },
                ModeDef {
                    name: "8pi/9".to_string(),
                    r_over_q: 10.0,
                    foffset_hz: -8e5,
                    q0: 1e10,
                    q_drive: 8.1e4,
                    q_probe: 2e9,
                    rf_phase_rad: 0.0,
                    phase_rev_rad: 0.0,
                    phase_probe_rad: 0.0,
                    mech_couplings: vec![1.0],
                },
            ],
        },
        run: Some(RunDef {
            n_steps: 500,
            record_every: 5,
            stop_on_non_finite: true,
            drive: DriveDef::Pulse {
                re: 1.0,
                im: 0.5,
                start: 10,
                len: 200,
            },
            beam: BeamDef::Train {
                start: 50,
                period: 25,
                charge_pc: 20.0,
            },
            timing_jitter_s: 1e-12,
            detuning: DetuningDef::Microphonics {
                amplitudes_hz: vec![3.0, 0.0],
                freq_hz: 120.0,
                phase_rad: 0.0,
            },
            clear_at: vec![300],
        }),
    }
}

#[test]
fn roundtrip_yaml_two_mode_project() {
    let project = two_mode_project();
    validate_project(&project).unwrap();

    let temp_dir = std::env::temp_dir();
    let path = temp_dir.join("cav_project_roundtrip_two_mode.yaml");

    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json_two_mode_project() {
    let project = two_mode_project();

    let temp_dir = std::env::temp_dir();
    let path = temp_dir.join("cav_project_roundtrip_two_mode.json");

    save_json(&path, &project).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn save_rejects_invalid_project() {
    let mut project = two_mode_project();
    project.cavity.modes.clear();

    let path = std::env::temp_dir().join("cav_project_invalid.yaml");
    assert!(save_yaml(&path, &project).is_err());
}

#[test]
fn defaults_fill_optional_fields() {
    let yaml = r#"
version: 1
name: minimal
cavity:
  length_m: 1.0
  nominal_gradient_v_per_m: 1.0e6
  lo_w0_rad_s: 8.0e9
  dt_s: 1.0e-6
  modes:
    - name: only
      r_over_q: 100.0
      foffset_hz: 0.0
      q0: 1.0e10
      q_drive: 5.0e7
      q_probe: 1.0e9
run:
  n_steps: 10
"#;
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    validate_project(&project).unwrap();

    assert_eq!(project.cavity.waveguide, WaveguideDef::Ideal);
    assert_eq!(project.cavity.fundamental_index, None);
    assert!(project.cavity.modes[0].mech_couplings.is_empty());
    let run = project.run.unwrap();
    assert_eq!(run.record_every, 1);
    assert_eq!(run.drive, DriveDef::Off);
    assert_eq!(run.beam, BeamDef::None);
    assert_eq!(run.detuning, DetuningDef::None);
}
