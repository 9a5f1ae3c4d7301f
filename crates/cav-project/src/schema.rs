//! Project schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    pub cavity: CavityDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CavityDef {
    pub length_m: f64,
    pub nominal_gradient_v_per_m: f64,
    #[serde(default)]
    pub rf_phase_rad: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_voltage_v: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fundamental_index: Option<usize>,
    /// Drive (LO) angular frequency shared by all modes
    pub lo_w0_rad_s: f64,
    pub dt_s: f64,
    #[serde(default)]
    pub waveguide: WaveguideDef,
    pub modes: Vec<ModeDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeDef {
    pub name: String,
    pub r_over_q: f64,
    pub foffset_hz: f64,
    pub q0: f64,
    pub q_drive: f64,
    pub q_probe: f64,
    #[serde(default)]
    pub rf_phase_rad: f64,
    #[serde(default)]
    pub phase_rev_rad: f64,
    #[serde(default)]
    pub phase_probe_rad: f64,
    #[serde(default)]
    pub mech_couplings: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum WaveguideDef {
    #[default]
    Ideal,
    Lossy {
        attenuation_db: f64,
        delay_s: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    pub n_steps: usize,
    #[serde(default = "default_record_every")]
    pub record_every: usize,
    #[serde(default)]
    pub stop_on_non_finite: bool,
    #[serde(default)]
    pub drive: DriveDef,
    #[serde(default)]
    pub beam: BeamDef,
    #[serde(default)]
    pub timing_jitter_s: f64,
    #[serde(default)]
    pub detuning: DetuningDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clear_at: Vec<usize>,
}

fn default_record_every() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum DriveDef {
    #[default]
    Off,
    Constant {
        re: f64,
        im: f64,
    },
    Pulse {
        re: f64,
        im: f64,
        start: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum BeamDef {
    #[default]
    None,
    Single {
        step: usize,
        charge_pc: f64,
    },
    Train {
        start: usize,
        period: usize,
        charge_pc: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum DetuningDef {
    #[default]
    None,
    Static {
        offsets_hz: Vec<f64>,
    },
    Microphonics {
        amplitudes_hz: Vec<f64>,
        freq_hz: f64,
        #[serde(default)]
        phase_rad: f64,
    },
}
