//! Project validation logic.

use crate::schema::{BeamDef, CavityDef, DetuningDef, ModeDef, Project, RunDef};
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_cavity(&project.cavity)?;
    if let Some(run) = &project.run {
        validate_run(run, project.cavity.modes.len())?;
    }
    Ok(())
}

fn validate_cavity(cavity: &CavityDef) -> Result<(), ValidationError> {
    positive("cavity.length_m", cavity.length_m)?;
    positive("cavity.lo_w0_rad_s", cavity.lo_w0_rad_s)?;
    positive("cavity.dt_s", cavity.dt_s)?;

    if cavity.modes.is_empty() {
        return Err(invalid("cavity.modes", "[]", "at least one mode is required"));
    }

    if let Some(index) = cavity.fundamental_index {
        if index >= cavity.modes.len() {
            return Err(invalid(
                "cavity.fundamental_index",
                index,
                "must reference an existing mode",
            ));
        }
    }

    let mut names = HashSet::new();
    for mode in &cavity.modes {
        if !names.insert(&mode.name) {
            return Err(ValidationError::DuplicateId {
                id: mode.name.clone(),
                context: "cavity modes".to_string(),
            });
        }
        validate_mode(mode)?;
    }

    let n_mech = cavity.modes[0].mech_couplings.len();
    for mode in &cavity.modes {
        if mode.mech_couplings.len() != n_mech {
            return Err(invalid(
                format!("modes.{}.mech_couplings", mode.name),
                mode.mech_couplings.len(),
                "every mode needs the same number of mechanical couplings",
            ));
        }
    }
    Ok(())
}

fn validate_mode(mode: &ModeDef) -> Result<(), ValidationError> {
    let field = |f: &str| format!("modes.{}.{}", mode.name, f);
    positive(field("r_over_q"), mode.r_over_q)?;
    positive(field("q0"), mode.q0)?;
    positive(field("q_drive"), mode.q_drive)?;
    positive(field("q_probe"), mode.q_probe)?;
    Ok(())
}

fn validate_run(run: &RunDef, n_modes: usize) -> Result<(), ValidationError> {
    if run.n_steps == 0 {
        return Err(invalid("run.n_steps", 0, "must be positive"));
    }
    if run.record_every == 0 {
        return Err(invalid("run.record_every", 0, "must be positive"));
    }
    if let BeamDef::Train { period: 0, .. } = run.beam {
        return Err(invalid("run.beam.period", 0, "must be positive"));
    }

    let per_mode = match &run.detuning {
        DetuningDef::None => None,
        DetuningDef::Static { offsets_hz } => Some(offsets_hz.len()),
        DetuningDef::Microphonics { amplitudes_hz, .. } => Some(amplitudes_hz.len()),
    };
    if let Some(len) = per_mode {
        if len != n_modes {
            return Err(invalid(
                "run.detuning",
                len,
                "needs exactly one entry per cavity mode",
            ));
        }
    }
    Ok(())
}
