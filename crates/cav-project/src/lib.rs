//! cav-project: cavity project file format, validation and model building.

use std::path::Path;

pub mod build;
pub mod schema;
pub mod validate;

pub use build::{build_cavity, build_scenario, mode_params, sim_options};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Model error: {0}")]
    Model(#[from] cav_model::ModelError),

    #[error("Simulation setup error: {0}")]
    Sim(#[from] cav_sim::SimError),

    /// The command needs a `run:` section the project does not have.
    #[error("Project has no run section")]
    MissingRun,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encodings of a [`Project`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    fn parse(self, text: &str) -> ProjectResult<Project> {
        Ok(match self {
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Json => serde_json::from_str(text)?,
        })
    }

    fn render(self, project: &Project) -> ProjectResult<String> {
        Ok(match self {
            Format::Yaml => serde_yaml::to_string(project)?,
            Format::Json => serde_json::to_string_pretty(project)?,
        })
    }
}

/// Read, parse and validate a project.
pub fn load_as(path: &Path, format: Format) -> ProjectResult<Project> {
    let project = format.parse(&std::fs::read_to_string(path)?)?;
    validate_project(&project)?;
    Ok(project)
}

/// Validate, then write a project. Invalid projects never reach the disk.
pub fn save_as(path: &Path, project: &Project, format: Format) -> ProjectResult<()> {
    validate_project(project)?;
    std::fs::write(path, format.render(project)?)?;
    Ok(())
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    load_as(path, Format::Yaml)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    save_as(path, project, Format::Yaml)
}

pub fn load_json(path: &Path) -> ProjectResult<Project> {
    load_as(path, Format::Json)
}

pub fn save_json(path: &Path, project: &Project) -> ProjectResult<()> {
    save_as(path, project, Format::Json)
}

/// Load a project, picking the format from the file extension.
pub fn load(path: &Path) -> ProjectResult<Project> {
    load_as(path, Format::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("a/cavity.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("cavity.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("cavity.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("cavity")), Format::Yaml);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("cav_project_does_not_exist.yaml");
        assert!(matches!(load(&path), Err(ProjectError::Io(_))));
    }
}
