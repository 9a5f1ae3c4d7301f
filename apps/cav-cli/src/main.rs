use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use cav_model::Cavity;
use cav_project::{Project, ProjectError, build_cavity, build_scenario, sim_options};
use cav_sim::{SimError, SimRecord, run_sim};
use tracing::info;
use uom::si::electric_potential::volt;

type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Project(#[from] ProjectError),

    #[error("Model error: {0}")]
    Model(#[from] cav_model::ModelError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(name = "cav-cli")]
#[command(about = "Multi-mode RF cavity simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Show derived mode parameters of a project's cavity
    Info {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Run the project's simulation and export the recorded trace
    Run {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Override the number of steps from the run section
        #[arg(long)]
        steps: Option<usize>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Info { project_path } => cmd_info(&project_path),
        Commands::Run {
            project_path,
            steps,
            output,
        } => cmd_run(&project_path, steps, output.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = cav_project::load(project_path)?;
    build_cavity(&project.cavity)?;
    if let Some(run) = &project.run {
        build_scenario(run)?;
    }
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_info(project_path: &Path) -> CliResult<()> {
    let project = cav_project::load(project_path)?;
    let cavity = build_cavity(&project.cavity)?;
    print_cavity_info(&project, &cavity)
}

fn print_cavity_info(project: &Project, cavity: &Cavity) -> CliResult<()> {
    println!("Cavity '{}'", project.name);
    println!(
        "  Nominal voltage: {:.4e} V",
        cavity.nominal_voltage().get::<volt>()
    );
    if let Some(v) = cavity.design_voltage() {
        println!("  Design voltage:  {:.4e} V", v.get::<volt>());
    }
    println!("  Time step:       {:.3e} s", project.cavity.dt_s);
    println!("  Mechanical modes: {}", cavity.n_mech());

    println!("\nModes:");
    for (idx, def) in project.cavity.modes.iter().enumerate() {
        let mode = cavity.mode(idx)?;
        let marker = if cavity.fundamental_index() == Some(idx) {
            " (fundamental)"
        } else {
            ""
        };
        println!("  [{}] {}{}", idx, def.name, marker);
        println!("      Loaded Q:        {:.4e}", mode.loaded_q());
        println!(
            "      Half bandwidth:  {:.4e} rad/s ({:.3} Hz)",
            mode.bandwidth(),
            mode.bandwidth() / std::f64::consts::TAU
        );
        println!("      Offset:          {:.4e} rad/s", mode.omega_d0());
        println!(
            "      Shunt impedance: {:.4e} Ohm (R/Q {:.2} Ohm)",
            def.r_over_q * mode.loaded_q(),
            def.r_over_q
        );
        println!("      k_drive:         {:.4e}", mode.k_drive());
        println!("      k_beam:          {:.4e}", mode.k_beam());
        println!("      k_probe:         {:.4e}", mode.k_probe());
        println!("      k_em:            {:.4e}", mode.k_em());
    }
    Ok(())
}

fn cmd_run(project_path: &Path, steps: Option<usize>, output: Option<&Path>) -> CliResult<()> {
    let project = cav_project::load(project_path)?;
    let run = project.run.as_ref().ok_or(ProjectError::MissingRun)?;
    let cavity = build_cavity(&project.cavity)?;
    let mut scenario = build_scenario(run)?;
    let mut opts = sim_options(run);
    if let Some(n) = steps {
        opts.n_steps = n;
    }

    info!(project = %project.name, "running simulation");
    let started = Instant::now();
    let record = run_sim(&cavity, &mut scenario, &opts)?;
    let elapsed = started.elapsed().as_secs_f64();

    let names: Vec<&str> = project.cavity.modes.iter().map(|m| m.name.as_str()).collect();
    let csv = trace_csv(&record, &names);

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} records to {} ({:.3}s)",
            record.len(),
            path.display(),
            elapsed
        );
        if let Some(step) = record.first_non_finite {
            println!("  Voltage became non-finite at step {}", step);
        }
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn trace_csv(record: &SimRecord, mode_names: &[&str]) -> String {
    let mut csv = String::from(
        "time_s,drive_re,drive_im,voltage_re,voltage_im,probe_re,probe_im,reflected_re,reflected_im",
    );
    for name in mode_names {
        csv.push_str(&format!(",{name}_energy,{name}_phase,{name}_delta_omega"));
    }
    csv.push('\n');

    for i in 0..record.len() {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}",
            record.t[i],
            record.drive[i].re,
            record.drive[i].im,
            record.voltage[i].re,
            record.voltage[i].im,
            record.probe[i].re,
            record.probe[i].im,
            record.reflected[i].re,
            record.reflected[i].im,
        ));
        for trace in &record.modes {
            csv.push_str(&format!(
                ",{},{},{}",
                trace.stored_energy[i], trace.phase[i], trace.delta_omega[i]
            ));
        }
        csv.push('\n');
    }
    csv
}
