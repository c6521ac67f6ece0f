use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rocket_design::{DesignInput, DesignOrchestrator};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rocket-design")]
#[command(about = "Solid rocket motor design from a target apogee")]
#[command(version)]
struct Cli {
    /// TOML design input; every field is optional
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target apogee in m
    #[arg(long)]
    target_altitude: Option<f64>,

    /// Lift-off mass in kg
    #[arg(long)]
    initial_mass: Option<f64>,

    /// Propellant mass in kg
    #[arg(long)]
    propellant_mass: Option<f64>,

    /// Motor burn time in s
    #[arg(long)]
    burn_time: Option<f64>,

    /// Motor case inner diameter in mm
    #[arg(long)]
    chamber_diameter: Option<f64>,

    /// Liner thickness in mm
    #[arg(long)]
    liner_thickness: Option<f64>,

    /// Nozzle efficiency applied to the ideal thrust coefficient
    #[arg(long)]
    nozzle_efficiency: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Include the sampled flight trace in the report
    #[arg(long, default_value_t = false)]
    include_trace: bool,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn design_input(&self) -> anyhow::Result<DesignInput> {
        let mut input = match &self.config {
            Some(path) => DesignInput::from_path(path)
                .with_context(|| format!("loading design input from {}", path.display()))?,
            None => DesignInput::default(),
        };

        if let Some(value) = self.target_altitude {
            input.target_altitude = value;
        }
        if let Some(value) = self.initial_mass {
            input.vehicle.initial_mass = value;
        }
        if let Some(value) = self.propellant_mass {
            input.vehicle.propellant_mass = value;
        }
        if let Some(value) = self.burn_time {
            input.vehicle.burn_time = value;
        }
        if let Some(value) = self.chamber_diameter {
            input.chamber.diameter_mm = value;
        }
        if let Some(value) = self.liner_thickness {
            input.chamber.liner_thickness_mm = value;
        }
        if let Some(value) = self.nozzle_efficiency {
            input.nozzle.efficiency = value;
        }

        input.validate().context("invalid design input")?;
        Ok(input)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let input = cli.design_input()?;

    let report = DesignOrchestrator::new()
        .with_trace(cli.include_trace)
        .run(&input)
        .context("motor design failed")?;

    if !report.converged() {
        warn!("design searches did not all converge, the report holds the closest estimates");
    }

    match cli.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
