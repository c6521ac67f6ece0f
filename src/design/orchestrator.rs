use tracing::{info, warn};

use crate::config::DesignInput;
use crate::design::report::{DesignReport, GrainSizing, TrajectorySummary};
use crate::errors::DesignError;
use crate::propulsion_system::ballistics::InternalBallisticsSimulator;
use crate::propulsion_system::grain::{GrainRequest, GrainSizer};
use crate::propulsion_system::nozzle::{NozzlePerformanceSolver, NozzleRequest};
use crate::telemetry_system::telemetry::Telemetry;
use crate::trajectory_system::atmosphere::AtmosphereModel;
use crate::trajectory_system::flight::{RocketConfiguration, TrajectoryIntegrator};
use crate::trajectory_system::optimizer::ThrustOptimizer;

const METERS_PER_MILLIMETER: f64 = 1.0e-3;

/// Runs the three design stages in order: thrust, nozzle, grain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesignOrchestrator {
    pub include_trace: bool,
}

impl DesignOrchestrator {
    pub fn new() -> Self {
        DesignOrchestrator::default()
    }

    pub fn with_trace(mut self, include_trace: bool) -> Self {
        self.include_trace = include_trace;
        self
    }

    fn thrust_optimizer(input: &DesignInput) -> ThrustOptimizer {
        ThrustOptimizer {
            min_thrust: input.search.min_thrust,
            max_thrust: input.search.max_thrust,
            tolerance: input.search.apogee_tolerance,
            max_iterations: input.search.thrust_iterations,
            integrator: TrajectoryIntegrator::default(),
        }
    }

    fn grain_sizer(input: &DesignInput) -> GrainSizer {
        GrainSizer {
            tolerance: input.search.burn_time_tolerance,
            max_iterations: input.search.grain_iterations,
            simulator: InternalBallisticsSimulator::default().with_bands(input.efficiency_bands),
            ..GrainSizer::default()
        }
    }

    pub fn run(&self, input: &DesignInput) -> Result<DesignReport, DesignError> {
        let chamber_diameter = input.chamber.diameter_mm * METERS_PER_MILLIMETER;
        let liner_thickness = input.chamber.liner_thickness_mm * METERS_PER_MILLIMETER;
        let sizer = Self::grain_sizer(input);
        sizer.check_feasibility(chamber_diameter, liner_thickness)?;

        let vehicle = RocketConfiguration::new(
            0.0,
            input.vehicle.burn_time,
            input.vehicle.initial_mass,
            input.vehicle.propellant_mass,
            input.vehicle.drag_area,
        );
        let thrust = Self::thrust_optimizer(input).optimize(&vehicle, input.target_altitude)?;
        info!(
            thrust = thrust.average_thrust,
            apogee = thrust.apogee,
            "trajectory stage complete"
        );

        let ambient_pressure = AtmosphereModel::new().pressure(0.0);
        let nozzle = NozzlePerformanceSolver::new().solve(&NozzleRequest {
            thrust: thrust.average_thrust,
            specific_heat_ratio: input.nozzle.specific_heat_ratio,
            expansion_ratio: input.nozzle.expansion_ratio,
            max_chamber_pressure: input.nozzle.max_chamber_pressure,
            pressure_ratio: input.nozzle.pressure_ratio,
            efficiency: input.nozzle.efficiency,
            characteristic_velocity: input.propellant.characteristic_velocity,
            ambient_pressure,
        })?;
        info!(
            throat_diameter = nozzle.throat_diameter,
            exit_diameter = nozzle.exit_diameter,
            thrust_coefficient = nozzle.thrust_coefficient,
            "nozzle stage complete"
        );

        let propellant = input.propellant.properties();
        let design = sizer.size(
            &GrainRequest {
                chamber_diameter,
                liner_thickness,
                propellant_mass: input.vehicle.propellant_mass,
                throat_area: nozzle.throat_area,
                thrust_coefficient: nozzle.thrust_coefficient,
                target_burn_time: input.vehicle.burn_time,
                design_pressure: nozzle.average_chamber_pressure,
            },
            &propellant,
        )?;
        info!(
            core_diameter = design.geometry.core_diameter,
            length = design.geometry.length,
            burn_time = design.ballistics.burn_time,
            "grain stage complete"
        );
        if !design.converged {
            warn!(
                residual = design.burn_time_residual,
                "grain burn time did not reach the target, reporting closest core"
            );
        }

        let telemetry = Telemetry::from_trace(&thrust.trace);
        let trajectory = TrajectorySummary {
            target_apogee: input.target_altitude,
            required_thrust: thrust.average_thrust,
            apogee: thrust.apogee,
            apogee_error: thrust.residual,
            max_velocity: telemetry.max_velocity,
            time_of_apogee: telemetry.time_of_apogee,
            flight_time: telemetry.flight_time,
            landed: telemetry.landed,
            specific_impulse: vehicle.with_thrust(thrust.average_thrust).specific_impulse(),
            mass_flow_rate: vehicle.mass_flow_rate(),
            total_impulse: vehicle.with_thrust(thrust.average_thrust).total_impulse(),
            iterations: thrust.iterations,
            converged: thrust.converged,
        };

        Ok(DesignReport {
            trajectory,
            nozzle,
            grain: design.geometry,
            ballistics: design.ballistics,
            sizing: GrainSizing {
                target_burn_time: input.vehicle.burn_time,
                burn_time_residual: design.burn_time_residual,
                required_burn_area: design.required_burn_area,
                regression_rate: design.regression_rate,
                mass_flow_rate: design.mass_flow_rate,
                design_pressure: nozzle.average_chamber_pressure,
                iterations: design.iterations,
                converged: design.converged,
            },
            trace: self.include_trace.then_some(thrust.trace),
        })
    }
}
