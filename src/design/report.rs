use serde::Serialize;

use crate::propulsion_system::ballistics::BallisticsSummary;
use crate::propulsion_system::grain::GrainGeometry;
use crate::propulsion_system::nozzle::NozzleGeometry;
use crate::trajectory_system::flight::FlightTrace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub target_apogee: f64,
    pub required_thrust: f64,
    pub apogee: f64,
    /// Achieved minus target apogee.
    pub apogee_error: f64,
    pub max_velocity: f64,
    pub time_of_apogee: f64,
    pub flight_time: f64,
    pub landed: bool,
    pub specific_impulse: f64,
    pub mass_flow_rate: f64,
    pub total_impulse: f64,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrainSizing {
    pub target_burn_time: f64,
    pub burn_time_residual: f64,
    pub required_burn_area: f64,
    pub regression_rate: f64,
    pub mass_flow_rate: f64,
    pub design_pressure: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// One complete motor design.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignReport {
    pub trajectory: TrajectorySummary,
    pub nozzle: NozzleGeometry,
    pub grain: GrainGeometry,
    pub ballistics: BallisticsSummary,
    pub sizing: GrainSizing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<FlightTrace>,
}

impl DesignReport {
    /// Both searches met their tolerance.
    pub fn converged(&self) -> bool {
        self.trajectory.converged && self.sizing.converged
    }

    pub fn without_trace(self) -> Self {
        DesignReport {
            trace: None,
            ..self
        }
    }
}
