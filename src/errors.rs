use thiserror::Error;

use crate::trajectory_system::integrator::IntegrationError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DesignError {
    #[error(
        "Infeasible geometry: {reason} (chamber diameter {chamber_diameter:.4} m, liner thickness {liner_thickness:.4} m)"
    )]
    InfeasibleGeometry {
        chamber_diameter: f64,
        liner_thickness: f64,
        reason: String,
    },

    #[error(
        "Nozzle error: no supersonic exit Mach for expansion ratio {expansion_ratio} and k = {specific_heat_ratio}"
    )]
    NozzleConvergence {
        expansion_ratio: f64,
        specific_heat_ratio: f64,
    },

    #[error("Nozzle error: realized thrust coefficient {thrust_coefficient:.4} is not positive")]
    NonPhysicalNozzle { thrust_coefficient: f64 },

    #[error("Physics error: {0}")]
    PhysicsError(String),

    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),
}
