pub mod config;
pub mod constants;
pub mod design;
pub mod errors;
pub mod propulsion_system;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use config::{ConfigError, DesignInput};
pub use errors::DesignError;

pub use design::orchestrator::DesignOrchestrator;
pub use design::report::DesignReport;

// Re-export commonly used items from propulsion_system
pub use propulsion_system::ballistics::{BatesGrain, EfficiencyBands, InternalBallisticsSimulator};
pub use propulsion_system::grain::{GrainRequest, GrainSizer};
pub use propulsion_system::nozzle::{NozzlePerformanceSolver, NozzleRequest};
pub use propulsion_system::propellant::PropellantProperties;

// Re-export commonly used items from trajectory_system
pub use trajectory_system::atmosphere::AtmosphereModel;
pub use trajectory_system::flight::{FlightTrace, RocketConfiguration, TrajectoryIntegrator};
pub use trajectory_system::optimizer::ThrustOptimizer;

pub use telemetry_system::telemetry::Telemetry;
