pub mod atmosphere;
pub mod flight;
pub mod integrator;
pub mod optimizer;
