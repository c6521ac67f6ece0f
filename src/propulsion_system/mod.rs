pub mod ballistics;
pub mod grain;
pub mod nozzle;
pub mod propellant;
