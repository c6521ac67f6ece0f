//! Design input: TOML loading, defaults and range validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    APOGEE_TOLERANCE, BURN_TIME_TOLERANCE, GRAIN_SEARCH_ITERATIONS, KNSB_BURN_RATE_COEFFICIENT,
    KNSB_BURN_RATE_EXPONENT, NOZZLE_EFFICIENCY, THRUST_SEARCH_ITERATIONS, THRUST_SEARCH_MAX,
    THRUST_SEARCH_MIN,
};
use crate::propulsion_system::ballistics::EfficiencyBands;
use crate::propulsion_system::propellant::PropellantProperties;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleInput {
    /// Lift-off mass including propellant, kg.
    pub initial_mass: f64,
    pub propellant_mass: f64,
    /// Drag coefficient times reference area, m².
    pub drag_area: f64,
    pub burn_time: f64,
}

impl Default for VehicleInput {
    fn default() -> Self {
        VehicleInput {
            initial_mass: 3.75,
            propellant_mass: 0.400,
            drag_area: 0.00264,
            burn_time: 3.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NozzleInput {
    pub specific_heat_ratio: f64,
    pub expansion_ratio: f64,
    /// Pa.
    pub max_chamber_pressure: f64,
    /// Average over maximum chamber pressure, 0..1.
    pub pressure_ratio: f64,
    pub efficiency: f64,
}

impl Default for NozzleInput {
    fn default() -> Self {
        NozzleInput {
            specific_heat_ratio: 1.137,
            expansion_ratio: 7.414,
            max_chamber_pressure: 3.0e6,
            pressure_ratio: 0.615,
            efficiency: NOZZLE_EFFICIENCY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropellantInput {
    pub density: f64,
    pub characteristic_velocity: f64,
    /// m/s per MPa^n.
    pub burn_rate_coefficient: f64,
    pub burn_rate_exponent: f64,
}

impl Default for PropellantInput {
    fn default() -> Self {
        PropellantInput {
            density: 1700.0,
            characteristic_velocity: 910.0,
            burn_rate_coefficient: KNSB_BURN_RATE_COEFFICIENT,
            burn_rate_exponent: KNSB_BURN_RATE_EXPONENT,
        }
    }
}

impl PropellantInput {
    pub fn properties(&self) -> PropellantProperties {
        PropellantProperties::from_megapascal_burn_rate(
            self.density,
            self.burn_rate_coefficient,
            self.burn_rate_exponent,
            self.characteristic_velocity,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChamberInput {
    pub diameter_mm: f64,
    pub liner_thickness_mm: f64,
}

impl Default for ChamberInput {
    fn default() -> Self {
        ChamberInput {
            diameter_mm: 54.0,
            liner_thickness_mm: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchInput {
    pub min_thrust: f64,
    pub max_thrust: f64,
    pub apogee_tolerance: f64,
    pub thrust_iterations: usize,
    pub burn_time_tolerance: f64,
    pub grain_iterations: usize,
}

impl Default for SearchInput {
    fn default() -> Self {
        SearchInput {
            min_thrust: THRUST_SEARCH_MIN,
            max_thrust: THRUST_SEARCH_MAX,
            apogee_tolerance: APOGEE_TOLERANCE,
            thrust_iterations: THRUST_SEARCH_ITERATIONS,
            burn_time_tolerance: BURN_TIME_TOLERANCE,
            grain_iterations: GRAIN_SEARCH_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesignInput {
    /// m above the pad.
    pub target_altitude: f64,
    pub vehicle: VehicleInput,
    pub nozzle: NozzleInput,
    pub propellant: PropellantInput,
    pub chamber: ChamberInput,
    pub efficiency_bands: EfficiencyBands,
    pub search: SearchInput,
}

impl Default for DesignInput {
    fn default() -> Self {
        DesignInput {
            target_altitude: 295.0,
            vehicle: VehicleInput::default(),
            nozzle: NozzleInput::default(),
            propellant: PropellantInput::default(),
            chamber: ChamberInput::default(),
            efficiency_bands: EfficiencyBands::default(),
            search: SearchInput::default(),
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be a positive finite number"),
        })
    }
}

fn fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must lie in (0, 1]"),
        })
    }
}

impl DesignInput {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let input: DesignInput = toml::from_str(contents)?;
        input.validate()?;
        Ok(input)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Range checks on every field. Grain feasibility (liner against
    /// chamber) is left to the design run, which reports it as a design
    /// error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("target_altitude", self.target_altitude)?;

        let vehicle = &self.vehicle;
        positive("vehicle.initial_mass", vehicle.initial_mass)?;
        positive("vehicle.propellant_mass", vehicle.propellant_mass)?;
        positive("vehicle.drag_area", vehicle.drag_area)?;
        positive("vehicle.burn_time", vehicle.burn_time)?;
        if vehicle.propellant_mass >= vehicle.initial_mass {
            return Err(ConfigError::Invalid {
                field: "vehicle.propellant_mass",
                reason: format!(
                    "{} kg leaves no dry mass out of {} kg",
                    vehicle.propellant_mass, vehicle.initial_mass
                ),
            });
        }

        let nozzle = &self.nozzle;
        if !(nozzle.specific_heat_ratio > 1.0) {
            return Err(ConfigError::Invalid {
                field: "nozzle.specific_heat_ratio",
                reason: format!("{} must be greater than 1", nozzle.specific_heat_ratio),
            });
        }
        positive("nozzle.expansion_ratio", nozzle.expansion_ratio)?;
        positive("nozzle.max_chamber_pressure", nozzle.max_chamber_pressure)?;
        fraction("nozzle.pressure_ratio", nozzle.pressure_ratio)?;
        fraction("nozzle.efficiency", nozzle.efficiency)?;

        let propellant = &self.propellant;
        positive("propellant.density", propellant.density)?;
        positive("propellant.characteristic_velocity", propellant.characteristic_velocity)?;
        positive("propellant.burn_rate_coefficient", propellant.burn_rate_coefficient)?;
        if !(0.0..1.0).contains(&propellant.burn_rate_exponent) {
            return Err(ConfigError::Invalid {
                field: "propellant.burn_rate_exponent",
                reason: format!("{} must lie in [0, 1)", propellant.burn_rate_exponent),
            });
        }

        positive("chamber.diameter_mm", self.chamber.diameter_mm)?;
        if !(self.chamber.liner_thickness_mm >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "chamber.liner_thickness_mm",
                reason: format!("{} must not be negative", self.chamber.liner_thickness_mm),
            });
        }

        let bands = &self.efficiency_bands;
        fraction("efficiency_bands.reduced_factor", bands.reduced_factor)?;
        fraction("efficiency_bands.low_factor", bands.low_factor)?;
        if !(bands.full_pressure_ratio >= bands.reduced_pressure_ratio) {
            return Err(ConfigError::Invalid {
                field: "efficiency_bands.full_pressure_ratio",
                reason: "must not be below reduced_pressure_ratio".to_string(),
            });
        }

        let search = &self.search;
        positive("search.min_thrust", search.min_thrust)?;
        if !(search.max_thrust > search.min_thrust) {
            return Err(ConfigError::Invalid {
                field: "search.max_thrust",
                reason: format!("{} must exceed min_thrust {}", search.max_thrust, search.min_thrust),
            });
        }
        positive("search.apogee_tolerance", search.apogee_tolerance)?;
        positive("search.burn_time_tolerance", search.burn_time_tolerance)?;
        if search.thrust_iterations == 0 || search.grain_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "search",
                reason: "iteration budgets must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
