use serde::Serialize;

use crate::constants::{
    AIR_DENSITY_SEA_LEVEL, SEA_LEVEL_PRESSURE, SEA_LEVEL_TEMPERATURE, SPECIFIC_GAS_CONSTANT_AIR,
    STANDARD_GRAVITY, TROPOPAUSE_PRESSURE, TROPOPAUSE_TEMPERATURE, TROPOSPHERE_HEIGHT,
    TROPOSPHERE_PRESSURE_EXPONENT, TROPOSPHERE_TEMP_GRADIENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtmosphericState {
    pub density: f64,
    pub pressure: f64,
}

/// Two-layer ISA approximation: linear lapse troposphere below 11 km,
/// isothermal stratosphere above it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtmosphereModel;

impl AtmosphereModel {
    pub fn new() -> Self {
        AtmosphereModel
    }

    pub fn state_at(&self, altitude: f64) -> AtmosphericState {
        if altitude < 0.0 {
            // Below the pad the sea-level state is returned unchanged.
            AtmosphericState {
                density: AIR_DENSITY_SEA_LEVEL,
                pressure: SEA_LEVEL_PRESSURE,
            }
        } else if altitude < TROPOSPHERE_HEIGHT {
            self.troposphere(altitude)
        } else {
            self.stratosphere(altitude)
        }
    }

    pub fn density(&self, altitude: f64) -> f64 {
        self.state_at(altitude).density
    }

    pub fn pressure(&self, altitude: f64) -> f64 {
        self.state_at(altitude).pressure
    }

    fn troposphere(&self, altitude: f64) -> AtmosphericState {
        let temperature = SEA_LEVEL_TEMPERATURE + TROPOSPHERE_TEMP_GRADIENT * altitude;
        let pressure = SEA_LEVEL_PRESSURE
            * (temperature / SEA_LEVEL_TEMPERATURE).powf(TROPOSPHERE_PRESSURE_EXPONENT);

        AtmosphericState {
            density: pressure / (SPECIFIC_GAS_CONSTANT_AIR * temperature),
            pressure,
        }
    }

    fn stratosphere(&self, altitude: f64) -> AtmosphericState {
        let decay = (-STANDARD_GRAVITY * (altitude - TROPOSPHERE_HEIGHT)
            / (SPECIFIC_GAS_CONSTANT_AIR * TROPOPAUSE_TEMPERATURE))
            .exp();
        let base_density =
            TROPOPAUSE_PRESSURE / (SPECIFIC_GAS_CONSTANT_AIR * TROPOPAUSE_TEMPERATURE);

        AtmosphericState {
            density: base_density * decay,
            pressure: TROPOPAUSE_PRESSURE * decay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_sea_level_conditions() {
        let state = AtmosphereModel::new().state_at(0.0);

        assert_abs_diff_eq!(state.pressure, 101_325.0, epsilon = 1e-6);
        assert_abs_diff_eq!(state.density, 1.225, epsilon = 0.001);
    }

    #[test]
    fn test_below_ground_returns_sea_level_exactly() {
        let atmosphere = AtmosphereModel::new();

        for altitude in [-0.001, -1.0, -250.0, -1.0e6] {
            let state = atmosphere.state_at(altitude);
            assert_eq!(state.density, 1.225);
            assert_eq!(state.pressure, 101_325.0);
        }
    }

    #[test]
    fn test_density_strictly_decreasing_in_troposphere() {
        let atmosphere = AtmosphereModel::new();
        let mut previous = atmosphere.density(0.0);

        let mut altitude = 10.0;
        while altitude < TROPOSPHERE_HEIGHT {
            let density = atmosphere.density(altitude);
            assert!(
                density < previous,
                "density did not decrease at {altitude} m: {density} >= {previous}"
            );
            previous = density;
            altitude += 10.0;
        }
    }

    #[test]
    fn test_tropopause_continuity() {
        let atmosphere = AtmosphereModel::new();
        let below = atmosphere.state_at(TROPOSPHERE_HEIGHT - 1e-6);
        let above = atmosphere.state_at(TROPOSPHERE_HEIGHT);

        assert_relative_eq!(below.density, above.density, max_relative = 0.01);
        assert_relative_eq!(below.pressure, above.pressure, max_relative = 0.01);
        assert_abs_diff_eq!(above.density, 0.3639, epsilon = 0.001);
    }

    #[test]
    fn test_stratosphere_decays() {
        let atmosphere = AtmosphereModel::new();
        let at_15km = atmosphere.state_at(15_000.0);
        let at_20km = atmosphere.state_at(20_000.0);

        assert!(at_20km.pressure < at_15km.pressure);
        assert!(at_20km.density < at_15km.density);
        assert!(at_20km.pressure > 0.0);
    }
}
