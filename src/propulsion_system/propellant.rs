use serde::Serialize;

use crate::constants::{
    KNSB_BURN_RATE_COEFFICIENT, KNSB_BURN_RATE_EXPONENT, KNSB_CHARACTERISTIC_VELOCITY,
    KNSB_DENSITY,
};
use crate::errors::DesignError;

const PASCALS_PER_MEGAPASCAL: f64 = 1.0e6;

/// Propellant performance data. `burn_rate_coefficient` is in SI form,
/// m/s per Pa^n, so that `r = a * Pc^n` takes the chamber pressure in Pa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropellantProperties {
    pub density: f64,
    pub burn_rate_coefficient: f64,
    pub burn_rate_exponent: f64,
    pub characteristic_velocity: f64,
}

impl PropellantProperties {
    /// Builds the properties from a burn-rate coefficient quoted in
    /// m/s per MPa^n, the form published for amateur propellants.
    pub fn from_megapascal_burn_rate(
        density: f64,
        burn_rate_coefficient_mpa: f64,
        burn_rate_exponent: f64,
        characteristic_velocity: f64,
    ) -> Self {
        PropellantProperties {
            density,
            burn_rate_coefficient: burn_rate_coefficient_mpa
                * PASCALS_PER_MEGAPASCAL.powf(-burn_rate_exponent),
            burn_rate_exponent,
            characteristic_velocity,
        }
    }

    /// Potassium nitrate / sorbitol (65/35).
    pub fn knsb() -> Self {
        Self::from_megapascal_burn_rate(
            KNSB_DENSITY,
            KNSB_BURN_RATE_COEFFICIENT,
            KNSB_BURN_RATE_EXPONENT,
            KNSB_CHARACTERISTIC_VELOCITY,
        )
    }

    pub fn with_density(self, density: f64) -> Self {
        PropellantProperties { density, ..self }
    }

    pub fn with_characteristic_velocity(self, characteristic_velocity: f64) -> Self {
        PropellantProperties {
            characteristic_velocity,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), DesignError> {
        if !(self.density > 0.0)
            || !(self.burn_rate_coefficient > 0.0)
            || !(self.characteristic_velocity > 0.0)
        {
            return Err(DesignError::PhysicsError(
                "propellant density, burn rate coefficient and c* must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.burn_rate_exponent) {
            return Err(DesignError::PhysicsError(format!(
                "burn rate exponent {} must lie in [0, 1)",
                self.burn_rate_exponent
            )));
        }
        Ok(())
    }

    /// Vieille's law, pressure in Pa.
    pub fn burn_rate(&self, chamber_pressure: f64) -> f64 {
        self.burn_rate_coefficient * chamber_pressure.powf(self.burn_rate_exponent)
    }

    /// Equilibrium chamber pressure for a given Klemmung, from equating
    /// the mass generation rate with the nozzle mass flow.
    pub fn equilibrium_pressure(&self, klemmung: f64) -> f64 {
        (klemmung * self.density * self.burn_rate_coefficient * self.characteristic_velocity)
            .powf(1.0 / (1.0 - self.burn_rate_exponent))
    }
}

impl Default for PropellantProperties {
    fn default() -> Self {
        Self::knsb()
    }
}
