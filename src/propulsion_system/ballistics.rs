use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BALLISTICS_TIME_STEP, FULL_EFFICIENCY_PRESSURE_RATIO, LOW_EFFICIENCY_FACTOR, MAX_BURN_TIME,
    REDUCED_EFFICIENCY_FACTOR, REDUCED_EFFICIENCY_PRESSURE_RATIO, SEA_LEVEL_PRESSURE,
};
use crate::errors::DesignError;
use crate::propulsion_system::propellant::PropellantProperties;

/// Thrust coefficient derating at low chamber pressure. Pressures are
/// ratios to ambient; the factors multiply the nominal coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EfficiencyBands {
    pub full_pressure_ratio: f64,
    pub reduced_pressure_ratio: f64,
    pub reduced_factor: f64,
    pub low_factor: f64,
}

impl Default for EfficiencyBands {
    fn default() -> Self {
        EfficiencyBands {
            full_pressure_ratio: FULL_EFFICIENCY_PRESSURE_RATIO,
            reduced_pressure_ratio: REDUCED_EFFICIENCY_PRESSURE_RATIO,
            reduced_factor: REDUCED_EFFICIENCY_FACTOR,
            low_factor: LOW_EFFICIENCY_FACTOR,
        }
    }
}

impl EfficiencyBands {
    pub fn factor(&self, pressure_ratio: f64) -> f64 {
        if pressure_ratio > self.full_pressure_ratio {
            1.0
        } else if pressure_ratio >= self.reduced_pressure_ratio {
            self.reduced_factor
        } else {
            self.low_factor
        }
    }
}

/// Cylindrical grain with an open core, inhibited on the outer surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatesGrain {
    pub outer_diameter: f64,
    pub core_diameter: f64,
    pub length: f64,
}

impl BatesGrain {
    /// Annulus area of one end face for a given core diameter.
    pub fn end_face_area(&self, core_diameter: f64) -> f64 {
        (PI / 4.0 * (self.outer_diameter.powi(2) - core_diameter.powi(2))).max(0.0)
    }

    pub fn propellant_volume(&self) -> f64 {
        self.end_face_area(self.core_diameter) * self.length
    }

    pub fn web_thickness(&self) -> f64 {
        0.5 * (self.outer_diameter - self.core_diameter)
    }

    /// Core wall plus both end faces after `burn_depth` of regression.
    pub fn burning_area(&self, burn_depth: f64) -> f64 {
        let core = self.core_diameter + 2.0 * burn_depth;
        let length = (self.length - 2.0 * burn_depth).max(0.0);
        PI * core * length + 2.0 * self.end_face_area(core)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BallisticsSample {
    pub time: f64,
    pub burn_depth: f64,
    pub burning_area: f64,
    pub klemmung: f64,
    pub chamber_pressure: f64,
    pub thrust: f64,
    pub regression_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BallisticsSummary {
    pub burn_time: f64,
    pub total_impulse: f64,
    pub max_pressure: f64,
    pub average_thrust: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BallisticsTrace {
    pub time_step: f64,
    pub samples: Vec<BallisticsSample>,
    pub burn_time: f64,
}

impl BallisticsTrace {
    pub fn summary(&self) -> BallisticsSummary {
        let total_impulse: f64 = self
            .samples
            .iter()
            .map(|sample| sample.thrust * self.time_step)
            .sum();
        let max_pressure = self
            .samples
            .iter()
            .map(|sample| sample.chamber_pressure)
            .fold(0.0, f64::max);
        let average_thrust = if self.burn_time > 0.0 {
            total_impulse / self.burn_time
        } else {
            0.0
        };

        BallisticsSummary {
            burn_time: self.burn_time,
            total_impulse,
            max_pressure,
            average_thrust,
        }
    }

    /// Propellant mass consumed, `sum(rho * Ab * r * dt)`.
    pub fn consumed_mass(&self, propellant: &PropellantProperties) -> f64 {
        self.samples
            .iter()
            .map(|sample| {
                propellant.density * sample.burning_area * sample.regression_rate * self.time_step
            })
            .sum()
    }
}

/// Fixed-step, quasi-steady internal ballistics of a single BATES segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InternalBallisticsSimulator {
    pub time_step: f64,
    pub max_burn_time: f64,
    pub ambient_pressure: f64,
    pub bands: EfficiencyBands,
}

impl Default for InternalBallisticsSimulator {
    fn default() -> Self {
        InternalBallisticsSimulator {
            time_step: BALLISTICS_TIME_STEP,
            max_burn_time: MAX_BURN_TIME,
            ambient_pressure: SEA_LEVEL_PRESSURE,
            bands: EfficiencyBands::default(),
        }
    }
}

impl InternalBallisticsSimulator {
    pub fn with_bands(mut self, bands: EfficiencyBands) -> Self {
        self.bands = bands;
        self
    }

    pub fn simulate(
        &self,
        grain: &BatesGrain,
        propellant: &PropellantProperties,
        throat_area: f64,
        thrust_coefficient: f64,
    ) -> Result<BallisticsTrace, DesignError> {
        if !(throat_area > 0.0) || !(self.time_step > 0.0) {
            return Err(DesignError::PhysicsError(format!(
                "ballistics needs a positive throat area and time step (throat area {throat_area} m², dt {} s)",
                self.time_step
            )));
        }
        propellant.validate()?;

        let mut samples = Vec::new();
        let mut burn_depth = 0.0;
        let mut time = 0.0;

        loop {
            let core_diameter = grain.core_diameter + 2.0 * burn_depth;
            let length = grain.length - 2.0 * burn_depth;
            if core_diameter >= grain.outer_diameter
                || length <= 0.0
                || time > self.max_burn_time
            {
                break;
            }

            let burning_area = grain.burning_area(burn_depth);
            let klemmung = burning_area / throat_area;
            let chamber_pressure = propellant
                .equilibrium_pressure(klemmung)
                .max(self.ambient_pressure);
            let derating = self.bands.factor(chamber_pressure / self.ambient_pressure);
            let thrust = chamber_pressure * throat_area * thrust_coefficient * derating;
            let regression_rate = propellant.burn_rate(chamber_pressure);

            samples.push(BallisticsSample {
                time,
                burn_depth,
                burning_area,
                klemmung,
                chamber_pressure,
                thrust,
                regression_rate,
            });

            burn_depth += regression_rate * self.time_step;
            time += self.time_step;
        }

        Ok(BallisticsTrace {
            time_step: self.time_step,
            samples,
            burn_time: time,
        })
    }
}
