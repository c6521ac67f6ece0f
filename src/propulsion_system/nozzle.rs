use std::f64::consts::PI;

use serde::Serialize;
use tracing::debug;

use crate::constants::{
    MACH_INITIAL_GUESS, NOZZLE_EFFICIENCY, SEA_LEVEL_PRESSURE, STANDARD_GRAVITY,
};
use crate::errors::DesignError;

const MACH_TOLERANCE: f64 = 1e-12;
const MACH_ITERATIONS: usize = 200;
const MACH_UPPER_LIMIT: f64 = 1.0e3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NozzleRequest {
    pub thrust: f64,
    pub specific_heat_ratio: f64,
    pub expansion_ratio: f64,
    pub max_chamber_pressure: f64,
    /// Average over maximum chamber pressure.
    pub pressure_ratio: f64,
    pub efficiency: f64,
    pub characteristic_velocity: f64,
    pub ambient_pressure: f64,
}

impl NozzleRequest {
    pub fn average_chamber_pressure(&self) -> f64 {
        self.max_chamber_pressure * self.pressure_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NozzleGeometry {
    pub specific_heat_ratio: f64,
    pub expansion_ratio: f64,
    pub exit_mach: f64,
    pub exit_pressure_ratio: f64,
    pub throat_area: f64,
    pub throat_diameter: f64,
    pub exit_area: f64,
    pub exit_diameter: f64,
    pub thrust_coefficient: f64,
    pub ideal_thrust_coefficient: f64,
    pub average_chamber_pressure: f64,
    pub characteristic_velocity: f64,
    pub specific_impulse: f64,
}

pub fn circle_area(diameter: f64) -> f64 {
    PI / 4.0 * diameter * diameter
}

pub fn circle_diameter(area: f64) -> f64 {
    (4.0 * area / PI).sqrt()
}

/// Isentropic area ratio `A/A*` at Mach `mach`.
pub fn area_ratio(mach: f64, k: f64) -> f64 {
    let stagnation = (2.0 / (k + 1.0)) * (1.0 + (k - 1.0) / 2.0 * mach * mach);
    stagnation.powf((k + 1.0) / (2.0 * (k - 1.0))) / mach
}

fn area_ratio_slope(mach: f64, k: f64) -> f64 {
    area_ratio(mach, k) * (mach * mach - 1.0) / (mach * (1.0 + (k - 1.0) / 2.0 * mach * mach))
}

/// Static-to-stagnation pressure ratio at Mach `mach`.
pub fn pressure_ratio(mach: f64, k: f64) -> f64 {
    (1.0 + (k - 1.0) / 2.0 * mach * mach).powf(-k / (k - 1.0))
}

/// Supersonic root of the area-Mach relation.
///
/// Newton iteration seeded at Mach 2, kept inside a bracket on the
/// supersonic branch so that a wild step falls back to bisection instead of
/// wandering onto the subsonic root.
pub fn solve_exit_mach(expansion_ratio: f64, k: f64) -> Result<f64, DesignError> {
    let no_root = || DesignError::NozzleConvergence {
        expansion_ratio,
        specific_heat_ratio: k,
    };
    if !(expansion_ratio > 1.0) || !(k > 1.0) || !expansion_ratio.is_finite() {
        return Err(no_root());
    }

    let residual = |mach: f64| area_ratio(mach, k) - expansion_ratio;

    let mut lower = 1.0;
    let mut upper = MACH_INITIAL_GUESS;
    while residual(upper) < 0.0 {
        lower = upper;
        upper *= 2.0;
        if upper > MACH_UPPER_LIMIT {
            return Err(no_root());
        }
    }

    let mut mach = MACH_INITIAL_GUESS;
    for iteration in 0..MACH_ITERATIONS {
        let value = residual(mach);
        if value < 0.0 {
            lower = mach;
        } else {
            upper = mach;
        }

        let slope = area_ratio_slope(mach, k);
        let newton = mach - value / slope;
        let next = if newton.is_finite() && newton > lower && newton < upper {
            newton
        } else {
            0.5 * (lower + upper)
        };

        if (next - mach).abs() < MACH_TOLERANCE * next.abs().max(1.0) {
            debug!(iteration, mach = next, "exit Mach converged");
            return validate_mach(next).ok_or_else(no_root);
        }
        mach = next;
    }

    Err(no_root())
}

fn validate_mach(mach: f64) -> Option<f64> {
    (mach.is_finite() && mach > 1.0).then_some(mach)
}

/// Ideal thrust coefficient: momentum term plus pressure term.
pub fn ideal_thrust_coefficient(
    k: f64,
    exit_pressure_ratio: f64,
    expansion_ratio: f64,
    ambient_to_chamber: f64,
) -> f64 {
    let momentum = (2.0 * k * k / (k - 1.0)
        * (2.0 / (k + 1.0)).powf((k + 1.0) / (k - 1.0))
        * (1.0 - exit_pressure_ratio.powf((k - 1.0) / k)))
    .sqrt();
    momentum + (exit_pressure_ratio - ambient_to_chamber) * expansion_ratio
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NozzlePerformanceSolver;

impl NozzlePerformanceSolver {
    pub fn new() -> Self {
        NozzlePerformanceSolver
    }

    pub fn solve(&self, request: &NozzleRequest) -> Result<NozzleGeometry, DesignError> {
        if !(request.efficiency > 0.0 && request.efficiency <= 1.0) {
            return Err(DesignError::PhysicsError(format!(
                "nozzle efficiency {} must lie in (0, 1]",
                request.efficiency
            )));
        }
        if !(request.thrust > 0.0) || !(request.average_chamber_pressure() > 0.0) {
            return Err(DesignError::PhysicsError(
                "nozzle sizing needs a positive thrust and chamber pressure".to_string(),
            ));
        }

        let k = request.specific_heat_ratio;
        let exit_mach = solve_exit_mach(request.expansion_ratio, k)?;
        let exit_pressure_ratio = pressure_ratio(exit_mach, k);
        let ideal = ideal_thrust_coefficient(
            k,
            exit_pressure_ratio,
            request.expansion_ratio,
            request.ambient_pressure / request.max_chamber_pressure,
        );
        let thrust_coefficient = ideal * request.efficiency;
        if !(thrust_coefficient > 0.0) {
            return Err(DesignError::NonPhysicalNozzle { thrust_coefficient });
        }

        let average_chamber_pressure = request.average_chamber_pressure();
        let throat_area = request.thrust / (average_chamber_pressure * thrust_coefficient);
        let exit_area = throat_area * request.expansion_ratio;

        Ok(NozzleGeometry {
            specific_heat_ratio: k,
            expansion_ratio: request.expansion_ratio,
            exit_mach,
            exit_pressure_ratio,
            throat_area,
            throat_diameter: circle_diameter(throat_area),
            exit_area,
            exit_diameter: circle_diameter(exit_area),
            thrust_coefficient,
            ideal_thrust_coefficient: ideal,
            average_chamber_pressure,
            characteristic_velocity: request.characteristic_velocity,
            specific_impulse: request.characteristic_velocity * thrust_coefficient
                / STANDARD_GRAVITY,
        })
    }
}

impl Default for NozzleRequest {
    fn default() -> Self {
        NozzleRequest {
            thrust: 100.0,
            specific_heat_ratio: 1.137,
            expansion_ratio: 7.414,
            max_chamber_pressure: 3.0e6,
            pressure_ratio: 0.615,
            efficiency: NOZZLE_EFFICIENCY,
            characteristic_velocity: 910.0,
            ambient_pressure: SEA_LEVEL_PRESSURE,
        }
    }
}
