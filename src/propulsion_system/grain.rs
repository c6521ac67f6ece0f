use std::f64::consts::PI;

use serde::Serialize;
use tracing::info;

use crate::constants::{
    BURN_TIME_TOLERANCE, EROSIVE_LENGTH_TO_DIAMETER, GRAIN_SEARCH_ITERATIONS,
    MIN_CORE_DIAMETER, MIN_PORT_RATIO, MIN_WEB_MARGIN,
};
use crate::errors::DesignError;
use crate::propulsion_system::ballistics::{
    BallisticsSummary, BatesGrain, InternalBallisticsSimulator,
};
use crate::propulsion_system::nozzle::circle_area;
use crate::propulsion_system::propellant::PropellantProperties;
use crate::utils::bisection::{BisectionSearch, Monotonicity};

/// Everything needed to size a grain around a solved nozzle. Lengths in m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrainRequest {
    pub chamber_diameter: f64,
    pub liner_thickness: f64,
    pub propellant_mass: f64,
    pub throat_area: f64,
    pub thrust_coefficient: f64,
    pub target_burn_time: f64,
    /// Average design chamber pressure, used for the analytic burn rate.
    pub design_pressure: f64,
}

impl GrainRequest {
    pub fn outer_diameter(&self) -> f64 {
        self.chamber_diameter - 2.0 * self.liner_thickness
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrainGeometry {
    pub chamber_diameter: f64,
    pub liner_thickness: f64,
    pub outer_diameter: f64,
    pub core_diameter: f64,
    pub length: f64,
    pub port_ratio: f64,
    pub length_to_diameter: f64,
    pub erosive_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrainDesign {
    pub geometry: GrainGeometry,
    pub ballistics: BallisticsSummary,
    pub mass_flow_rate: f64,
    pub regression_rate: f64,
    pub required_burn_area: f64,
    /// Simulated minus target burn time.
    pub burn_time_residual: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Searches the core diameter whose simulated burn time matches the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainSizer {
    pub min_core_diameter: f64,
    pub web_margin: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub min_port_ratio: f64,
    pub erosive_length_to_diameter: f64,
    pub simulator: InternalBallisticsSimulator,
}

impl Default for GrainSizer {
    fn default() -> Self {
        GrainSizer {
            min_core_diameter: MIN_CORE_DIAMETER,
            web_margin: MIN_WEB_MARGIN,
            tolerance: BURN_TIME_TOLERANCE,
            max_iterations: GRAIN_SEARCH_ITERATIONS,
            min_port_ratio: MIN_PORT_RATIO,
            erosive_length_to_diameter: EROSIVE_LENGTH_TO_DIAMETER,
            simulator: InternalBallisticsSimulator::default(),
        }
    }
}

impl GrainSizer {
    /// Grain outer diameter, or the infeasible-geometry error when the liner
    /// leaves no room for a core search bracket.
    pub fn check_feasibility(
        &self,
        chamber_diameter: f64,
        liner_thickness: f64,
    ) -> Result<f64, DesignError> {
        let infeasible = |reason: String| DesignError::InfeasibleGeometry {
            chamber_diameter,
            liner_thickness,
            reason,
        };

        let outer_diameter = chamber_diameter - 2.0 * liner_thickness;
        if !(outer_diameter > 0.0) {
            return Err(infeasible(
                "liner thickness is at least the chamber radius".to_string(),
            ));
        }
        if !(outer_diameter - self.web_margin > self.min_core_diameter) {
            return Err(infeasible(format!(
                "grain outer diameter {:.1} mm is too small for the core search",
                outer_diameter * 1000.0
            )));
        }
        Ok(outer_diameter)
    }

    /// Long grains are always at risk; shorter ones only when the port is
    /// narrower than the minimum port-to-throat ratio.
    pub fn erosive_risk(&self, port_ratio: f64, length_to_diameter: f64) -> bool {
        length_to_diameter > self.erosive_length_to_diameter || port_ratio < self.min_port_ratio
    }

    /// Length of a grain holding `propellant_mass` around the given core.
    pub fn grain_length(
        outer_diameter: f64,
        core_diameter: f64,
        propellant_mass: f64,
        density: f64,
    ) -> f64 {
        let cross_section = (PI / 4.0 * (outer_diameter.powi(2) - core_diameter.powi(2)))
            .max(f64::MIN_POSITIVE);
        propellant_mass / (density * cross_section)
    }

    pub fn size(
        &self,
        request: &GrainRequest,
        propellant: &PropellantProperties,
    ) -> Result<GrainDesign, DesignError> {
        let outer_diameter =
            self.check_feasibility(request.chamber_diameter, request.liner_thickness)?;
        propellant.validate()?;
        if !(request.propellant_mass > 0.0) || !(request.target_burn_time > 0.0) {
            return Err(DesignError::PhysicsError(
                "grain sizing needs a positive propellant mass and burn time".to_string(),
            ));
        }

        let search = BisectionSearch::new(
            self.min_core_diameter,
            outer_diameter - self.web_margin,
            self.tolerance,
            self.max_iterations,
            Monotonicity::Decreasing,
        );

        let outcome = search.solve(request.target_burn_time, |core_diameter| {
            let grain = BatesGrain {
                outer_diameter,
                core_diameter,
                length: Self::grain_length(
                    outer_diameter,
                    core_diameter,
                    request.propellant_mass,
                    propellant.density,
                ),
            };
            let trace = self.simulator.simulate(
                &grain,
                propellant,
                request.throat_area,
                request.thrust_coefficient,
            )?;
            Ok::<_, DesignError>((trace.burn_time, (grain, trace.summary())))
        })?;

        let (grain, ballistics) = outcome.payload;
        info!(
            core_diameter = grain.core_diameter,
            burn_time = ballistics.burn_time,
            iterations = outcome.iterations,
            converged = outcome.converged,
            "grain search finished"
        );

        let port_ratio = circle_area(grain.core_diameter) / request.throat_area;
        let length_to_diameter = grain.length / outer_diameter;

        let mass_flow_rate = request.propellant_mass / request.target_burn_time;
        let regression_rate = propellant.burn_rate(request.design_pressure);
        let required_burn_area = mass_flow_rate / (propellant.density * regression_rate);

        Ok(GrainDesign {
            geometry: GrainGeometry {
                chamber_diameter: request.chamber_diameter,
                liner_thickness: request.liner_thickness,
                outer_diameter,
                core_diameter: grain.core_diameter,
                length: grain.length,
                port_ratio,
                length_to_diameter,
                erosive_risk: self.erosive_risk(port_ratio, length_to_diameter),
            },
            ballistics,
            mass_flow_rate,
            regression_rate,
            required_burn_area,
            burn_time_residual: outcome.residual,
            iterations: outcome.iterations,
            converged: outcome.converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn propellant() -> PropellantProperties {
        PropellantProperties::knsb()
            .with_density(1700.0)
            .with_characteristic_velocity(910.0)
    }

    fn request(target_burn_time: f64) -> GrainRequest {
        GrainRequest {
            chamber_diameter: 0.054,
            liner_thickness: 0.002,
            propellant_mass: 0.4,
            throat_area: 4.28e-5,
            thrust_coefficient: 1.367,
            target_burn_time,
            design_pressure: 1.845e6,
        }
    }

    #[test]
    fn test_reachable_burn_time_converges() {
        let design = GrainSizer::default().size(&request(1.2), &propellant()).unwrap();

        assert!(design.converged);
        assert!(design.burn_time_residual.abs() < 0.01);
        assert!((design.ballistics.burn_time - 1.2).abs() < 0.01);
        assert!(design.geometry.core_diameter > 0.005);
        assert!(design.geometry.core_diameter < 0.045);
    }

    #[test]
    fn test_geometry_follows_mass_conservation() {
        let design = GrainSizer::default().size(&request(1.2), &propellant()).unwrap();
        let geometry = design.geometry;

        assert_relative_eq!(geometry.outer_diameter, 0.050, epsilon = 1e-12);
        let volume = PI / 4.0
            * (geometry.outer_diameter.powi(2) - geometry.core_diameter.powi(2))
            * geometry.length;
        assert_relative_eq!(volume * 1700.0, 0.4, max_relative = 1e-9);
        assert_relative_eq!(
            geometry.length_to_diameter,
            geometry.length / geometry.outer_diameter,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            geometry.port_ratio,
            PI / 4.0 * geometry.core_diameter.powi(2) / 4.28e-5,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_unreachable_burn_time_returns_best_effort() {
        // A 50 mm grain around this throat cannot burn for 10 s.
        let design = GrainSizer::default().size(&request(10.0), &propellant()).unwrap();

        assert!(!design.converged);
        assert_eq!(design.iterations, 20);
        assert!(design.burn_time_residual < 0.0);
        assert!(design.geometry.core_diameter < 0.0051);
    }

    #[test]
    fn test_analytic_design_point() {
        let design = GrainSizer::default().size(&request(1.2), &propellant()).unwrap();
        let expected_rate = propellant().burn_rate(1.845e6);

        assert_relative_eq!(design.mass_flow_rate, 0.4 / 1.2, max_relative = 1e-12);
        assert_relative_eq!(design.regression_rate, expected_rate, max_relative = 1e-12);
        assert_relative_eq!(
            design.required_burn_area,
            (0.4 / 1.2) / (1700.0 * expected_rate),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_small_port_flags_erosive_risk() {
        let design = GrainSizer::default().size(&request(10.0), &propellant()).unwrap();
        assert!(design.geometry.port_ratio < 2.0);
        assert!(design.geometry.erosive_risk);
    }

    #[test]
    fn test_erosive_risk_rule() {
        let sizer = GrainSizer::default();

        assert!(sizer.erosive_risk(4.0, 7.0));
        assert!(sizer.erosive_risk(1.5, 3.0));
        assert!(!sizer.erosive_risk(2.5, 4.0));
        assert!(!sizer.erosive_risk(2.0, 6.0));
    }

    #[test]
    fn test_long_grain_flags_erosive_risk() {
        // 2 kg in a 50 mm grain is over 0.6 m long for any core in the bracket.
        let request = GrainRequest {
            propellant_mass: 2.0,
            ..request(1.2)
        };
        let design = GrainSizer::default().size(&request, &propellant()).unwrap();

        assert!(design.geometry.length_to_diameter > 6.0);
        assert!(design.geometry.erosive_risk);
    }

    #[test]
    fn test_short_grain_risk_follows_port_ratio() {
        let design = GrainSizer::default().size(&request(1.2), &propellant()).unwrap();
        let geometry = design.geometry;

        assert!(geometry.length_to_diameter < 6.0);
        assert_eq!(geometry.erosive_risk, geometry.port_ratio < 2.0);
    }

    #[test]
    fn test_liner_filling_chamber_is_infeasible() {
        for liner_thickness in [0.027, 0.030] {
            let request = GrainRequest {
                liner_thickness,
                ..request(1.2)
            };
            let result = GrainSizer::default().size(&request, &propellant());
            assert!(matches!(
                result,
                Err(DesignError::InfeasibleGeometry { .. })
            ));
        }
    }

    #[test]
    fn test_empty_core_bracket_is_infeasible() {
        let request = GrainRequest {
            chamber_diameter: 0.011,
            liner_thickness: 0.001,
            ..request(1.2)
        };
        assert!(matches!(
            GrainSizer::default().size(&request, &propellant()),
            Err(DesignError::InfeasibleGeometry { .. })
        ));
    }

    #[test]
    fn test_sizer_is_repeatable() {
        let sizer = GrainSizer::default();
        assert_eq!(
            sizer.size(&request(1.2), &propellant()).unwrap(),
            sizer.size(&request(1.2), &propellant()).unwrap()
        );
    }
}
