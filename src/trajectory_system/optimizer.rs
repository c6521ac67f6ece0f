use tracing::info;

use crate::constants::{
    APOGEE_TOLERANCE, THRUST_SEARCH_ITERATIONS, THRUST_SEARCH_MAX, THRUST_SEARCH_MIN,
};
use crate::errors::DesignError;
use crate::trajectory_system::flight::{FlightTrace, RocketConfiguration, TrajectoryIntegrator};
use crate::utils::bisection::{BisectionSearch, Monotonicity};

#[derive(Debug, Clone, PartialEq)]
pub struct ThrustSolution {
    pub average_thrust: f64,
    pub apogee: f64,
    /// Achieved apogee minus target apogee.
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
    pub trace: FlightTrace,
}

/// Finds the average thrust that carries a vehicle to a target apogee.
/// Relies on apogee growing monotonically with thrust.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustOptimizer {
    pub min_thrust: f64,
    pub max_thrust: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub integrator: TrajectoryIntegrator,
}

impl Default for ThrustOptimizer {
    fn default() -> Self {
        ThrustOptimizer {
            min_thrust: THRUST_SEARCH_MIN,
            max_thrust: THRUST_SEARCH_MAX,
            tolerance: APOGEE_TOLERANCE,
            max_iterations: THRUST_SEARCH_ITERATIONS,
            integrator: TrajectoryIntegrator::default(),
        }
    }
}

impl ThrustOptimizer {
    /// `vehicle.average_thrust` is ignored; every candidate thrust replaces it.
    pub fn optimize(
        &self,
        vehicle: &RocketConfiguration,
        target_apogee: f64,
    ) -> Result<ThrustSolution, DesignError> {
        let search = BisectionSearch::new(
            self.min_thrust,
            self.max_thrust,
            self.tolerance,
            self.max_iterations,
            Monotonicity::Increasing,
        );

        let outcome = search.solve(target_apogee, |thrust| {
            let trace = self.integrator.simulate(&vehicle.with_thrust(thrust))?;
            Ok::<_, DesignError>((trace.apogee(), trace))
        })?;

        info!(
            thrust = outcome.argument,
            apogee = outcome.response,
            iterations = outcome.iterations,
            converged = outcome.converged,
            "thrust search finished"
        );

        Ok(ThrustSolution {
            average_thrust: outcome.argument,
            apogee: outcome.response,
            residual: outcome.residual,
            iterations: outcome.iterations,
            converged: outcome.converged,
            trace: outcome.payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_vehicle() -> RocketConfiguration {
        RocketConfiguration::new(0.0, 3.05, 3.75, 0.400, 0.00264)
    }

    #[test]
    fn test_reference_vehicle_reaches_target() {
        let solution = ThrustOptimizer::default()
            .optimize(&reference_vehicle(), 295.0)
            .unwrap();

        assert!(solution.converged);
        assert!((solution.apogee - 295.0).abs() < 1.0);
        assert!(solution.average_thrust > 10.0 && solution.average_thrust < 1000.0);

        let check = TrajectoryIntegrator::default()
            .simulate(&reference_vehicle().with_thrust(solution.average_thrust))
            .unwrap();
        assert!((check.apogee() - 295.0).abs() < 1.0);
        assert_eq!(check, solution.trace);
    }

    #[test]
    fn test_unreachable_target_is_not_fatal() {
        let optimizer = ThrustOptimizer {
            max_thrust: 60.0,
            max_iterations: 8,
            ..ThrustOptimizer::default()
        };
        let solution = optimizer.optimize(&reference_vehicle(), 5_000.0).unwrap();

        assert!(!solution.converged);
        assert_eq!(solution.iterations, 8);
        assert!(solution.residual < 0.0);
        assert!(solution.average_thrust > 55.0);
    }

    #[test]
    fn test_optimizer_is_repeatable() {
        let optimizer = ThrustOptimizer::default();
        let first = optimizer.optimize(&reference_vehicle(), 295.0).unwrap();
        let second = optimizer.optimize(&reference_vehicle(), 295.0).unwrap();

        assert_eq!(first, second);
    }
}
