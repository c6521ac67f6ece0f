use serde::Serialize;

use crate::constants::{
    FLIGHT_ABSOLUTE_TOLERANCE, FLIGHT_HORIZON, FLIGHT_OUTPUT_STEP, FLIGHT_RELATIVE_TOLERANCE,
    STANDARD_GRAVITY,
};
use crate::errors::DesignError;
use crate::trajectory_system::atmosphere::AtmosphereModel;
use crate::trajectory_system::integrator::{
    DormandPrince, EventDirection, OdeSystem, TerminalEvent, Tolerances,
};

/// Vertical-flight vehicle with a constant-thrust, linearly draining motor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocketConfiguration {
    pub average_thrust: f64,
    pub burn_time: f64,
    pub initial_mass: f64,
    pub propellant_mass: f64,
    pub drag_area: f64,
}

impl RocketConfiguration {
    pub fn new(
        average_thrust: f64,
        burn_time: f64,
        initial_mass: f64,
        propellant_mass: f64,
        drag_area: f64,
    ) -> Self {
        RocketConfiguration {
            average_thrust,
            burn_time,
            initial_mass,
            propellant_mass,
            drag_area,
        }
    }

    pub fn with_thrust(&self, average_thrust: f64) -> Self {
        RocketConfiguration {
            average_thrust,
            ..*self
        }
    }

    pub fn mass_flow_rate(&self) -> f64 {
        self.propellant_mass / self.burn_time
    }

    pub fn mass_at(&self, time: f64) -> f64 {
        if time <= self.burn_time {
            self.initial_mass - self.mass_flow_rate() * time
        } else {
            self.initial_mass - self.propellant_mass
        }
    }

    pub fn thrust_at(&self, time: f64) -> f64 {
        if time <= self.burn_time {
            self.average_thrust
        } else {
            0.0
        }
    }

    pub fn total_impulse(&self) -> f64 {
        self.average_thrust * self.burn_time
    }

    pub fn specific_impulse(&self) -> f64 {
        self.average_thrust / (self.mass_flow_rate() * STANDARD_GRAVITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlightSample {
    pub time: f64,
    pub altitude: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    GroundImpact { time: f64 },
    Horizon { time: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightTrace {
    pub samples: Vec<FlightSample>,
    pub termination: Termination,
}

impl FlightTrace {
    /// Highest sampled altitude, zero for an empty trace.
    pub fn apogee(&self) -> f64 {
        self.apogee_sample().map_or(0.0, |sample| sample.altitude)
    }

    pub fn apogee_sample(&self) -> Option<&FlightSample> {
        self.samples
            .iter()
            .max_by(|a, b| a.altitude.total_cmp(&b.altitude))
    }

    pub fn max_velocity(&self) -> f64 {
        self.samples
            .iter()
            .map(|sample| sample.velocity)
            .fold(0.0, f64::max)
    }

    pub fn flight_time(&self) -> f64 {
        match self.termination {
            Termination::GroundImpact { time } | Termination::Horizon { time } => time,
        }
    }

    pub fn landed(&self) -> bool {
        matches!(self.termination, Termination::GroundImpact { .. })
    }
}

struct FlightDynamics<'a> {
    rocket: &'a RocketConfiguration,
    atmosphere: AtmosphereModel,
}

impl OdeSystem<2> for FlightDynamics<'_> {
    fn derivative(&self, t: f64, y: &[f64; 2]) -> [f64; 2] {
        let [altitude, velocity] = *y;
        if altitude < 0.0 {
            return [0.0, 0.0];
        }

        let mass = self.rocket.mass_at(t);
        let thrust = self.rocket.thrust_at(t);
        let density = self.atmosphere.density(altitude);
        // v * |v| keeps drag opposed to motion and zero at rest.
        let drag = 0.5 * density * self.rocket.drag_area * velocity * velocity.abs();
        let net_force = thrust - drag - mass * STANDARD_GRAVITY;

        [velocity, net_force / mass]
    }
}

/// Integrates a vertical flight from the pad until ground impact or the
/// simulation horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryIntegrator {
    pub horizon: f64,
    pub output_step: f64,
    pub tolerances: Tolerances,
    pub atmosphere: AtmosphereModel,
}

impl Default for TrajectoryIntegrator {
    fn default() -> Self {
        TrajectoryIntegrator {
            horizon: FLIGHT_HORIZON,
            output_step: FLIGHT_OUTPUT_STEP,
            tolerances: Tolerances::new(FLIGHT_RELATIVE_TOLERANCE, FLIGHT_ABSOLUTE_TOLERANCE),
            atmosphere: AtmosphereModel::new(),
        }
    }
}

impl TrajectoryIntegrator {
    pub fn simulate(&self, rocket: &RocketConfiguration) -> Result<FlightTrace, DesignError> {
        if !(rocket.burn_time > 0.0) || !(rocket.initial_mass > rocket.propellant_mass) {
            return Err(DesignError::PhysicsError(format!(
                "rocket needs a positive burn time and dry mass (burn time {} s, initial mass {} kg, propellant {} kg)",
                rocket.burn_time, rocket.initial_mass, rocket.propellant_mass
            )));
        }

        let dynamics = FlightDynamics {
            rocket,
            atmosphere: self.atmosphere,
        };
        let altitude = |_t: f64, y: &[f64; 2]| y[0];
        let ground_impact = TerminalEvent {
            function: &altitude,
            direction: EventDirection::Falling,
        };

        let solution = DormandPrince::new(self.tolerances).integrate(
            &dynamics,
            0.0,
            [0.0, 0.0],
            self.horizon,
            self.output_step,
            Some(&ground_impact),
        )?;

        let termination = match solution.event_time {
            Some(time) => Termination::GroundImpact { time },
            None => Termination::Horizon { time: self.horizon },
        };
        let samples = solution
            .times
            .iter()
            .zip(&solution.states)
            .map(|(&time, state)| FlightSample {
                time,
                altitude: state[0],
                velocity: state[1],
            })
            .collect();

        Ok(FlightTrace {
            samples,
            termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_rocket(thrust: f64) -> RocketConfiguration {
        RocketConfiguration::new(thrust, 3.05, 3.75, 0.400, 0.00264)
    }

    #[test]
    fn test_mass_and_thrust_schedule() {
        let rocket = reference_rocket(100.0);

        assert_relative_eq!(rocket.mass_at(0.0), 3.75);
        assert_relative_eq!(rocket.mass_at(3.05), 3.35, epsilon = 1e-12);
        assert_relative_eq!(rocket.mass_at(10.0), 3.35, epsilon = 1e-12);
        assert_eq!(rocket.thrust_at(3.05), 100.0);
        assert_eq!(rocket.thrust_at(3.06), 0.0);
    }

    #[test]
    fn test_below_ground_derivative_is_clamped() {
        let rocket = reference_rocket(100.0);
        let dynamics = FlightDynamics {
            rocket: &rocket,
            atmosphere: AtmosphereModel::new(),
        };

        assert_eq!(dynamics.derivative(1.0, &[-0.1, -5.0]), [0.0, 0.0]);
    }

    #[test]
    fn test_drag_is_zero_at_rest() {
        let rocket = reference_rocket(0.0);
        let dynamics = FlightDynamics {
            rocket: &rocket,
            atmosphere: AtmosphereModel::new(),
        };

        let [_, acceleration] = dynamics.derivative(5.0, &[100.0, 0.0]);
        assert_relative_eq!(acceleration, -STANDARD_GRAVITY, epsilon = 1e-12);
    }

    #[test]
    fn test_drag_opposes_motion() {
        let rocket = reference_rocket(0.0);
        let dynamics = FlightDynamics {
            rocket: &rocket,
            atmosphere: AtmosphereModel::new(),
        };

        let [_, rising] = dynamics.derivative(5.0, &[100.0, 50.0]);
        let [_, falling] = dynamics.derivative(5.0, &[100.0, -50.0]);
        assert!(rising < -STANDARD_GRAVITY);
        assert!(falling > -STANDARD_GRAVITY);
    }

    #[test]
    fn test_flight_lands_on_the_ground() {
        let trace = TrajectoryIntegrator::default()
            .simulate(&reference_rocket(110.0))
            .unwrap();

        assert!(trace.landed());
        let last = trace.samples.last().unwrap();
        assert!(last.altitude.abs() < 1e-6);
        assert!(last.velocity < 0.0);
        assert!(trace.apogee() > 100.0);
        assert_eq!(trace.samples[0].time, 0.0);
        assert_eq!(trace.samples[0].altitude, 0.0);
    }

    #[test]
    fn test_grid_spacing_is_uniform() {
        let trace = TrajectoryIntegrator::default()
            .simulate(&reference_rocket(110.0))
            .unwrap();

        let grid = &trace.samples[..trace.samples.len() - 1];
        for (index, sample) in grid.iter().enumerate() {
            assert_relative_eq!(sample.time, index as f64 * 0.05, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_underpowered_rocket_never_leaves_the_pad() {
        let trace = TrajectoryIntegrator::default()
            .simulate(&reference_rocket(10.0))
            .unwrap();

        assert!(trace.landed());
        assert!(trace.flight_time() < 0.05);
        assert!(trace.apogee() < 1e-6);
    }

    #[test]
    fn test_apogee_increases_with_thrust() {
        let integrator = TrajectoryIntegrator::default();
        let apogees: Vec<f64> = [60.0, 80.0, 100.0, 120.0, 200.0, 400.0]
            .iter()
            .map(|&thrust| integrator.simulate(&reference_rocket(thrust)).unwrap().apogee())
            .collect();

        for pair in apogees.windows(2) {
            assert!(pair[1] > pair[0], "apogee not increasing: {:?}", apogees);
        }
    }

    #[test]
    fn test_simulation_is_repeatable() {
        let integrator = TrajectoryIntegrator::default();
        let first = integrator.simulate(&reference_rocket(150.0)).unwrap();
        let second = integrator.simulate(&reference_rocket(150.0)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_mass_is_rejected() {
        let rocket = RocketConfiguration::new(100.0, 3.0, 0.3, 0.4, 0.001);
        assert!(TrajectoryIntegrator::default().simulate(&rocket).is_err());
    }
}
