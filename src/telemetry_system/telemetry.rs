use std::fmt::{self, Write};

use crate::design::report::DesignReport;
use crate::trajectory_system::flight::FlightTrace;

/// Key figures of one flight trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub max_velocity: f64,
    pub max_altitude: f64,
    pub time_of_apogee: f64,
    pub flight_time: f64,
    pub landed: bool,
    pub samples: usize,
}

impl Telemetry {
    pub fn from_trace(trace: &FlightTrace) -> Self {
        let (max_altitude, time_of_apogee) = trace
            .apogee_sample()
            .map_or((0.0, 0.0), |sample| (sample.altitude, sample.time));

        Telemetry {
            max_velocity: trace.max_velocity(),
            max_altitude,
            time_of_apogee,
            flight_time: trace.flight_time(),
            landed: trace.landed(),
            samples: trace.samples.len(),
        }
    }

    fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    fn format_altitude(altitude: f64) -> String {
        if altitude >= 1000.0 {
            format!("{:.2} km", altitude / 1000.0)
        } else {
            format!("{:.2} m", altitude)
        }
    }

    fn format_length(meters: f64) -> String {
        format!("{:.2} mm", meters * 1000.0)
    }

    fn status(converged: bool) -> &'static str {
        if converged {
            "converged"
        } else {
            "not converged"
        }
    }

    /// Plain-text rendering of a design report.
    pub fn write_report<W: Write>(report: &DesignReport, out: &mut W) -> fmt::Result {
        let trajectory = &report.trajectory;
        let nozzle = &report.nozzle;
        let grain = &report.grain;
        let ballistics = &report.ballistics;
        let sizing = &report.sizing;

        writeln!(out, "--- Trajectory ---")?;
        writeln!(
            out,
            "Required Thrust: {:.2} N ({}, {} iterations)",
            trajectory.required_thrust,
            Self::status(trajectory.converged),
            trajectory.iterations
        )?;
        writeln!(
            out,
            "Apogee: {} (target {}, error {:+.2} m)",
            Self::format_altitude(trajectory.apogee),
            Self::format_altitude(trajectory.target_apogee),
            trajectory.apogee_error
        )?;
        writeln!(out, "Max Velocity: {:.2} m/s", trajectory.max_velocity)?;
        writeln!(
            out,
            "Time of Apogee: {}",
            Self::format_time(trajectory.time_of_apogee)
        )?;
        writeln!(
            out,
            "Flight Time: {}{}",
            Self::format_time(trajectory.flight_time),
            if trajectory.landed { "" } else { " (horizon reached)" }
        )?;
        writeln!(out, "Specific Impulse: {:.1} s", trajectory.specific_impulse)?;
        writeln!(out, "Mass Flow: {:.4} kg/s", trajectory.mass_flow_rate)?;
        writeln!(out, "Total Impulse: {:.1} N·s", trajectory.total_impulse)?;

        writeln!(out, "\n--- Nozzle ---")?;
        writeln!(out, "Throat Diameter: {}", Self::format_length(nozzle.throat_diameter))?;
        writeln!(out, "Exit Diameter: {}", Self::format_length(nozzle.exit_diameter))?;
        writeln!(out, "Exit Mach: {:.3}", nozzle.exit_mach)?;
        writeln!(
            out,
            "Thrust Coefficient: {:.4} (ideal {:.4})",
            nozzle.thrust_coefficient, nozzle.ideal_thrust_coefficient
        )?;
        writeln!(
            out,
            "Characteristic Velocity: {:.1} m/s",
            nozzle.characteristic_velocity
        )?;

        writeln!(out, "\n--- Grain ---")?;
        writeln!(out, "Outer Diameter: {}", Self::format_length(grain.outer_diameter))?;
        writeln!(out, "Core Diameter: {}", Self::format_length(grain.core_diameter))?;
        writeln!(out, "Length: {}", Self::format_length(grain.length))?;
        writeln!(out, "Port/Throat Ratio: {:.2}", grain.port_ratio)?;
        writeln!(out, "Length/Diameter: {:.2}", grain.length_to_diameter)?;
        writeln!(
            out,
            "Erosive Burning Risk: {}",
            if grain.erosive_risk { "yes" } else { "no" }
        )?;
        writeln!(
            out,
            "Required Burn Area: {:.2} cm²",
            sizing.required_burn_area * 1.0e4
        )?;
        writeln!(
            out,
            "Regression Rate: {:.2} mm/s",
            sizing.regression_rate * 1000.0
        )?;

        writeln!(out, "\n--- Ballistics ---")?;
        writeln!(
            out,
            "Burn Time: {} (target {}, {}, {} iterations)",
            Self::format_time(ballistics.burn_time),
            Self::format_time(sizing.target_burn_time),
            Self::status(sizing.converged),
            sizing.iterations
        )?;
        writeln!(
            out,
            "Peak Pressure: {:.3} MPa",
            ballistics.max_pressure / 1.0e6
        )?;
        writeln!(out, "Total Impulse: {:.1} N·s", ballistics.total_impulse)?;
        writeln!(out, "Average Thrust: {:.2} N", ballistics.average_thrust)?;

        if let Some(trace) = &report.trace {
            writeln!(out, "\n--- Flight Trace ---")?;
            for sample in &trace.samples {
                writeln!(
                    out,
                    "{:>8.3} s  {:>10.3} m  {:>9.3} m/s",
                    sample.time, sample.altitude, sample.velocity
                )?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for DesignReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Telemetry::write_report(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory_system::flight::{FlightSample, Termination};

    fn trace() -> FlightTrace {
        let samples = vec![
            FlightSample {
                time: 0.0,
                altitude: 0.0,
                velocity: 0.0,
            },
            FlightSample {
                time: 1.0,
                altitude: 40.0,
                velocity: 60.0,
            },
            FlightSample {
                time: 2.0,
                altitude: 90.0,
                velocity: 10.0,
            },
            FlightSample {
                time: 3.0,
                altitude: 70.0,
                velocity: -20.0,
            },
        ];
        FlightTrace {
            samples,
            termination: Termination::GroundImpact { time: 6.5 },
        }
    }

    #[test]
    fn test_reduction_over_trace() {
        let telemetry = Telemetry::from_trace(&trace());

        assert_eq!(telemetry.max_altitude, 90.0);
        assert_eq!(telemetry.time_of_apogee, 2.0);
        assert_eq!(telemetry.max_velocity, 60.0);
        assert_eq!(telemetry.flight_time, 6.5);
        assert!(telemetry.landed);
        assert_eq!(telemetry.samples, 4);
    }

    #[test]
    fn test_empty_trace() {
        let telemetry = Telemetry::from_trace(&FlightTrace {
            samples: Vec::new(),
            termination: Termination::Horizon { time: 300.0 },
        });

        assert_eq!(telemetry.max_altitude, 0.0);
        assert!(!telemetry.landed);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(Telemetry::format_time(3.456), "3.46s");
        assert_eq!(Telemetry::format_time(75.0), "1m 15.00s");
        assert_eq!(Telemetry::format_altitude(295.0), "295.00 m");
        assert_eq!(Telemetry::format_altitude(1500.0), "1.50 km");
        assert_eq!(Telemetry::format_length(0.0074), "7.40 mm");
    }
}
