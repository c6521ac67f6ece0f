//! Adaptive Dormand-Prince 5(4) integrator with dense output on a uniform
//! grid and a single terminal event.
//!
//! The embedded 4th-order solution is used only for local error control;
//! the propagated solution is the 5th-order one (local extrapolation).
//! Between accepted steps the solution is interpolated with a cubic
//! Hermite polynomial built from the step end points and their
//! derivatives, which is what the output grid and the event locator use.

use thiserror::Error;

/// Right-hand side of `dy/dt = f(t, y)` for a fixed-size state.
pub trait OdeSystem<const N: usize> {
    fn derivative(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerances {
    pub fn new(relative: f64, absolute: f64) -> Self {
        Tolerances { relative, absolute }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDirection {
    Rising,
    Falling,
}

impl EventDirection {
    fn crossed(self, before: f64, after: f64) -> bool {
        let falling = (before > 0.0 && after <= 0.0) || (before >= 0.0 && after < 0.0);
        let rising = (before < 0.0 && after >= 0.0) || (before <= 0.0 && after > 0.0);
        match self {
            EventDirection::Falling => falling,
            EventDirection::Rising => rising,
        }
    }
}

/// Zero crossing of `function` in the configured direction stops the
/// integration at the crossing.
pub struct TerminalEvent<'a, const N: usize> {
    pub function: &'a dyn Fn(f64, &[f64; N]) -> f64,
    pub direction: EventDirection,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("step size underflow at t = {t} (h = {step})")]
    StepSizeUnderflow { t: f64, step: f64 },

    #[error("step budget of {max_steps} exhausted at t = {t}")]
    StepBudgetExhausted { t: f64, max_steps: usize },

    #[error("non-finite state at t = {0}")]
    NonFiniteState(f64),

    #[error("invalid integration span [{start}, {end}] with output step {output_step}")]
    InvalidSpan {
        start: f64,
        end: f64,
        output_step: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution<const N: usize> {
    pub times: Vec<f64>,
    pub states: Vec<[f64; N]>,
    /// Time of the terminal event, if one fired.
    pub event_time: Option<f64>,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

// Butcher tableau (Dormand & Prince, 1980).
const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];
// Difference between the 5th and 4th order weights.
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;
const EVENT_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DormandPrince {
    pub tolerances: Tolerances,
    pub max_step: f64,
    pub max_steps: usize,
}

impl DormandPrince {
    pub fn new(tolerances: Tolerances) -> Self {
        DormandPrince {
            tolerances,
            max_step: f64::INFINITY,
            max_steps: 1_000_000,
        }
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Integrates from `start` towards `end`, sampling the solution at
    /// `start + k * output_step` for every `k` with a sample time strictly
    /// below `end`. When the terminal event fires, sampling stops and the
    /// event point itself is appended as the final sample.
    pub fn integrate<S, const N: usize>(
        &self,
        system: &S,
        start: f64,
        initial: [f64; N],
        end: f64,
        output_step: f64,
        event: Option<&TerminalEvent<'_, N>>,
    ) -> Result<Solution<N>, IntegrationError>
    where
        S: OdeSystem<N>,
    {
        if !(end > start) || !(output_step > 0.0) {
            return Err(IntegrationError::InvalidSpan {
                start,
                end,
                output_step,
            });
        }

        let mut solution = Solution {
            times: Vec::new(),
            states: Vec::new(),
            event_time: None,
            accepted_steps: 0,
            rejected_steps: 0,
        };

        let mut t = start;
        let mut y = initial;
        let mut f = system.derivative(t, &y);
        let mut step = self.initial_step(system, t, &y, &f, end - start);
        let mut next_output = 0usize;
        let mut event_value = event.map(|e| (e.function)(t, &y));

        while t < end {
            if solution.accepted_steps + solution.rejected_steps >= self.max_steps {
                return Err(IntegrationError::StepBudgetExhausted {
                    t,
                    max_steps: self.max_steps,
                });
            }

            let min_step = 10.0 * f64::EPSILON * t.abs().max(1.0);
            step = step.min(self.max_step).min(end - t);
            if step < min_step {
                return Err(IntegrationError::StepSizeUnderflow { t, step });
            }

            let (y_new, f_new, error_norm) = self.attempt_step(system, t, &y, &f, step);
            if !error_norm.is_finite() || y_new.iter().any(|value| !value.is_finite()) {
                if step <= min_step {
                    return Err(IntegrationError::NonFiniteState(t));
                }
                solution.rejected_steps += 1;
                step *= MIN_FACTOR;
                continue;
            }

            if error_norm > 1.0 {
                solution.rejected_steps += 1;
                step *= (SAFETY * error_norm.powf(ERROR_EXPONENT)).max(MIN_FACTOR);
                continue;
            }

            solution.accepted_steps += 1;
            let t_new = if end - (t + step) <= min_step { end } else { t + step };
            let segment = HermiteSegment {
                t0: t,
                t1: t_new,
                y0: y,
                y1: y_new,
                f0: f,
                f1: f_new,
            };

            if let (Some(event), Some(before)) = (event, event_value) {
                let after = (event.function)(t_new, &y_new);
                if event.direction.crossed(before, after) {
                    let t_event = locate_event(&segment, event, before);
                    let y_event = segment.evaluate(t_event);
                    emit_samples(
                        &mut solution,
                        &segment,
                        start,
                        output_step,
                        &mut next_output,
                        t_event,
                    );
                    if solution.times.last().map_or(true, |&last| last < t_event) {
                        solution.times.push(t_event);
                        solution.states.push(y_event);
                    }
                    solution.event_time = Some(t_event);
                    return Ok(solution);
                }
                event_value = Some(after);
            }

            emit_samples(
                &mut solution,
                &segment,
                start,
                output_step,
                &mut next_output,
                end,
            );

            let factor = if error_norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * error_norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
            };
            t = t_new;
            y = y_new;
            f = f_new;
            step *= factor;
        }

        Ok(solution)
    }

    fn attempt_step<S, const N: usize>(
        &self,
        system: &S,
        t: f64,
        y: &[f64; N],
        f: &[f64; N],
        step: f64,
    ) -> ([f64; N], [f64; N], f64)
    where
        S: OdeSystem<N>,
    {
        let mut k = [[0.0; N]; 7];
        k[0] = *f;

        for stage in 1..7 {
            let mut y_stage = *y;
            for (i, value) in y_stage.iter_mut().enumerate() {
                let increment: f64 = (0..stage).map(|j| A[stage][j] * k[j][i]).sum();
                *value += step * increment;
            }
            k[stage] = system.derivative(t + C[stage] * step, &y_stage);
        }

        // The seventh stage is evaluated at the 5th-order solution (FSAL).
        let mut y_new = *y;
        for (i, value) in y_new.iter_mut().enumerate() {
            let increment: f64 = (0..6).map(|j| A[6][j] * k[j][i]).sum();
            *value += step * increment;
        }
        let f_new = k[6];

        let mut sum_squares = 0.0;
        for i in 0..N {
            let error: f64 = step * (0..7).map(|j| E[j] * k[j][i]).sum::<f64>();
            let scale = self.tolerances.absolute
                + self.tolerances.relative * y[i].abs().max(y_new[i].abs());
            sum_squares += (error / scale).powi(2);
        }

        (y_new, f_new, (sum_squares / N.max(1) as f64).sqrt())
    }

    // Hairer, Norsett & Wanner, "Solving ODEs I", section II.4.
    fn initial_step<S, const N: usize>(
        &self,
        system: &S,
        t: f64,
        y: &[f64; N],
        f: &[f64; N],
        span: f64,
    ) -> f64
    where
        S: OdeSystem<N>,
    {
        let scale: Vec<f64> = y
            .iter()
            .map(|value| self.tolerances.absolute + self.tolerances.relative * value.abs())
            .collect();
        let rms = |values: &[f64; N]| {
            (values
                .iter()
                .zip(&scale)
                .map(|(value, s)| (value / s).powi(2))
                .sum::<f64>()
                / N.max(1) as f64)
                .sqrt()
        };

        let d0 = rms(y);
        let d1 = rms(f);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        let h0 = h0.min(span);

        let mut y1 = *y;
        for (value, slope) in y1.iter_mut().zip(f) {
            *value += h0 * slope;
        }
        let f1 = system.derivative(t + h0, &y1);
        let mut difference = [0.0; N];
        for i in 0..N {
            difference[i] = f1[i] - f[i];
        }
        let d2 = rms(&difference) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };

        (100.0 * h0).min(h1).min(span).min(self.max_step)
    }
}

struct HermiteSegment<const N: usize> {
    t0: f64,
    t1: f64,
    y0: [f64; N],
    y1: [f64; N],
    f0: [f64; N],
    f1: [f64; N],
}

impl<const N: usize> HermiteSegment<N> {
    fn evaluate(&self, t: f64) -> [f64; N] {
        let h = self.t1 - self.t0;
        if h <= 0.0 {
            return self.y1;
        }
        let s = ((t - self.t0) / h).clamp(0.0, 1.0);
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        let mut y = [0.0; N];
        for i in 0..N {
            y[i] = h00 * self.y0[i]
                + h10 * h * self.f0[i]
                + h01 * self.y1[i]
                + h11 * h * self.f1[i];
        }
        y
    }
}

fn emit_samples<const N: usize>(
    solution: &mut Solution<N>,
    segment: &HermiteSegment<N>,
    start: f64,
    output_step: f64,
    next_output: &mut usize,
    limit: f64,
) {
    loop {
        let t_out = start + *next_output as f64 * output_step;
        if t_out > segment.t1 || t_out >= limit {
            break;
        }
        let state = if t_out <= segment.t0 {
            segment.y0
        } else {
            segment.evaluate(t_out)
        };
        solution.times.push(t_out);
        solution.states.push(state);
        *next_output += 1;
    }
}

/// Bisection on the interpolant; the bracket keeps the pre-crossing sign
/// at its lower end.
fn locate_event<const N: usize>(
    segment: &HermiteSegment<N>,
    event: &TerminalEvent<'_, N>,
    before: f64,
) -> f64 {
    let mut lower = segment.t0;
    let mut upper = segment.t1;
    let mut lower_value = before;

    for _ in 0..EVENT_ITERATIONS {
        if upper - lower <= 4.0 * f64::EPSILON * upper.abs().max(1.0) {
            break;
        }
        let middle = 0.5 * (lower + upper);
        let value = (event.function)(middle, &segment.evaluate(middle));
        if event.direction.crossed(lower_value, value) {
            upper = middle;
        } else {
            lower = middle;
            lower_value = value;
        }
    }

    upper
}
