//! Bracketed bisection on a monotonic response, shared by the thrust and
//! grain searches.

use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Monotonicity {
    /// The response grows with the argument.
    Increasing,
    /// The response shrinks as the argument grows.
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BisectionSearch {
    pub lower: f64,
    pub upper: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub monotonicity: Monotonicity,
}

/// Result of a search. `argument`, `response` and `payload` all belong to
/// one evaluated midpoint: the converged one, or on exhaustion the one with
/// the smallest residual. `iterations` counts every evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<T> {
    pub argument: f64,
    pub response: f64,
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
    pub payload: T,
}

impl BisectionSearch {
    pub fn new(
        lower: f64,
        upper: f64,
        tolerance: f64,
        max_iterations: usize,
        monotonicity: Monotonicity,
    ) -> Self {
        BisectionSearch {
            lower,
            upper,
            tolerance,
            max_iterations,
            monotonicity,
        }
    }

    /// Searches for the argument whose response matches `target`.
    ///
    /// `evaluate` returns the response and an arbitrary payload for one
    /// argument. Evaluation errors abort the search; exhausting the
    /// iteration budget does not.
    pub fn solve<T, E, F>(&self, target: f64, mut evaluate: F) -> Result<SearchOutcome<T>, E>
    where
        F: FnMut(f64) -> Result<(f64, T), E>,
    {
        let mut lower = self.lower;
        let mut upper = self.upper;
        let mut iterations = 0;
        let mut best: Option<SearchOutcome<T>> = None;

        loop {
            iterations += 1;
            let argument = 0.5 * (lower + upper);
            let (response, payload) = evaluate(argument)?;
            let residual = response - target;

            debug!(
                iteration = iterations,
                argument, response, residual, "bisection step"
            );

            let candidate = SearchOutcome {
                argument,
                response,
                residual,
                iterations,
                converged: false,
                payload,
            };
            if residual.abs() < self.tolerance {
                return Ok(SearchOutcome {
                    converged: true,
                    ..candidate
                });
            }

            // Earlier midpoints win ties.
            let closest = match best.take() {
                Some(previous) if previous.residual.abs() <= residual.abs() => previous,
                _ => candidate,
            };

            if iterations >= self.max_iterations.max(1) {
                warn!(
                    iterations,
                    argument = closest.argument,
                    residual = closest.residual,
                    "bisection budget exhausted, returning closest estimate"
                );
                return Ok(SearchOutcome {
                    iterations,
                    ..closest
                });
            }
            best = Some(closest);

            let overshoot = residual > 0.0;
            match (self.monotonicity, overshoot) {
                (Monotonicity::Increasing, true) | (Monotonicity::Decreasing, false) => {
                    upper = argument
                }
                (Monotonicity::Increasing, false) | (Monotonicity::Decreasing, true) => {
                    lower = argument
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::convert::Infallible;

    #[test]
    fn test_increasing_response() {
        let search = BisectionSearch::new(0.0, 10.0, 1e-9, 100, Monotonicity::Increasing);
        let outcome = search
            .solve(4.0, |x| Ok::<_, Infallible>((x * x, ())))
            .unwrap();

        assert!(outcome.converged);
        assert_abs_diff_eq!(outcome.argument, 2.0, epsilon = 1e-6);
        assert!(outcome.residual.abs() < 1e-9);
    }

    #[test]
    fn test_decreasing_response() {
        let search = BisectionSearch::new(0.1, 10.0, 1e-9, 100, Monotonicity::Decreasing);
        let outcome = search
            .solve(0.5, |x| Ok::<_, Infallible>((1.0 / x, x)))
            .unwrap();

        assert!(outcome.converged);
        assert_abs_diff_eq!(outcome.argument, 2.0, epsilon = 1e-6);
        assert_eq!(outcome.payload, outcome.argument);
    }

    #[test]
    fn test_exhaustion_returns_closest_estimate() {
        // Midpoints 0.5, 0.25, 0.375: the second lands nearest to 0.26.
        let search = BisectionSearch::new(0.0, 1.0, 1e-12, 3, Monotonicity::Increasing);
        let outcome = search
            .solve(0.26, |x| Ok::<_, Infallible>((x, x)))
            .unwrap();

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.argument, 0.25);
        assert_eq!(outcome.response, 0.25);
        assert_eq!(outcome.payload, 0.25);
        assert_abs_diff_eq!(outcome.residual, -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_exhaustion_on_unreachable_target() {
        let search = BisectionSearch::new(0.0, 1.0, 1e-12, 3, Monotonicity::Increasing);
        let mut evaluated = Vec::new();
        let outcome = search
            .solve(10.0, |x| {
                evaluated.push(x);
                Ok::<_, Infallible>((x, ()))
            })
            .unwrap();

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(evaluated, vec![0.5, 0.75, 0.875]);
        assert_eq!(outcome.argument, 0.875);
        assert_abs_diff_eq!(outcome.residual, 0.875 - 10.0);
    }

    #[test]
    fn test_evaluation_error_aborts() {
        let search = BisectionSearch::new(0.0, 1.0, 1e-6, 10, Monotonicity::Increasing);
        let result: Result<SearchOutcome<()>, String> =
            search.solve(0.5, |_| Err("boom".to_string()));

        assert_eq!(result.unwrap_err(), "boom");
    }
}
