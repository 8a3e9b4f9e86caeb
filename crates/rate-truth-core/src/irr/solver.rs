use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::trace::{IterationLog, IterationObserver, IterationStep};
use crate::policy::SolverSettings;
use crate::time_value::npv_with_derivative;
use crate::types::{Money, Rate};
use crate::{RateTruthError, RateTruthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Converged,
    Diverged,
    Stalled,
    MaxIter,
}

/// The concrete reason the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    ResidualBelowTolerance,
    StepBelowTolerance,
    ZeroDerivative,
    /// The Newton step landed at or below -100% or beyond the divergence bound
    RateOutOfBounds { attempted: Rate },
    /// NPV or its derivative exceeded decimal range
    Overflow,
    IterationBudget { max_iterations: u32 },
}

impl Termination {
    pub fn status(&self) -> SolveStatus {
        match self {
            Termination::ResidualBelowTolerance | Termination::StepBelowTolerance => {
                SolveStatus::Converged
            }
            Termination::ZeroDerivative => SolveStatus::Stalled,
            Termination::RateOutOfBounds { .. } | Termination::Overflow => SolveStatus::Diverged,
            Termination::IterationBudget { .. } => SolveStatus::MaxIter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Last rate reached; the root when `status` is `Converged`
    pub periodic_rate: Rate,
    pub status: SolveStatus,
    pub termination: Termination,
    /// NPV evaluations performed
    pub iterations: u32,
}

impl IrrSolution {
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedSolution {
    #[serde(flatten)]
    pub solution: IrrSolution,
    pub trace: Vec<String>,
}

/// Newton-Raphson root finder for the periodic rate that zeroes NPV.
///
/// Stateless between calls: the same flows and settings always yield the
/// same solution and the same trace.
#[derive(Debug, Clone, Default)]
pub struct IrrSolver {
    settings: SolverSettings,
}

impl IrrSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn with_initial_guess(mut self, guess: Rate) -> Self {
        self.settings.initial_guess = guess;
        self
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solve without building a trace.
    pub fn solve(&self, flows: &[Money]) -> IrrSolution {
        self.solve_observed(flows, &mut ())
    }

    /// Solve and collect the human-readable iteration log.
    pub fn solve_traced(&self, flows: &[Money]) -> TracedSolution {
        let mut log = IterationLog::default();
        let solution = self.solve_observed(flows, &mut log);
        TracedSolution {
            solution,
            trace: log.into_lines(),
        }
    }

    /// [`solve_traced`](Self::solve_traced) for untrusted input: a schedule
    /// shorter than two flows is an error rather than a contract violation.
    pub fn try_solve_traced(&self, flows: &[Money]) -> RateTruthResult<TracedSolution> {
        if flows.len() < 2 {
            return Err(RateTruthError::InsufficientData(format!(
                "IRR requires at least 2 cash flows, got {}",
                flows.len()
            )));
        }
        Ok(self.solve_traced(flows))
    }

    /// Solve, reporting every step to `observer`.
    pub fn solve_observed<O>(&self, flows: &[Money], observer: &mut O) -> IrrSolution
    where
        O: IterationObserver + ?Sized,
    {
        debug_assert!(
            flows.len() >= 2,
            "IRR requires at least 2 cash flows, got {}",
            flows.len()
        );

        let SolverSettings {
            initial_guess,
            tolerance,
            max_iterations,
            divergence_bound,
            ..
        } = self.settings.clone();

        let mut rate = initial_guess;
        observer.start(rate);

        let mut iterations = 0;
        let (rate, termination) = loop {
            if iterations >= max_iterations {
                break (rate, Termination::IterationBudget { max_iterations });
            }
            iterations += 1;

            let Some((npv, derivative)) = npv_with_derivative(rate, flows) else {
                break (rate, Termination::Overflow);
            };
            observer.step(&IterationStep {
                iteration: iterations,
                rate,
                npv,
                derivative,
            });

            if npv.abs() < tolerance {
                break (rate, Termination::ResidualBelowTolerance);
            }
            if derivative.is_zero() {
                break (rate, Termination::ZeroDerivative);
            }

            let Some(next) = npv
                .checked_div(derivative)
                .and_then(|step| rate.checked_sub(step))
            else {
                break (rate, Termination::Overflow);
            };

            if next <= dec!(-1) || next.abs() > divergence_bound {
                break (rate, Termination::RateOutOfBounds { attempted: next });
            }
            if (next - rate).abs() < tolerance {
                break (next, Termination::StepBelowTolerance);
            }

            rate = next;
        };

        observer.finish(&termination, tolerance, rate);

        let status = termination.status();
        debug!(?status, iterations, %rate, "irr solve finished");

        IrrSolution {
            periodic_rate: rate,
            status,
            termination,
            iterations,
        }
    }
}

/// Convenience wrapper: solve with default settings and the given starting guess.
pub fn irr(flows: &[Money], guess: Rate) -> IrrSolution {
    IrrSolver::default().with_initial_guess(guess).solve(flows)
}
