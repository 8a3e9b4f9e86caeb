use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::solver::Termination;
use crate::types::{Money, Rate};

/// One Newton-Raphson evaluation, as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStep {
    /// 1-based
    pub iteration: u32,
    pub rate: Rate,
    pub npv: Money,
    pub derivative: Decimal,
}

/// Receives solver progress. Never influences control flow.
///
/// `()` is the no-op observer, used when only the numeric result is wanted.
pub trait IterationObserver {
    fn start(&mut self, _guess: Rate) {}
    fn step(&mut self, _step: &IterationStep) {}
    fn finish(&mut self, _termination: &Termination, _tolerance: Decimal, _rate: Rate) {}
}

impl IterationObserver for () {}

/// Human-readable iteration log for the audit trail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IterationLog {
    lines: Vec<String>,
}

impl IterationLog {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

fn pct(rate: Rate) -> Decimal {
    rate * dec!(100)
}

impl IterationObserver for IterationLog {
    fn start(&mut self, guess: Rate) {
        self.lines
            .push(format!("[INIT] Initial periodic rate guess: {:.4}%", pct(guess)));
    }

    fn step(&mut self, step: &IterationStep) {
        self.lines.push(format!(
            "[ITER {}] Rate: {:.6}% | NPV: {:.4} | f'(r): {:.2}",
            step.iteration,
            pct(step.rate),
            step.npv,
            step.derivative
        ));
    }

    fn finish(&mut self, termination: &Termination, tolerance: Decimal, rate: Rate) {
        let line = match termination {
            Termination::ResidualBelowTolerance => {
                format!("[DONE] |NPV| < {}, converged at {:.6}%.", tolerance.normalize(), pct(rate))
            }
            Termination::StepBelowTolerance => format!(
                "[DONE] Rate change < {}, converged at {:.6}%.",
                tolerance.normalize(),
                pct(rate)
            ),
            Termination::ZeroDerivative => {
                "[FAIL] Derivative is zero; no further progress possible.".to_string()
            }
            Termination::RateOutOfBounds { attempted } => format!(
                "[WARN] Next rate {:.4}% left the admissible range; result diverged.",
                pct(*attempted)
            ),
            Termination::Overflow => {
                "[WARN] NPV evaluation overflowed; result diverged.".to_string()
            }
            Termination::IterationBudget { max_iterations } => {
                format!("[STOP] Reached the iteration budget ({max_iterations}).")
            }
        };
        self.lines.push(line);
    }
}
