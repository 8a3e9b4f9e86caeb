use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{info, warn};

use super::narrative::{self, CalculationTrace, ExactFigures};
use super::verification::{EngineWarning, VerificationRecord};
use crate::cash_flow::{self, CashFlow, LoanParameters};
use crate::irr::{IrrSolution, IrrSolver, IterationLog, SolveStatus};
use crate::policy::EnginePolicy;
use crate::time_value::effective_annual_rate;
use crate::types::{Percent, Rate};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Figures behind an accepted exact APR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactResult {
    pub periodic_rate: Rate,
    /// Unrounded periodic_rate x periods_per_year x 100
    pub apr: Percent,
    /// (1 + r)^periods_per_year - 1, in percent
    pub effective_annual_rate: Option<Percent>,
    /// Total charge over net received, annualized without amortisation
    pub flat_rate_apr: Option<Percent>,
    pub status: SolveStatus,
    pub iterations: u32,
    /// Rounded exact APR minus the estimate, in percentage points
    pub variance: Percent,
}

/// Result of cross-validating an estimate against the exact schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub final_apr: Percent,
    pub ai_estimated_apr: Percent,
    pub verification: VerificationRecord,
    pub calculation_details: CalculationTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<ExactResult>,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Decides whether the exact schedule result supersedes an external estimate.
///
/// Single pass, no retries. Every path yields a usable APR: the worst case is
/// the estimate retained with a warning.
#[derive(Debug, Clone)]
pub struct Reconciler {
    policy: EnginePolicy,
    collect_iteration_log: bool,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(EnginePolicy::default())
    }
}

impl Reconciler {
    pub fn new(policy: EnginePolicy) -> Self {
        Self {
            policy,
            collect_iteration_log: true,
        }
    }

    /// Skip building the solver's iteration log (the trace's `iteration_log` stays empty).
    pub fn without_iteration_log(mut self) -> Self {
        self.collect_iteration_log = false;
        self
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn reconcile(&self, ai_estimate: Percent, params: Option<&LoanParameters>) -> Reconciliation {
        let Some(params) = params else {
            return self.estimate_only(ai_estimate, None, None);
        };

        let cash_flow = match cash_flow::build(params) {
            Ok(cf) => cf,
            Err(reason) => {
                info!(%reason, "loan parameters unusable; keeping estimate");
                return self.estimate_only(ai_estimate, Some(params.clone()), Some(reason));
            }
        };

        // Repayment below the amount received means negative interest.
        let total_repayment = cash_flow.total_repayment();
        let net_disbursement = cash_flow.net_disbursement();
        if total_repayment < net_disbursement {
            let warning = EngineWarning::InconsistentSchedule {
                total_repayment,
                net_disbursement,
            };
            warn!(%total_repayment, %net_disbursement, "inconsistent schedule; solver skipped");
            return self.retained(
                ai_estimate,
                params,
                &cash_flow,
                Vec::new(),
                warning,
                "Verification was skipped because the schedule implies negative interest.",
            );
        }

        // The flat rate never exceeds the IRR of an equal-instalment schedule,
        // so a flat-rate APR at the band's upper limit is implausible without solving.
        let band = &self.policy.plausible_apr;
        let dp = self.policy.apr_decimal_places;
        if let Some(flat_apr) = flat_rate_apr(&cash_flow).filter(|a| a.round_dp(dp) >= band.max) {
            let warning = EngineWarning::ImplausibleApr {
                apr: flat_apr,
                min: band.min,
                max: band.max,
                from_flat_rate: true,
            };
            warn!(%flat_apr, "flat-rate APR already above plausible band; solver skipped");
            return self.retained(
                ai_estimate,
                params,
                &cash_flow,
                Vec::new(),
                warning,
                "Verification was skipped because even the flat-rate lower bound of the APR is implausibly high.",
            );
        }

        let (solution, iteration_log) = self.solve(&cash_flow);

        if !solution.converged() {
            let warning = EngineWarning::SolverDidNotConverge {
                status: solution.status,
                periodic_rate: solution.periodic_rate,
                iterations: solution.iterations,
            };
            warn!(status = ?solution.status, "solver did not converge; keeping estimate");
            return self.retained(
                ai_estimate,
                params,
                &cash_flow,
                iteration_log,
                warning,
                "The exact rate could not be solved reliably.",
            );
        }

        let periods_per_year = Decimal::from(cash_flow.periods_per_year());
        let exact_apr = solution.periodic_rate * periods_per_year * dec!(100);

        // Plausible band, judged at display precision so a root of
        // -1e-15 on an interest-free schedule still reads as 0%.
        if !band.contains(exact_apr.round_dp(dp)) {
            let warning = EngineWarning::ImplausibleApr {
                apr: exact_apr,
                min: band.min,
                max: band.max,
                from_flat_rate: false,
            };
            warn!(%exact_apr, "solved APR outside plausible band; keeping estimate");
            return self.retained(
                ai_estimate,
                params,
                &cash_flow,
                iteration_log,
                warning,
                "The solved rate fell outside the plausible range and was discarded.",
            );
        }

        self.accept(ai_estimate, params, &cash_flow, &solution, exact_apr, iteration_log)
    }

    fn solve(&self, cash_flow: &CashFlow) -> (IrrSolution, Vec<String>) {
        let settings = &self.policy.solver;
        let mut solver = IrrSolver::new(settings.clone());
        if settings.seed_from_schedule {
            if let Some(seed) = cash_flow
                .flat_periodic_rate()
                .filter(|r| *r > dec!(-1) && r.abs() <= settings.divergence_bound)
            {
                solver = solver.with_initial_guess(seed);
            }
        }
        if self.collect_iteration_log {
            let mut log = IterationLog::default();
            let solution = solver.solve_observed(cash_flow.flows(), &mut log);
            (solution, log.into_lines())
        } else {
            (solver.solve(cash_flow.flows()), Vec::new())
        }
    }

    fn accept(
        &self,
        ai_estimate: Percent,
        params: &LoanParameters,
        cash_flow: &CashFlow,
        solution: &IrrSolution,
        exact_apr: Percent,
        iteration_log: Vec<String>,
    ) -> Reconciliation {
        let final_apr = exact_apr.round_dp(self.policy.apr_decimal_places);
        let variance = final_apr - ai_estimate;
        let correction_applied = variance.abs() > self.policy.correction_threshold;

        let ppy = cash_flow.periods_per_year();
        let ear = effective_annual_rate(solution.periodic_rate, ppy)
            .and_then(|r| r.checked_mul(dec!(100)));
        let flat_rate_apr = flat_rate_apr(cash_flow);

        info!(%final_apr, %ai_estimate, correction_applied, "exact APR supersedes estimate");

        let note = narrative::variance_note(
            final_apr,
            ai_estimate,
            self.policy.correction_threshold,
            self.policy.significant_divergence,
            cash_flow,
        );
        let trace = narrative::exact(
            cash_flow,
            &ExactFigures {
                periodic_rate: solution.periodic_rate,
                final_apr,
                effective_annual_rate: ear,
                flat_rate_apr,
                iterations: solution.iterations,
            },
            iteration_log,
            Some(note),
        );

        Reconciliation {
            final_apr,
            ai_estimated_apr: ai_estimate,
            verification: VerificationRecord::exact(params.clone(), correction_applied),
            calculation_details: trace,
            exact: Some(ExactResult {
                periodic_rate: solution.periodic_rate,
                apr: exact_apr,
                effective_annual_rate: ear,
                flat_rate_apr,
                status: solution.status,
                iterations: solution.iterations,
                variance,
            }),
        }
    }

    fn estimate_only(
        &self,
        ai_estimate: Percent,
        params: Option<LoanParameters>,
        reason: Option<cash_flow::Unusable>,
    ) -> Reconciliation {
        Reconciliation {
            final_apr: ai_estimate,
            ai_estimated_apr: ai_estimate,
            verification: VerificationRecord::estimate(params, Vec::new()),
            calculation_details: narrative::estimate_only(ai_estimate, reason),
            exact: None,
        }
    }

    fn retained(
        &self,
        ai_estimate: Percent,
        params: &LoanParameters,
        cash_flow: &CashFlow,
        iteration_log: Vec<String>,
        warning: EngineWarning,
        reason: &str,
    ) -> Reconciliation {
        Reconciliation {
            final_apr: ai_estimate,
            ai_estimated_apr: ai_estimate,
            calculation_details: narrative::estimate_retained(
                ai_estimate,
                cash_flow,
                iteration_log,
                reason,
            ),
            verification: VerificationRecord::estimate(Some(params.clone()), vec![warning]),
            exact: None,
        }
    }
}

/// Naive flat-rate figure annualized like the exact APR, in percent.
fn flat_rate_apr(cash_flow: &CashFlow) -> Option<Percent> {
    cash_flow
        .flat_periodic_rate()
        .and_then(|r| r.checked_mul(Decimal::from(cash_flow.periods_per_year()) * dec!(100)))
}

/// Reconcile under the default policy.
pub fn reconcile(ai_estimate: Percent, params: Option<&LoanParameters>) -> Reconciliation {
    Reconciler::default().reconcile(ai_estimate, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::Method;

    #[test]
    fn test_no_params_keeps_estimate_silently() {
        let r = reconcile(dec!(24), None);
        assert_eq!(r.final_apr, dec!(24));
        assert_eq!(r.verification.method, Method::Estimate);
        assert!(r.verification.warnings.is_empty());
        assert!(r.exact.is_none());
    }

    #[test]
    fn test_unusable_params_keep_estimate_silently() {
        let mut params = LoanParameters::new(dec!(10000), dec!(0), 12, dec!(900));
        params.term = None;
        let r = reconcile(dec!(24), Some(&params));
        assert_eq!(r.final_apr, dec!(24));
        assert!(!r.verification.is_verified());
        assert!(r.verification.warnings.is_empty());
        assert!(r.calculation_details.explanation.contains("term not provided"));
    }

    #[test]
    fn test_zero_interest_schedule_is_verified_at_zero() {
        let params = LoanParameters::new(dec!(1200), dec!(0), 12, dec!(100));
        let r = reconcile(dec!(5), Some(&params));
        assert!(r.verification.is_verified());
        assert_eq!(r.final_apr, dec!(0));
        assert!(r.verification.correction_applied());
    }

    #[test]
    fn test_small_gap_is_not_a_correction() {
        let params = LoanParameters::new(dec!(10000), dec!(1500), 12, dec!(900));
        let exact = reconcile(dec!(0), Some(&params)).final_apr;
        let r = reconcile(exact - dec!(0.5), Some(&params));
        assert_eq!(
            r.verification.method,
            Method::Exact {
                correction_applied: false
            }
        );
        assert!(r.calculation_details.explanation.contains("agrees"));
    }

    #[test]
    fn test_implausible_band_keeps_estimate() {
        let mut policy = EnginePolicy::default();
        // flat-rate APR 27.06 is inside, exact 46.70 is not
        policy.plausible_apr.max = dec!(40);
        let params = LoanParameters::new(dec!(10000), dec!(1500), 12, dec!(900));
        let r = Reconciler::new(policy).reconcile(dec!(30), Some(&params));
        assert_eq!(r.final_apr, dec!(30));
        assert!(matches!(
            r.verification.warnings.as_slice(),
            [EngineWarning::ImplausibleApr {
                from_flat_rate: false,
                ..
            }]
        ));
        // the solver ran, so its log stays in the audit trail
        assert!(!r.calculation_details.iteration_log.is_empty());
    }

    #[test]
    fn test_flat_rate_above_band_skips_solver() {
        // 1000 received, 150000 repaid one month later
        let params = LoanParameters::new(dec!(1000), dec!(0), 1, dec!(150000));
        let r = reconcile(dec!(500), Some(&params));
        assert_eq!(r.final_apr, dec!(500));
        assert!(r.calculation_details.iteration_log.is_empty());
        match r.verification.warnings.as_slice() {
            [EngineWarning::ImplausibleApr {
                apr,
                from_flat_rate: true,
                ..
            }] => assert_eq!(*apr, dec!(178800)),
            other => panic!("unexpected warnings: {other:?}"),
        }
    }

    #[test]
    fn test_iteration_log_can_be_skipped() {
        let params = LoanParameters::new(dec!(10000), dec!(1500), 12, dec!(900));
        let with_log = Reconciler::default().reconcile(dec!(30), Some(&params));
        let without = Reconciler::default()
            .without_iteration_log()
            .reconcile(dec!(30), Some(&params));
        assert!(without.calculation_details.iteration_log.is_empty());
        assert_eq!(with_log.final_apr, without.final_apr);
    }
}
