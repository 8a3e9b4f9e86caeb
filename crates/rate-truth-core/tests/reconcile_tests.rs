use pretty_assertions::assert_eq;
use rate_truth_core::cash_flow::LoanParameters;
use rate_truth_core::irr::SolveStatus;
use rate_truth_core::policy::EnginePolicy;
use rate_truth_core::reconcile::{reconcile, EngineWarning, Method, Reconciler};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fee_ahead_loan() -> LoanParameters {
    LoanParameters::new(dec!(10000), dec!(1500), 12, dec!(900))
}

// ===========================================================================
// Upfront-fee scenario
// ===========================================================================

#[test]
fn test_upfront_fee_loan_is_verified_exactly() {
    let r = reconcile(dec!(27), Some(&fee_ahead_loan()));

    assert!(r.verification.is_verified());
    assert_eq!(
        r.verification.method,
        Method::Exact {
            correction_applied: true
        }
    );
    assert!(r.verification.warnings.is_empty());

    let exact = r.exact.as_ref().unwrap();
    assert_eq!(exact.status, SolveStatus::Converged);
    // periodic root ≈ 3.8915%, APR ≈ 46.70%
    assert!((exact.periodic_rate - dec!(0.038915)).abs() < dec!(0.00001));
    assert!(
        (r.final_apr - dec!(46.70)).abs() < dec!(0.02),
        "Expected ~46.70%, got {}",
        r.final_apr
    );

    // Naive (900 x 12 - 8500) / 8500 ≈ 27.06% understates the cost
    let naive = (dec!(900) * dec!(12) - dec!(8500)) / dec!(8500) * dec!(100);
    assert!(r.final_apr > naive + dec!(10));
    assert!((exact.flat_rate_apr.unwrap() - naive).abs() < dec!(0.01));
    assert!(exact.effective_annual_rate.unwrap() > r.final_apr);
}

#[test]
fn test_final_apr_is_rounded_to_policy_precision() {
    let r = reconcile(dec!(27), Some(&fee_ahead_loan()));
    assert!(r.final_apr.scale() <= 2);
    assert_eq!(r.exact.unwrap().variance, r.final_apr - dec!(27));
}

#[test]
fn test_trace_is_self_contained() {
    let r = reconcile(dec!(27), Some(&fee_ahead_loan()));
    let t = &r.calculation_details;
    assert_eq!(t.formula, "NPV = 8500 - Σ_{n=1..12} 900 / (1 + r)^n = 0");
    assert_eq!(t.cash_flow_sample, "T0: +8500\nT1 - T12: -900");
    assert!(t.iteration_log.first().unwrap().starts_with("[INIT]"));
    assert!(t.iteration_log.last().unwrap().starts_with("[DONE]"));
    assert!(t.explanation.contains("Net amount received: 8500"));
    assert!(t.explanation.contains("x 12 ="));
    assert!(t.explanation.contains("differs significantly"));
}

// ===========================================================================
// Sanity gate A: inconsistent schedule
// ===========================================================================

#[test]
fn test_repayment_below_disbursement_never_reaches_solver() {
    // 12 x 500 = 6000 < 10000 received
    let params = LoanParameters::new(dec!(10000), dec!(0), 12, dec!(500));
    let r = reconcile(dec!(18), Some(&params));

    assert_eq!(r.final_apr, dec!(18));
    assert!(!r.verification.is_verified());
    assert_eq!(r.verification.method, Method::Estimate);
    assert_eq!(
        r.verification.warnings,
        vec![EngineWarning::InconsistentSchedule {
            total_repayment: dec!(6000),
            net_disbursement: dec!(10000),
        }]
    );
    assert!(r.calculation_details.iteration_log.is_empty());
    assert!(r.exact.is_none());
}

#[test]
fn test_fees_count_against_disbursement_in_gate_a() {
    // 12 x 800 = 9600 ≥ 10000 - 1500, so the schedule is consistent
    let params = LoanParameters::new(dec!(10000), dec!(1500), 12, dec!(800));
    let r = reconcile(dec!(18), Some(&params));
    assert!(r.verification.is_verified());
}

// ===========================================================================
// Solver and band gates
// ===========================================================================

#[test]
fn test_non_convergence_retains_estimate_with_warning() {
    let mut policy = EnginePolicy::default();
    policy.solver.max_iterations = 1;
    policy.solver.seed_from_schedule = false;
    let r = Reconciler::new(policy).reconcile(dec!(30), Some(&fee_ahead_loan()));

    assert_eq!(r.final_apr, dec!(30));
    assert!(!r.verification.is_verified());
    match r.verification.warnings.as_slice() {
        [EngineWarning::SolverDidNotConverge { status, .. }] => {
            assert_eq!(*status, SolveStatus::MaxIter)
        }
        other => panic!("unexpected warnings: {other:?}"),
    }
}

#[test]
fn test_absurd_schedule_is_discarded() {
    // 1000 received, 12 x 1000 repaid: ~100% per month, ~1200% APR
    let params = LoanParameters::new(dec!(1000), dec!(0), 12, dec!(1000));
    let r = reconcile(dec!(400), Some(&params));
    assert_eq!(r.final_apr, dec!(400));
    assert!(!r.verification.is_verified());
    assert!(matches!(
        r.verification.warnings.as_slice(),
        [EngineWarning::ImplausibleApr { .. }]
    ));
}

#[test]
fn test_every_branch_yields_a_finite_apr() {
    let cases = vec![
        None,
        Some(LoanParameters::new(dec!(0), dec!(0), 12, dec!(100))),
        Some(LoanParameters::new(dec!(1000), dec!(0), 12, dec!(10))),
        Some(LoanParameters::new(dec!(1000), dec!(999.99), 1, dec!(100000))),
        Some(LoanParameters::new(dec!(1000), dec!(0), 1200, dec!(1))),
        Some(fee_ahead_loan()),
    ];
    for params in cases {
        let r = reconcile(dec!(20), params.as_ref());
        assert!(r.final_apr >= Decimal::ZERO);
        assert!(r.final_apr < dec!(1000));
    }
}

// ===========================================================================
// Policy knobs
// ===========================================================================

#[test]
fn test_strict_threshold_controls_correction_flag() {
    let exact = reconcile(dec!(0), Some(&fee_ahead_loan())).final_apr;

    let r = reconcile(exact + dec!(2), Some(&fee_ahead_loan()));
    assert!(r.verification.correction_applied());

    let mut lenient = EnginePolicy::default();
    lenient.correction_threshold = dec!(3);
    let r = Reconciler::new(lenient).reconcile(exact + dec!(2), Some(&fee_ahead_loan()));
    assert!(r.verification.is_verified());
    assert!(!r.verification.correction_applied());
}

#[test]
fn test_weekly_schedule_uses_periods_per_year() {
    let mut params = LoanParameters::new(dec!(1000), dec!(0), 52, dec!(20));
    params.periods_per_year = 52;
    let r = reconcile(dec!(10), Some(&params));
    let exact = r.exact.unwrap();
    assert_eq!(
        r.final_apr,
        (exact.periodic_rate * dec!(52) * dec!(100)).round_dp(2)
    );
}
