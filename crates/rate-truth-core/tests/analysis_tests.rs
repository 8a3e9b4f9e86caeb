use pretty_assertions::assert_eq;
use rate_truth_core::cash_flow::LoanParameters;
use rate_truth_core::rates::{RateClaim, RateUnit};
use rate_truth_core::{analyze, AnalysisOutput, AnalysisRequest, ComputationOutput, EnginePolicy};
use rust_decimal_macros::dec;

#[cfg(feature = "risk")]
use rate_truth_core::risk::RiskLevel;

fn payday_request() -> AnalysisRequest {
    AnalysisRequest {
        ai_estimated_apr: dec!(18),
        extracted_params: None,
        rate_claim: Some(RateClaim::new(dec!(0.05), RateUnit::Unknown)),
    }
}

// ===========================================================================
// Unit ambiguity
// ===========================================================================

#[test]
fn test_unitless_small_rate_is_read_as_daily() {
    let out = analyze(&payday_request(), &EnginePolicy::default());

    let nominal = out.result.nominal_rate.as_ref().unwrap();
    assert_eq!(nominal.annualized, RateClaim::yearly(dec!(18.25)));
    assert_eq!(nominal.inference.unwrap().inferred_unit, RateUnit::Day);

    let explanation = &out.result.reconciliation.calculation_details.explanation;
    assert!(explanation.contains("daily"));
    assert!(explanation.contains("18.25"));
    // the APR itself is still the estimate
    assert_eq!(out.result.reconciliation.final_apr, dec!(18));
}

#[test]
fn test_weak_corroboration_leaves_rate_alone() {
    let mut request = payday_request();
    request.ai_estimated_apr = dec!(4);
    let out = analyze(&request, &EnginePolicy::default());
    let nominal = out.result.nominal_rate.unwrap();
    assert_eq!(nominal.annualized, RateClaim::yearly(dec!(0.05)));
    assert!(nominal.inference.is_none());
}

// ===========================================================================
// Full pipeline
// ===========================================================================

#[test]
fn test_fee_loan_pipeline() {
    let request = AnalysisRequest {
        ai_estimated_apr: dec!(27),
        extracted_params: Some(LoanParameters::new(dec!(10000), dec!(1500), 12, dec!(900))),
        rate_claim: Some(RateClaim::new(dec!(1.5), RateUnit::Month)),
    };
    let out = analyze(&request, &EnginePolicy::default());

    assert!(out.result.reconciliation.verification.is_verified());
    assert!(out.warnings.is_empty());
    assert!(out.methodology.starts_with("Exact IRR"));
    assert_eq!(out.metadata.engine, "rate-truth-core");
}

#[cfg(feature = "risk")]
#[test]
fn test_understated_advertised_rate_is_flagged() {
    let request = AnalysisRequest {
        ai_estimated_apr: dec!(27),
        extracted_params: Some(LoanParameters::new(dec!(10000), dec!(1500), 12, dec!(900))),
        rate_claim: Some(RateClaim::new(dec!(1.5), RateUnit::Month)),
    };
    let out = analyze(&request, &EnginePolicy::default());
    // 18% advertised vs ~46.7% real
    assert_eq!(out.result.risk.level, RiskLevel::Scam);
    assert!(out.result.risk.misleading_advertising);
}

#[test]
fn test_inconsistent_schedule_surfaces_rendered_warning() {
    let request = AnalysisRequest {
        ai_estimated_apr: dec!(18),
        extracted_params: Some(LoanParameters::new(dec!(10000), dec!(0), 12, dec!(500))),
        rate_claim: None,
    };
    let out = analyze(&request, &EnginePolicy::default());
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].starts_with("Data inconsistency"));
    assert!(out.methodology.starts_with("Model estimate"));
}

// ===========================================================================
// Malformed collaborator payloads
// ===========================================================================

fn analyze_json(json: &str) -> ComputationOutput<AnalysisOutput> {
    let request: AnalysisRequest = serde_json::from_str(json).unwrap();
    analyze(&request, &EnginePolicy::default())
}

#[test]
fn test_non_numeric_principal_falls_back_to_estimate() {
    let out = analyze_json(
        r#"{"realApr": 24, "extractedParams": {"principal": "N/A", "term": 12, "payment": 900}}"#,
    );
    let r = &out.result.reconciliation;
    assert_eq!(r.final_apr, dec!(24));
    assert!(!r.verification.is_verified());
    assert!(r.verification.warnings.is_empty());
    assert!(r.calculation_details.explanation.contains("principal not provided"));
    assert_eq!(
        r.verification.extracted_params.as_ref().unwrap().payment,
        Some(dec!(900))
    );
}

#[test]
fn test_null_periods_per_year_uses_monthly_default() {
    let out = analyze_json(
        r#"{
            "realApr": 27,
            "extractedParams": {
                "principal": 10000, "upfrontFees": 1500, "term": 12, "payment": 900,
                "periodsPerYear": null
            }
        }"#,
    );
    let r = &out.result.reconciliation;
    assert!(r.verification.is_verified());
    assert_eq!(
        r.verification.extracted_params.as_ref().unwrap().periods_per_year,
        12
    );
    assert!((r.final_apr - dec!(46.70)).abs() < dec!(0.02));
}

#[test]
fn test_rate_claim_without_value_is_ignored() {
    let out = analyze_json(r#"{"realApr": 24, "rateClaim": {"unit": "DAY"}}"#);
    assert!(out.result.nominal_rate.is_none());
    assert_eq!(out.result.reconciliation.final_apr, dec!(24));
}

#[test]
fn test_missing_estimate_is_still_rejected() {
    let err = serde_json::from_str::<AnalysisRequest>(r#"{"extractedParams": {"principal": 1000}}"#);
    assert!(err.is_err());
    let err = serde_json::from_str::<AnalysisRequest>(r#"{"realApr": "high"}"#);
    assert!(err.is_err());
}

// ===========================================================================
// Output shape
// ===========================================================================

#[test]
fn test_json_envelope_shape() {
    let request: AnalysisRequest = serde_json::from_str(
        r#"{
            "aiEstimatedApr": 27,
            "extractedParams": {"principal": 10000, "upfrontFees": 1500, "term": 12, "payment": 900}
        }"#,
    )
    .unwrap();
    let out = analyze(&request, &EnginePolicy::default());
    let json = serde_json::to_value(&out).unwrap();

    let result = &json["result"];
    assert!(result["final_apr"].is_string());
    assert_eq!(result["verification"]["is_verified"], true);
    assert_eq!(result["verification"]["method"], "EXACT");
    assert_eq!(result["verification"]["correction_applied"], true);
    assert_eq!(result["verification"]["extracted_params"]["upfront_fees"], "1500");
    assert_eq!(result["exact"]["status"], "CONVERGED");
    assert!(result["calculation_details"]["iteration_log"].is_array());
    assert!(result.get("nominal_rate").is_none());
    assert_eq!(json["assumptions"]["apr_decimal_places"], 2);
    assert_eq!(json["metadata"]["precision"], "rust_decimal_128bit");
}

// ===========================================================================
// Independence
// ===========================================================================

#[test]
fn test_concurrent_analyses_do_not_interfere() {
    let policy = EnginePolicy::default();
    let requests: Vec<AnalysisRequest> = (0..8)
        .map(|i| AnalysisRequest {
            ai_estimated_apr: dec!(20),
            extracted_params: Some(LoanParameters::new(
                dec!(10000),
                dec!(100) * rust_decimal::Decimal::from(i),
                12,
                dec!(900),
            )),
            rate_claim: None,
        })
        .collect();

    let policy = &policy;
    let sequential: Vec<_> = requests
        .iter()
        .map(|r| analyze(r, policy).result.reconciliation.final_apr)
        .collect();

    let parallel: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = requests
            .iter()
            .map(|r| s.spawn(move || analyze(r, policy).result.reconciliation.final_apr))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
    // more upfront deduction, higher real cost
    assert!(sequential.windows(2).all(|w| w[0] < w[1]));
}
