use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cash_flow::LoanParameters;
use crate::policy::EnginePolicy;
use crate::rates::{Normalized, RateClaim, RateNormalizer};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::types::*;

#[cfg(feature = "risk")]
use crate::risk::{classify, RiskAssessment};

/// What the extraction step hands over for one advertisement.
///
/// Only the estimate is required. A schedule or rate claim that cannot be
/// read is treated as absent, so the analysis falls back to the estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// APR estimated by the vision model, in percent
    #[serde(alias = "aiEstimatedApr", alias = "realApr")]
    pub ai_estimated_apr: Percent,
    #[serde(default, alias = "extractedParams", deserialize_with = "lenient")]
    pub extracted_params: Option<LoanParameters>,
    /// Advertised rate, in whatever unit the lender chose
    #[serde(default, alias = "rateClaim", deserialize_with = "lenient")]
    pub rate_claim: Option<RateClaim>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutput {
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_rate: Option<Normalized>,
    #[cfg(feature = "risk")]
    pub risk: RiskAssessment,
}

/// Run the full pipeline for one advertisement: normalise the advertised rate,
/// cross-validate the estimate against the exact schedule, and grade the result.
///
/// Never fails. The policy is assumed to have passed [`EnginePolicy::validate`].
pub fn analyze(request: &AnalysisRequest, policy: &EnginePolicy) -> ComputationOutput<AnalysisOutput> {
    let start = Instant::now();

    let nominal_rate = request.rate_claim.as_ref().map(|claim| {
        RateNormalizer::new(policy.unit_inference.clone())
            .normalize(claim, Some(request.ai_estimated_apr))
    });

    let mut reconciliation = Reconciler::new(policy.clone())
        .reconcile(request.ai_estimated_apr, request.extracted_params.as_ref());

    if let Some(inference) = nominal_rate.as_ref().and_then(|n| n.inference) {
        reconciliation
            .calculation_details
            .push_note(&inference.to_string());
    }

    let warnings: Vec<String> = reconciliation
        .verification
        .warnings
        .iter()
        .map(ToString::to_string)
        .collect();

    #[cfg(feature = "risk")]
    let risk = classify(
        reconciliation.final_apr,
        nominal_rate.map(|n| n.annualized.value),
        &policy.risk_bands,
    );

    let methodology = if reconciliation.verification.is_verified() {
        "Exact IRR (Newton-Raphson) on the extracted schedule, annualized and cross-checked against the model estimate"
    } else {
        "Model estimate retained; no trustworthy schedule to verify against"
    };

    let output = AnalysisOutput {
        reconciliation,
        nominal_rate,
        #[cfg(feature = "risk")]
        risk,
    };

    with_metadata(methodology, policy, warnings, start, output)
}
