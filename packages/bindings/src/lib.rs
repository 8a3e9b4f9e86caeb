use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use rate_truth_core::cash_flow::{self, CashFlow, LoanParameters, Unusable};
use rate_truth_core::irr::{IrrSolver, TracedSolution};
use rate_truth_core::rates::{Normalized, RateClaim, RateNormalizer};
use rate_truth_core::types::{Money, Percent, Rate};
use rate_truth_core::{analyze, AnalysisRequest, EnginePolicy};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional policy document; absent or empty means defaults.
fn parse_policy(policy_json: Option<String>) -> NapiResult<EnginePolicy> {
    match policy_json.as_deref().map(str::trim) {
        None | Some("") => Ok(EnginePolicy::default()),
        Some(json) => EnginePolicy::from_json(json).map_err(to_napi_error),
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Full pipeline for one advertisement. Throws only on malformed JSON.
#[napi]
pub fn analyze_offer(request_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let request: AnalysisRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let policy = parse_policy(policy_json)?;
    let output = analyze(&request, &policy);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolveIrrInput {
    #[serde(alias = "cash_flows")]
    cash_flows: Vec<Money>,
    #[serde(default, alias = "initial_guess")]
    initial_guess: Option<Rate>,
}

#[napi]
pub fn solve_irr(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: SolveIrrInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = parse_policy(policy_json)?;

    let mut solver = IrrSolver::new(policy.solver);
    if let Some(guess) = input.initial_guess {
        solver = solver.with_initial_guess(guess);
    }
    let solution: TracedSolution = solver
        .try_solve_traced(&input.cash_flows)
        .map_err(to_napi_error)?;
    serde_json::to_string(&solution).map_err(to_napi_error)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnualizeInput {
    #[serde(flatten)]
    claim: RateClaim,
    #[serde(default, alias = "corroborating_apr", alias = "aiEstimatedApr")]
    corroborating_apr: Option<Percent>,
}

#[napi]
pub fn annualize_rate(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: AnnualizeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = parse_policy(policy_json)?;
    let normalized: Normalized =
        RateNormalizer::new(policy.unit_inference).normalize(&input.claim, input.corroborating_apr);
    serde_json::to_string(&normalized).map_err(to_napi_error)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CashFlowReply {
    usable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cash_flow: Option<CashFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_repayment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flat_periodic_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<Unusable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Signed schedule for the given loan parameters. Unusable parameters are
/// reported in the reply rather than thrown.
#[napi]
pub fn build_cash_flow(params_json: String) -> NapiResult<String> {
    let params: LoanParameters = serde_json::from_str(&params_json).map_err(to_napi_error)?;
    let reply = match cash_flow::build(&params) {
        Ok(cf) => CashFlowReply {
            usable: true,
            total_repayment: Some(cf.total_repayment()),
            flat_periodic_rate: cf.flat_periodic_rate(),
            schedule: Some(cf.describe()),
            cash_flow: Some(cf),
            reason: None,
            message: None,
        },
        Err(reason) => CashFlowReply {
            usable: false,
            cash_flow: None,
            total_repayment: None,
            flat_periodic_rate: None,
            schedule: None,
            message: Some(reason.to_string()),
            reason: Some(reason),
        },
    };
    serde_json::to_string(&reply).map_err(to_napi_error)
}
