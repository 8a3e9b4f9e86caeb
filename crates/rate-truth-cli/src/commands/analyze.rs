use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use rate_truth_core::cash_flow::LoanParameters;
use rate_truth_core::rates::RateClaim;
use rate_truth_core::{analyze, AnalysisRequest, EnginePolicy};

use super::annualize::UnitArg;
use crate::input;

/// Arguments for reconciling an estimate with the extracted schedule
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// APR estimated from the advertisement, in percent
    #[arg(long, allow_hyphen_values = true)]
    pub ai_apr: Option<Decimal>,

    /// Nominal loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Amount withheld at disbursement
    #[arg(long)]
    pub fees: Option<Decimal>,

    /// Number of payment periods
    #[arg(long)]
    pub term: Option<Decimal>,

    /// Amount due each period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Payment periods per year
    #[arg(long, default_value_t = 12)]
    pub periods_per_year: u32,

    /// Advertised rate, in percent
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Period the advertised rate is quoted per
    #[arg(long, value_enum, default_value = "unknown")]
    pub unit: UnitArg,
}

pub fn run_analyze(args: AnalyzeArgs, policy: &EnginePolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AnalysisRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        let ai_estimated_apr = args
            .ai_apr
            .ok_or("--ai-apr is required (or provide --input)")?;

        let has_schedule = args.principal.is_some() || args.term.is_some() || args.payment.is_some();
        let extracted_params = has_schedule.then(|| LoanParameters {
            principal: args.principal,
            upfront_fees: args.fees,
            term: args.term,
            payment: args.payment,
            periods_per_year: args.periods_per_year,
        });

        AnalysisRequest {
            ai_estimated_apr,
            extracted_params,
            rate_claim: args.rate.map(|value| RateClaim::new(value, args.unit.into())),
        }
    };

    let output = analyze(&request, policy);
    Ok(serde_json::to_value(output)?)
}
