use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;

use rate_truth_core::rates::{RateClaim, RateNormalizer, RateUnit};
use rate_truth_core::types::{with_metadata, Percent};
use rate_truth_core::EnginePolicy;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Day,
    Month,
    Year,
    Unknown,
}

impl From<UnitArg> for RateUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Day => RateUnit::Day,
            UnitArg::Month => RateUnit::Month,
            UnitArg::Year => RateUnit::Year,
            UnitArg::Unknown => RateUnit::Unknown,
        }
    }
}

#[derive(Deserialize)]
struct AnnualizeRequest {
    #[serde(flatten)]
    claim: RateClaim,
    #[serde(default, alias = "corroboratingApr", alias = "aiEstimatedApr")]
    corroborating_apr: Option<Percent>,
}

/// Arguments for annualizing an advertised rate
#[derive(Args)]
pub struct AnnualizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Advertised rate, in percent
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Period the rate is quoted per
    #[arg(long, value_enum, default_value = "unknown")]
    pub unit: UnitArg,

    /// Independent APR used to infer a missing unit
    #[arg(long)]
    pub corroborating_apr: Option<Decimal>,
}

pub fn run_annualize(args: AnnualizeArgs, policy: &EnginePolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let request: AnnualizeRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        AnnualizeRequest {
            claim: RateClaim::new(
                args.rate.ok_or("--rate is required (or provide --input)")?,
                args.unit.into(),
            ),
            corroborating_apr: args.corroborating_apr,
        }
    };

    let normalized = RateNormalizer::new(policy.unit_inference.clone())
        .normalize(&request.claim, request.corroborating_apr);

    let warnings: Vec<String> = normalized.inference.iter().map(ToString::to_string).collect();
    let methodology = match request.claim.unit {
        RateUnit::Unknown if request.corroborating_apr.is_some() => {
            "Simple annualization (day x365, month x12) with unit inferred from magnitude"
        }
        _ => "Simple annualization (day x365, month x12)",
    };

    let output = with_metadata(methodology, &policy.unit_inference, warnings, start, normalized);
    Ok(serde_json::to_value(output)?)
}
