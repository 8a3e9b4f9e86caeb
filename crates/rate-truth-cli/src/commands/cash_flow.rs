use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use rate_truth_core::cash_flow::{self, CashFlow, LoanParameters};
use rate_truth_core::types::{with_metadata, Money, Rate};

use crate::input;

#[derive(Serialize)]
struct CashFlowOutput {
    #[serde(flatten)]
    cash_flow: CashFlow,
    term: u32,
    net_disbursement: Money,
    total_repayment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    flat_periodic_rate: Option<Rate>,
    schedule: String,
}

/// Arguments for building a loan's cash-flow schedule
#[derive(Args)]
pub struct CashFlowArgs {
    /// Path to JSON loan parameters (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

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
}

pub fn run_cash_flow(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let params: LoanParameters = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(params) = input::stdin::read_stdin()? {
        params
    } else {
        LoanParameters {
            principal: args.principal,
            upfront_fees: args.fees,
            term: args.term,
            payment: args.payment,
            periods_per_year: args.periods_per_year,
        }
    };

    let cash_flow = cash_flow::build(&params)
        .map_err(|reason| format!("loan parameters unusable: {reason}"))?;

    let mut warnings = Vec::new();
    if cash_flow.total_repayment() < cash_flow.net_disbursement() {
        warnings.push(format!(
            "Total repayment {} is below the net amount received {}",
            cash_flow.total_repayment().normalize(),
            cash_flow.net_disbursement().normalize()
        ));
    }

    let output = CashFlowOutput {
        term: cash_flow.term(),
        net_disbursement: cash_flow.net_disbursement(),
        total_repayment: cash_flow.total_repayment(),
        flat_periodic_rate: cash_flow.flat_periodic_rate(),
        schedule: cash_flow.describe(),
        cash_flow,
    };
    let output = with_metadata(
        "Equal-instalment schedule: net disbursement at T0, one payment per period",
        &params,
        warnings,
        start,
        output,
    );
    Ok(serde_json::to_value(output)?)
}
