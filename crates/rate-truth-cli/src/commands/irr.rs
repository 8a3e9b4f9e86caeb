use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use rate_truth_core::irr::{IrrSolver, TracedSolution};
use rate_truth_core::types::{with_metadata, Money, Percent, Rate};
use rate_truth_core::EnginePolicy;

use crate::input;

/// Request accepted from `--input` or stdin
#[derive(Deserialize)]
struct IrrRequest {
    #[serde(alias = "cashFlows", alias = "flows")]
    cash_flows: Vec<Money>,
    #[serde(default, alias = "initialGuess")]
    initial_guess: Option<Rate>,
    #[serde(default, alias = "periodsPerYear")]
    periods_per_year: Option<u32>,
}

#[derive(Serialize)]
struct IrrOutput {
    #[serde(flatten)]
    solution: TracedSolution,
    /// Nominal annual rate, present when periods per year were given and the solve converged
    #[serde(skip_serializing_if = "Option::is_none")]
    apr: Option<Percent>,
}

/// Arguments for solving a raw cash-flow list
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash flows, first at time 0 (comma-separated, e.g. "8500,-900,-900")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting periodic rate (0.10 = 10%)
    #[arg(long)]
    pub guess: Option<Decimal>,

    /// Annualize the solved rate with this many periods per year
    #[arg(long)]
    pub periods_per_year: Option<u32>,
}

pub fn run_irr(args: IrrArgs, policy: &EnginePolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let request: IrrRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        IrrRequest {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            initial_guess: args.guess,
            periods_per_year: args.periods_per_year,
        }
    };

    if request.periods_per_year == Some(0) {
        return Err("--periods-per-year must be positive".into());
    }

    let mut solver = IrrSolver::new(policy.solver.clone());
    if let Some(guess) = request.initial_guess {
        solver = solver.with_initial_guess(guess);
    }
    let solution = solver.try_solve_traced(&request.cash_flows)?;

    let apr = match request.periods_per_year {
        Some(ppy) if solution.solution.converged() => solution
            .solution
            .periodic_rate
            .checked_mul(Decimal::from(ppy) * dec!(100)),
        _ => None,
    };

    let warnings = if solution.solution.converged() {
        Vec::new()
    } else {
        vec![format!(
            "Solver stopped with status {:?}; the periodic rate is the last iterate, not a root",
            solution.solution.status
        )]
    };

    let output = with_metadata(
        "Newton-Raphson on NPV(r) = Σ CF_t / (1 + r)^t",
        &policy.solver,
        warnings,
        start,
        IrrOutput { solution, apr },
    );
    Ok(serde_json::to_value(output)?)
}
