use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cash_flow::{CashFlow, Unusable};
use crate::types::{Percent, Rate};

/// Audit trail rendered verbatim next to the final APR. Descriptive only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculationTrace {
    pub formula: String,
    pub cash_flow_sample: String,
    pub iteration_log: Vec<String>,
    pub explanation: String,
}

impl CalculationTrace {
    /// Append a paragraph to the explanation.
    pub fn push_note(&mut self, note: &str) {
        if !self.explanation.is_empty() {
            self.explanation.push_str("\n\n");
        }
        self.explanation.push_str(note);
    }
}

const ESTIMATE_FORMULA: &str = "Estimated by the analysis model; not algorithmically verified";

/// Trace for the "estimate only" outcome when no usable schedule exists.
pub(crate) fn estimate_only(estimate: Percent, reason: Option<Unusable>) -> CalculationTrace {
    let why = match reason {
        Some(r) => format!("The extracted loan parameters could not be used ({r})."),
        None => "No loan parameters were extracted.".to_string(),
    };
    CalculationTrace {
        formula: ESTIMATE_FORMULA.to_string(),
        cash_flow_sample: "N/A".to_string(),
        iteration_log: Vec::new(),
        explanation: format!(
            "{why} The APR of {}% is the model's estimate from the advertised terms.",
            estimate.normalize()
        ),
    }
}

/// Trace for a schedule that was built but whose exact result was not trusted.
pub(crate) fn estimate_retained(
    estimate: Percent,
    cash_flow: &CashFlow,
    iteration_log: Vec<String>,
    reason: &str,
) -> CalculationTrace {
    CalculationTrace {
        formula: ESTIMATE_FORMULA.to_string(),
        cash_flow_sample: cash_flow.describe(),
        iteration_log,
        explanation: format!(
            "{}\n\n{reason} The APR of {}% is the model's estimate.",
            extraction_section(cash_flow),
            estimate.normalize()
        ),
    }
}

/// Numbers behind an accepted exact result.
pub(crate) struct ExactFigures {
    pub periodic_rate: Rate,
    pub final_apr: Percent,
    pub effective_annual_rate: Option<Percent>,
    pub flat_rate_apr: Option<Percent>,
    pub iterations: u32,
}

/// Trace for the verified outcome.
pub(crate) fn exact(
    cash_flow: &CashFlow,
    figures: &ExactFigures,
    iteration_log: Vec<String>,
    variance_note: Option<String>,
) -> CalculationTrace {
    let periodic_pct = figures.periodic_rate * dec!(100);
    let mut explanation = format!(
        "{}\n\n\
         2. Solving:\n   \
         - Newton-Raphson iteration on the net present value of the schedule.\n   \
         - Converged after {} iterations: periodic rate = {:.4}%\n\n\
         3. Annualization:\n   \
         - Real APR (IRR) = {:.4}% x {} = {}%",
        extraction_section(cash_flow),
        figures.iterations,
        periodic_pct,
        periodic_pct,
        cash_flow.periods_per_year(),
        figures.final_apr
    );
    if let Some(ear) = figures.effective_annual_rate {
        explanation.push_str(&format!(
            "\n   - Compounded effective annual rate = {ear:.2}%"
        ));
    }
    if let Some(flat) = figures.flat_rate_apr {
        explanation.push_str(&format!(
            "\n   - Naive flat-rate figure (total charge / net received, per year) = {flat:.2}%, \
             which ignores that the balance is repaid as you go"
        ));
    }
    if let Some(note) = variance_note {
        explanation.push_str("\n\n");
        explanation.push_str(&note);
    }

    CalculationTrace {
        formula: format!(
            "NPV = {} - Σ_{{n=1..{}}} {} / (1 + r)^n = 0",
            cash_flow.net_disbursement().normalize(),
            cash_flow.term(),
            cash_flow.payment().normalize()
        ),
        cash_flow_sample: cash_flow.describe(),
        iteration_log,
        explanation,
    }
}

/// Narrative comparing the exact APR with the model estimate.
pub(crate) fn variance_note(
    exact_apr: Percent,
    estimate: Percent,
    correction_threshold: Percent,
    significant_divergence: Percent,
    cash_flow: &CashFlow,
) -> String {
    let diff = exact_apr - estimate;
    let signed = if diff > Decimal::ZERO {
        format!("+{}", diff.normalize())
    } else {
        diff.normalize().to_string()
    };
    if diff.abs() > significant_divergence {
        format!(
            "Cross-check: the exact APR ({}%) differs significantly from the model estimate ({}%), \
             a gap of {} points. The exact figure is derived from the concrete schedule \
             ({} per period x {} periods) and is usually the more reliable; the estimate probably \
             understated compounding or fees.",
            exact_apr.normalize(),
            estimate.normalize(),
            signed,
            cash_flow.payment().normalize(),
            cash_flow.term()
        )
    } else if diff.abs() > correction_threshold {
        format!(
            "Cross-check: model estimate {}% vs exact value {}% ({} points); the exact value replaces the estimate.",
            estimate.normalize(),
            exact_apr.normalize(),
            signed
        )
    } else {
        format!(
            "Cross-check: the model estimate ({}%) agrees with the exact value within {} points.",
            estimate.normalize(),
            correction_threshold.normalize()
        )
    }
}

fn extraction_section(cash_flow: &CashFlow) -> String {
    format!(
        "1. Data extraction:\n   \
         - Principal: {}\n   \
         - Upfront deduction: {}\n   \
         - Net amount received: {}\n   \
         - Payment per period: {}\n   \
         - Number of periods: {}",
        cash_flow.principal().normalize(),
        cash_flow.upfront_fees().normalize(),
        cash_flow.net_disbursement().normalize(),
        cash_flow.payment().normalize(),
        cash_flow.term()
    )
}
