use serde::{Deserialize, Serialize};

use crate::cash_flow::LoanParameters;
use crate::irr::SolveStatus;
use crate::types::{Money, Percent, Rate};

/// Where the final APR came from. An exact result is verified by construction;
/// an estimate never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    Estimate,
    Exact { correction_applied: bool },
}

impl Method {
    pub fn is_verified(&self) -> bool {
        matches!(self, Method::Exact { .. })
    }

    pub fn correction_applied(&self) -> bool {
        matches!(
            self,
            Method::Exact {
                correction_applied: true
            }
        )
    }
}

/// Structured warning raised when the engine keeps the estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// Total repayment below net disbursement (implies negative interest)
    InconsistentSchedule {
        total_repayment: Money,
        net_disbursement: Money,
    },
    /// Solver stalled, diverged, or ran out of iterations
    SolverDidNotConverge {
        status: SolveStatus,
        periodic_rate: Rate,
        iterations: u32,
    },
    /// Solved APR outside the plausible band. With `from_flat_rate` the
    /// solver never ran: the schedule's flat-rate APR, a lower bound on the
    /// exact figure, already reached the upper limit.
    ImplausibleApr {
        apr: Percent,
        min: Percent,
        max: Percent,
        #[serde(default)]
        from_flat_rate: bool,
    },
}

impl std::fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineWarning::InconsistentSchedule {
                total_repayment,
                net_disbursement,
            } => write!(
                f,
                "Data inconsistency: the extracted total repayment ({}) is less than the net amount \
                 received ({}). Likely causes: 1. the per-period amount was read as interest only, \
                 excluding principal; 2. a final balloon payment was missed; 3. the number of periods \
                 was misread. Algorithmic verification was skipped and the model estimate is kept for reference.",
                total_repayment.normalize(),
                net_disbursement.normalize()
            ),
            EngineWarning::SolverDidNotConverge {
                status,
                periodic_rate,
                iterations,
            } => {
                let outcome = match status {
                    SolveStatus::Diverged => "diverged",
                    SolveStatus::Stalled => "stalled on a zero derivative",
                    SolveStatus::MaxIter => "did not converge within its iteration budget",
                    SolveStatus::Converged => "converged",
                };
                write!(
                    f,
                    "Calculation anomaly: the rate solver {} after {} iterations (last periodic rate {:.4}%). \
                     The extracted parameters are probably far off; the model estimate is kept.",
                    outcome,
                    iterations,
                    *periodic_rate * rust_decimal_macros::dec!(100)
                )
            }
            EngineWarning::ImplausibleApr {
                apr,
                min,
                max,
                from_flat_rate,
            } => {
                let figure = if *from_flat_rate {
                    format!("APR is at least {:.2}% (flat-rate lower bound)", apr)
                } else {
                    format!("computed APR ({:.2}%)", apr)
                };
                write!(
                    f,
                    "Calculation anomaly: the {} is outside the plausible range [{}%, {}%). \
                     The input parameters are probably badly misread; the model estimate is kept.",
                    figure,
                    min.normalize(),
                    max.normalize()
                )
            }
        }
    }
}

/// How the final APR was established, for display next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub method: Method,
    pub extracted_params: Option<LoanParameters>,
    pub warnings: Vec<EngineWarning>,
}

impl VerificationRecord {
    pub fn estimate(extracted_params: Option<LoanParameters>, warnings: Vec<EngineWarning>) -> Self {
        Self {
            method: Method::Estimate,
            extracted_params,
            warnings,
        }
    }

    pub fn exact(extracted_params: LoanParameters, correction_applied: bool) -> Self {
        Self {
            method: Method::Exact { correction_applied },
            extracted_params: Some(extracted_params),
            warnings: Vec::new(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.method.is_verified()
    }

    pub fn correction_applied(&self) -> bool {
        self.method.correction_applied()
    }
}

#[derive(Serialize)]
struct VerificationView<'a> {
    is_verified: bool,
    #[serde(flatten)]
    method: &'a Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_params: Option<&'a LoanParameters>,
    warnings: &'a [EngineWarning],
}

impl Serialize for VerificationRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        VerificationView {
            is_verified: self.is_verified(),
            method: &self.method,
            extracted_params: self.extracted_params.as_ref(),
            warnings: &self.warnings,
        }
        .serialize(serializer)
    }
}
