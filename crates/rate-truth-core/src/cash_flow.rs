use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{lenient, Money, Rate};

fn default_periods_per_year() -> u32 {
    12
}

/// Null means "not stated" and takes the default; a value that is not a
/// positive whole count is kept as 0 so [`build`] rejects it.
fn lenient_periods_per_year<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Periods {
        Count(u32),
        Absent(()),
        Invalid(IgnoredAny),
    }

    Ok(match Periods::deserialize(deserializer)? {
        Periods::Count(n) => n,
        Periods::Absent(()) => default_periods_per_year(),
        Periods::Invalid(_) => 0,
    })
}

/// Loan terms as read off an advertisement. Untrusted: every field may be
/// missing, null, of the wrong type or nonsensical. Malformed amounts read as
/// missing, and usability is decided by [`build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Amount nominally borrowed
    #[serde(default, deserialize_with = "lenient")]
    pub principal: Option<Money>,
    /// Amount withheld before disbursement
    #[serde(default, alias = "upfrontFees", deserialize_with = "lenient")]
    pub upfront_fees: Option<Money>,
    /// Number of equal repayment periods
    #[serde(default, deserialize_with = "lenient")]
    pub term: Option<Decimal>,
    /// Amount paid per period (principal + interest + fees)
    #[serde(default, deserialize_with = "lenient")]
    pub payment: Option<Money>,
    #[serde(
        default = "default_periods_per_year",
        alias = "periodsPerYear",
        deserialize_with = "lenient_periods_per_year"
    )]
    pub periods_per_year: u32,
}

impl LoanParameters {
    pub fn new(principal: Money, upfront_fees: Money, term: u32, payment: Money) -> Self {
        Self {
            principal: Some(principal),
            upfront_fees: Some(upfront_fees),
            term: Some(Decimal::from(term)),
            payment: Some(payment),
            periods_per_year: default_periods_per_year(),
        }
    }
}

/// Why a parameter set cannot be turned into a schedule. Not a failure:
/// the caller falls back to the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unusable {
    MissingPrincipal,
    MissingTerm,
    MissingPayment,
    NonPositivePrincipal,
    NonPositivePayment,
    /// Zero, negative, fractional, or too large to enumerate
    InvalidTerm,
    NegativeFees,
    /// Fees swallow the whole principal
    NoNetDisbursement,
    ZeroPeriodsPerYear,
    /// Amounts too large to evaluate in decimal range
    OutOfRange,
}

impl std::fmt::Display for Unusable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Unusable::MissingPrincipal => "principal not provided",
            Unusable::MissingTerm => "term not provided",
            Unusable::MissingPayment => "payment not provided",
            Unusable::NonPositivePrincipal => "principal must be positive",
            Unusable::NonPositivePayment => "payment must be positive",
            Unusable::InvalidTerm => "term must be a positive whole number of periods",
            Unusable::NegativeFees => "upfront fees cannot be negative",
            Unusable::NoNetDisbursement => "upfront fees leave nothing to disburse",
            Unusable::ZeroPeriodsPerYear => "periods per year must be positive",
            Unusable::OutOfRange => "amounts are too large to evaluate",
        };
        f.write_str(reason)
    }
}

/// Signed, equal-instalment cash flow. Index 0 is the net amount received
/// (positive); indices 1..=term are the repayments (negative).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlow {
    flows: Vec<Money>,
    principal: Money,
    upfront_fees: Money,
    payment: Money,
    periods_per_year: u32,
}

impl CashFlow {
    pub fn flows(&self) -> &[Money] {
        &self.flows
    }

    pub fn term(&self) -> u32 {
        (self.flows.len() - 1) as u32
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn upfront_fees(&self) -> Money {
        self.upfront_fees
    }

    pub fn payment(&self) -> Money {
        self.payment
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Principal minus fees withheld up front.
    pub fn net_disbursement(&self) -> Money {
        self.flows[0]
    }

    /// Sum of all instalments.
    pub fn total_repayment(&self) -> Money {
        self.payment * Decimal::from(self.term())
    }

    /// Flat (add-on) rate per period: total charge spread evenly over the term
    /// against the net amount received. Never above the true periodic IRR of an
    /// equal-instalment schedule, so Newton iteration seeded here approaches the
    /// root from below.
    pub fn flat_periodic_rate(&self) -> Option<Rate> {
        let net = self.net_disbursement();
        (self.total_repayment() - net).checked_div(net.checked_mul(Decimal::from(self.term()))?)
    }

    /// Literal rendering of the schedule, e.g. `T0: +8500\nT1 - T12: -900`.
    pub fn describe(&self) -> String {
        let net = self.net_disbursement().normalize();
        let pmt = self.payment.normalize();
        let n = self.term();
        if n == 1 {
            format!("T0: +{net}\nT1: -{pmt}")
        } else {
            format!("T0: +{net}\nT1 - T{n}: -{pmt}")
        }
    }
}

/// Hard ceiling on enumerated periods; 100 years of monthly instalments.
const MAX_TERM: u32 = 1200;

/// Build the borrower-side cash flow for `params`.
///
/// Returns `Err(Unusable)` when the parameters cannot describe a loan; this is
/// an expected outcome for partial extractions, not an error condition.
pub fn build(params: &LoanParameters) -> Result<CashFlow, Unusable> {
    let principal = params.principal.ok_or(Unusable::MissingPrincipal)?;
    let term = params.term.ok_or(Unusable::MissingTerm)?;
    let payment = params.payment.ok_or(Unusable::MissingPayment)?;
    let upfront_fees = params.upfront_fees.unwrap_or(Decimal::ZERO);

    if principal <= Decimal::ZERO {
        return Err(Unusable::NonPositivePrincipal);
    }
    if payment <= Decimal::ZERO {
        return Err(Unusable::NonPositivePayment);
    }
    if term <= Decimal::ZERO || !term.fract().is_zero() || term > Decimal::from(MAX_TERM) {
        return Err(Unusable::InvalidTerm);
    }
    if upfront_fees < Decimal::ZERO {
        return Err(Unusable::NegativeFees);
    }
    if params.periods_per_year == 0 {
        return Err(Unusable::ZeroPeriodsPerYear);
    }

    let net = principal - upfront_fees;
    if net <= Decimal::ZERO {
        return Err(Unusable::NoNetDisbursement);
    }

    payment.checked_mul(term).ok_or(Unusable::OutOfRange)?;

    let n = term.to_usize().ok_or(Unusable::InvalidTerm)?;
    let mut flows = Vec::with_capacity(n + 1);
    flows.push(net);
    flows.extend(std::iter::repeat(-payment).take(n));

    Ok(CashFlow {
        flows,
        principal,
        upfront_fees,
        payment,
        periods_per_year: params.periods_per_year,
    })
}
