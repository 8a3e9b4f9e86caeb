use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::types::{Money, Rate};

/// Net Present Value of periodic cash flows at `rate`.
///
/// `None` when `rate <= -100%` or the evaluation overflows 128-bit decimal range.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    npv_with_derivative(rate, cash_flows).map(|(value, _)| value)
}

/// NPV and its first derivative with respect to the rate, in one pass.
///
/// NPV(r)  = Σ CF_t · (1+r)^-t
/// NPV'(r) = Σ -t · CF_t · (1+r)^-(t+1)
pub fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let v = Decimal::ONE.checked_div(one_plus_r)?;

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(v)?;
        }
        value = value.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            let slope = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_mul(v)?;
            derivative = derivative.checked_sub(slope)?;
        }
    }

    Some((value, derivative))
}

/// Compounded yearly equivalent of a periodic rate: (1+r)^n - 1.
pub fn effective_annual_rate(periodic: Rate, periods_per_year: u32) -> Option<Rate> {
    let growth = Decimal::ONE
        .checked_add(periodic)?
        .checked_powu(u64::from(periods_per_year))?;
    growth.checked_sub(Decimal::ONE)
}
