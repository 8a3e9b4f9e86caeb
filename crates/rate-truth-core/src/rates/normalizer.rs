use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::claim::{RateClaim, RateUnit};
use crate::policy::UnitInferencePolicy;
use crate::types::Percent;

/// Record of a unit guessed from magnitude. Kept so the audit trail states
/// plainly that the unit was inferred, not read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitInference {
    pub original_value: Percent,
    pub inferred_unit: RateUnit,
    pub corrected_value: Percent,
    pub corroborating_apr: Percent,
}

impl std::fmt::Display for UnitInference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let multiplier = self
            .inferred_unit
            .periods_per_year()
            .unwrap_or(Decimal::ONE);
        write!(
            f,
            "Unit inference: the advertised rate {}% did not state its period. \
             Read as a yearly rate it is implausibly low next to the estimated real APR of {}%, \
             so it was treated as a {} rate: {}% x {} = {}% per year. \
             This is a best-effort reading, not a confirmed term.",
            self.original_value.normalize(),
            self.corroborating_apr.normalize(),
            self.inferred_unit.label(),
            self.original_value.normalize(),
            multiplier,
            self.corrected_value.normalize()
        )
    }
}

/// Outcome of normalising one advertised rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub original: RateClaim,
    pub annualized: RateClaim,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference: Option<UnitInference>,
}

/// Converts advertised rates in any period unit into a simple yearly figure.
#[derive(Debug, Clone, Default)]
pub struct RateNormalizer {
    policy: UnitInferencePolicy,
}

impl RateNormalizer {
    pub fn new(policy: UnitInferencePolicy) -> Self {
        Self { policy }
    }

    /// Annualize with simple multiplication (day x365, month x12).
    ///
    /// Non-positive values pass through untouched. An `Unknown` unit is taken
    /// at face value as a yearly candidate; use [`normalize`](Self::normalize)
    /// to disambiguate it.
    pub fn annualize(&self, claim: &RateClaim) -> RateClaim {
        if claim.value <= Decimal::ZERO {
            return *claim;
        }
        let factor = claim.unit.periods_per_year().unwrap_or(Decimal::ONE);
        RateClaim::yearly(claim.value * factor)
    }

    /// Guess the unit of a yearly candidate that looks too small next to a
    /// corroborating APR. Returns `Year` when no reinterpretation is warranted.
    pub fn infer_unit(&self, annualized_guess: Percent, corroborating: Percent) -> RateUnit {
        let p = &self.policy;
        if annualized_guess > Decimal::ZERO
            && annualized_guess < p.implausibly_low
            && corroborating > p.corroboration_floor
        {
            if annualized_guess < p.daily_ceiling {
                RateUnit::Day
            } else {
                RateUnit::Month
            }
        } else {
            RateUnit::Year
        }
    }

    /// Annualize `claim`, inferring a missing unit from `corroborating_apr` when given.
    pub fn normalize(&self, claim: &RateClaim, corroborating_apr: Option<Percent>) -> Normalized {
        let mut inference = None;

        let annualized = match (claim.unit, corroborating_apr) {
            (RateUnit::Unknown, Some(signal)) if claim.value > Decimal::ZERO => {
                let unit = self.infer_unit(claim.value, signal);
                let corrected = self.annualize(&RateClaim::new(claim.value, unit));
                if unit != RateUnit::Year {
                    warn!(
                        original = %claim.value,
                        unit = unit.label(),
                        corrected = %corrected.value,
                        "rate unit inferred from magnitude"
                    );
                    inference = Some(UnitInference {
                        original_value: claim.value,
                        inferred_unit: unit,
                        corrected_value: corrected.value,
                        corroborating_apr: signal,
                    });
                }
                corrected
            }
            _ => self.annualize(claim),
        };

        Normalized {
            original: *claim,
            annualized,
            inference,
        }
    }
}
