use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RateTruthError;
use crate::types::{Percent, Rate};
use crate::RateTruthResult;

/// Tunables for the Newton-Raphson IRR solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Starting periodic rate (0.10 = 10% per period)
    pub initial_guess: Rate,
    /// Convergence threshold applied to both |NPV| and the Newton step
    pub tolerance: Decimal,
    pub max_iterations: u32,
    /// |rate| above this is treated as runaway extrapolation (100 = 10,000% per period)
    pub divergence_bound: Rate,
    /// Start loan-schedule solves at the schedule's flat rate instead of `initial_guess`
    pub seed_from_schedule: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            initial_guess: dec!(0.10),
            tolerance: dec!(0.0000001),
            max_iterations: 100,
            divergence_bound: dec!(100),
            seed_from_schedule: true,
        }
    }
}

/// Cutoffs used to guess the period unit of an advertised rate when it was not stated.
///
/// These are calibration knobs, not numerical facts: a value that looks
/// implausibly low as a yearly rate while the corroborating APR is clearly
/// higher is re-read as daily (below `daily_ceiling`) or monthly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitInferencePolicy {
    pub implausibly_low: Percent,
    pub corroboration_floor: Percent,
    pub daily_ceiling: Percent,
}

impl Default for UnitInferencePolicy {
    fn default() -> Self {
        Self {
            implausibly_low: dec!(2.5),
            corroboration_floor: dec!(6),
            daily_ceiling: dec!(0.2),
        }
    }
}

/// APR band a solved result must fall in to be trusted. Lower bound inclusive, upper exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AprBand {
    pub min: Percent,
    pub max: Percent,
}

impl Default for AprBand {
    fn default() -> Self {
        Self {
            min: Decimal::ZERO,
            max: dec!(1000),
        }
    }
}

impl AprBand {
    pub fn contains(&self, apr: Percent) -> bool {
        apr >= self.min && apr < self.max
    }
}

/// Consumer-risk thresholds on the final APR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskBands {
    pub low_below: Percent,
    pub medium_below: Percent,
    pub high_below: Percent,
    /// Final APR above the advertised annualized rate by more than this counts as misleading
    pub misleading_gap: Percent,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            low_below: dec!(10),
            medium_below: dec!(24),
            high_below: dec!(36),
            misleading_gap: dec!(15),
        }
    }
}

/// Every policy knob of the engine. All fields default, so a partial file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    pub solver: SolverSettings,
    pub plausible_apr: AprBand,
    /// Percentage-point gap between exact and estimated APR that marks a correction
    pub correction_threshold: Percent,
    /// Gap that earns the "significant divergence" narrative
    pub significant_divergence: Percent,
    pub unit_inference: UnitInferencePolicy,
    pub risk_bands: RiskBands,
    pub apr_decimal_places: u32,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            plausible_apr: AprBand::default(),
            correction_threshold: dec!(1.0),
            significant_divergence: dec!(5.0),
            unit_inference: UnitInferencePolicy::default(),
            risk_bands: RiskBands::default(),
            apr_decimal_places: 2,
        }
    }
}

impl EnginePolicy {
    /// Parse a JSON policy document; absent fields keep their defaults.
    pub fn from_json(json: &str) -> RateTruthResult<Self> {
        let policy: EnginePolicy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject policies the engine cannot run under.
    pub fn validate(&self) -> RateTruthResult<()> {
        let s = &self.solver;
        if s.tolerance <= Decimal::ZERO {
            return Err(invalid("solver.tolerance", "Tolerance must be positive"));
        }
        if s.max_iterations == 0 {
            return Err(invalid(
                "solver.max_iterations",
                "Iteration budget must be at least 1",
            ));
        }
        if s.divergence_bound <= Decimal::ZERO {
            return Err(invalid(
                "solver.divergence_bound",
                "Divergence bound must be positive",
            ));
        }
        if s.initial_guess <= dec!(-1) || s.initial_guess.abs() > s.divergence_bound {
            return Err(invalid(
                "solver.initial_guess",
                "Initial guess must be above -100% and inside the divergence bound",
            ));
        }
        if self.plausible_apr.min >= self.plausible_apr.max {
            return Err(invalid(
                "plausible_apr",
                "Lower bound must be below upper bound",
            ));
        }
        if self.correction_threshold < Decimal::ZERO
            || self.significant_divergence < self.correction_threshold
        {
            return Err(invalid(
                "significant_divergence",
                "Thresholds must be non-negative and significant_divergence >= correction_threshold",
            ));
        }
        let u = &self.unit_inference;
        if u.daily_ceiling <= Decimal::ZERO || u.daily_ceiling > u.implausibly_low {
            return Err(invalid(
                "unit_inference.daily_ceiling",
                "Daily ceiling must be positive and not above implausibly_low",
            ));
        }
        let r = &self.risk_bands;
        if !(r.low_below <= r.medium_below && r.medium_below <= r.high_below) {
            return Err(invalid("risk_bands", "Bands must be ascending"));
        }
        if self.apr_decimal_places > 10 {
            return Err(invalid(
                "apr_decimal_places",
                "At most 10 decimal places are supported",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> RateTruthError {
    RateTruthError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_policy_is_valid() {
        assert!(EnginePolicy::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let policy: EnginePolicy =
            serde_json::from_str(r#"{"solver": {"max_iterations": 20}}"#).unwrap();
        assert_eq!(policy.solver.max_iterations, 20);
        assert_eq!(policy.solver.initial_guess, dec!(0.10));
        assert_eq!(policy.correction_threshold, dec!(1.0));
        assert_eq!(policy.apr_decimal_places, 2);
        assert_eq!(policy.unit_inference.daily_ceiling, dec!(0.2));
    }

    #[test]
    fn test_from_json_validates() {
        let err = EnginePolicy::from_json(r#"{"plausible_apr": {"min": 50, "max": 10}}"#).unwrap_err();
        assert!(matches!(err, RateTruthError::InvalidInput { .. }));
        let err = EnginePolicy::from_json("{not json").unwrap_err();
        assert!(matches!(err, RateTruthError::SerializationError(_)));
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let mut policy = EnginePolicy::default();
        policy.solver.max_iterations = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_band() {
        let mut policy = EnginePolicy::default();
        policy.plausible_apr = AprBand {
            min: dec!(50),
            max: dec!(10),
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_band_lower_inclusive_upper_exclusive() {
        let band = AprBand::default();
        assert!(band.contains(Decimal::ZERO));
        assert!(band.contains(dec!(999.99)));
        assert!(!band.contains(dec!(1000)));
        assert!(!band.contains(dec!(-0.01)));
    }
}
