use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Percent;

/// Period an advertised rate is quoted per.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RateUnit {
    Day,
    Month,
    Year,
    /// Not stated, or not recognised
    #[default]
    #[serde(other)]
    Unknown,
}

impl RateUnit {
    /// Simple (non-compounded) multiplier to a yearly figure. `None` for `Unknown`.
    pub fn periods_per_year(self) -> Option<Decimal> {
        match self {
            RateUnit::Day => Some(dec!(365)),
            RateUnit::Month => Some(dec!(12)),
            RateUnit::Year => Some(Decimal::ONE),
            RateUnit::Unknown => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RateUnit::Day => "daily",
            RateUnit::Month => "monthly",
            RateUnit::Year => "yearly",
            RateUnit::Unknown => "unstated",
        }
    }
}

/// A rate as advertised, in percentage points per `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateClaim {
    pub value: Percent,
    #[serde(default)]
    pub unit: RateUnit,
}

impl RateClaim {
    pub fn new(value: Percent, unit: RateUnit) -> Self {
        Self { value, unit }
    }

    pub fn yearly(value: Percent) -> Self {
        Self::new(value, RateUnit::Year)
    }
}
