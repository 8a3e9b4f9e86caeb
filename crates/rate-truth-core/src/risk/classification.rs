use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::policy::RiskBands;
use crate::types::Percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Bank loans, mortgages
    Low,
    /// Credit cards, standard consumer loans
    Medium,
    /// High-interest cash loans
    High,
    /// Predatory pricing or misleading terms
    Scam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Real APR far above the advertised annualized rate
    pub misleading_advertising: bool,
    pub rationale: Vec<String>,
}

/// Classify consumer risk from the final APR and, when known, the advertised yearly rate.
pub fn classify(final_apr: Percent, advertised: Option<Percent>, bands: &RiskBands) -> RiskAssessment {
    let mut rationale = Vec::new();

    let misleading = match advertised {
        Some(adv) if adv > Decimal::ZERO && final_apr - adv > bands.misleading_gap => {
            rationale.push(format!(
                "Real APR {}% is {} points above the advertised {}% per year",
                final_apr.normalize(),
                (final_apr - adv).normalize(),
                adv.normalize()
            ));
            true
        }
        _ => false,
    };

    let band_level = if final_apr > bands.high_below {
        RiskLevel::Scam
    } else if final_apr >= bands.medium_below {
        RiskLevel::High
    } else if final_apr >= bands.low_below {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    rationale.push(match band_level {
        RiskLevel::Scam => format!("APR above {}%", bands.high_below.normalize()),
        RiskLevel::High => format!(
            "APR between {}% and {}%",
            bands.medium_below.normalize(),
            bands.high_below.normalize()
        ),
        RiskLevel::Medium => format!(
            "APR between {}% and {}%",
            bands.low_below.normalize(),
            bands.medium_below.normalize()
        ),
        RiskLevel::Low => format!("APR below {}%", bands.low_below.normalize()),
    });

    let level = if misleading {
        RiskLevel::Scam
    } else {
        band_level
    };

    RiskAssessment {
        level,
        misleading_advertising: misleading,
        rationale,
    }
}
