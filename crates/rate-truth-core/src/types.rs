use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

/// Monetary amounts (principal, fees, instalments).
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). The solver works in this unit.
pub type Rate = Decimal;

/// Percentage points (18.25 = 18.25%). APRs and advertised rates travel in this unit.
pub type Percent = Decimal;

/// Envelope wrapped around every engine answer handed to a collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    /// Policy values the computation ran under.
    pub assumptions: serde_json::Value,
    /// Rendered warning messages, ready for display.
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub engine: String,
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a result with methodology, assumptions and timing measured from `started`.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    started: Instant,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            engine: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: started.elapsed().as_micros() as u64,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

// Field deserializers for untrusted collaborator input, used through
// `#[serde(default, deserialize_with = "...")]`.

/// Accept a well-formed `T`, and read anything else (null, wrong type,
/// partial object) as absent.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field<T> {
        Valid(T),
        Invalid(IgnoredAny),
    }

    Ok(match Field::<T>::deserialize(deserializer)? {
        Field::Valid(value) => Some(value),
        Field::Invalid(_) => None,
    })
}
