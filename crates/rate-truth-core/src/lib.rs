pub mod analysis;
pub mod cash_flow;
pub mod error;
pub mod irr;
pub mod policy;
pub mod rates;
pub mod reconcile;
pub mod time_value;
pub mod types;

#[cfg(feature = "risk")]
pub mod risk;

pub use analysis::{analyze, AnalysisOutput, AnalysisRequest};
pub use error::RateTruthError;
pub use policy::EnginePolicy;
pub use types::*;

/// Standard result type for boundary operations (policy loading, parsing)
pub type RateTruthResult<T> = Result<T, RateTruthError>;
