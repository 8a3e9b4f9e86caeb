pub mod claim;
pub mod normalizer;

pub use claim::{RateClaim, RateUnit};
pub use normalizer::{Normalized, RateNormalizer, UnitInference};
