pub mod classification;

pub use classification::{classify, RiskAssessment, RiskLevel};
