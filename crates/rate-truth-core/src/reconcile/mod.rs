pub mod narrative;
pub mod reconciler;
pub mod verification;

pub use narrative::CalculationTrace;
pub use reconciler::{reconcile, ExactResult, Reconciler, Reconciliation};
pub use verification::{EngineWarning, Method, VerificationRecord};
