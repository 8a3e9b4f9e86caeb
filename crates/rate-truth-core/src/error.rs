use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateTruthError {
    #[error("Invalid input ({field}): {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RateTruthError {
    fn from(e: serde_json::Error) -> Self {
        RateTruthError::SerializationError(e.to_string())
    }
}
