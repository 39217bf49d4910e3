use thiserror::Error;

#[derive(Debug, Error)]
pub enum FintaxError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FintaxError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FintaxError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FintaxError {
    fn from(e: serde_json::Error) -> Self {
        FintaxError::SerializationError(e.to_string())
    }
}
