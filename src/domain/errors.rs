use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("config load failed: {0}")]
    ConfigLoad(String),

    #[error("config schema invalid: {0}")]
    ConfigSchema(String),

    #[error("Tool {tool}.{operation} not found")]
    UnknownOperation { tool: String, operation: String },

    #[error("invalid parameter '{field}': {reason}")]
    ConstraintViolation {
        field: String,
        reason: String,
        actual: Value,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Io(String),

    #[error("failed to deserialize: {0}")]
    Deserialize(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

impl DomainError {
    pub fn violation(field: &str, reason: impl Into<String>, actual: Option<&Value>) -> Self {
        Self::ConstraintViolation {
            field: field.to_string(),
            reason: reason.into(),
            actual: actual.cloned().unwrap_or(Value::Null),
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialize(err.to_string())
    }
}
