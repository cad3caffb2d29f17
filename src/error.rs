//! Error types for swarm-compose

use thiserror::Error;

/// Result type for swarm-compose operations
pub type Result<T> = std::result::Result<T, ComposeError>;

/// swarm-compose error types
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    #[error("Network already exists: {0}")]
    NetworkExists(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service already exists: {0}")]
    ServiceExists(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ComposeError {
    /// Build a field validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ComposeError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
