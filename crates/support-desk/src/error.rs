//! Error Types for the Support Desk

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupportError>;

#[derive(Error, Debug)]
pub enum SupportError {
    #[error("Customer not found")]
    CustomerNotFound(String),

    #[error("Order not found")]
    OrderNotFound(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SupportError {
    /// Lookup misses are answered as a normal tool result, not a tool failure
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::CustomerNotFound(_) | Self::OrderNotFound(_))
    }
}

impl From<SupportError> for AgentError {
    fn from(err: SupportError) -> Self {
        match err {
            SupportError::InvalidAddress(_) => Self::ToolValidation(err.to_string()),
            SupportError::Serialization(e) => Self::Json(e),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}
