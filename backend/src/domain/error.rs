//! Errors raised by the domain layer.
//!
//! The REST layer maps each variant onto an HTTP status; storage failures are
//! wrapped so handlers can log them without leaking details to clients.

/// Domain error
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    /// Missing or bad credentials
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated, but not allowed
    #[error("{0}")]
    Forbidden(String),
    /// A label cannot be deleted while expenses or incomes reference it
    #[error("{message}")]
    InUse { message: String, count: i64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type BudgetResult<T> = std::result::Result<T, BudgetError>;

impl BudgetError {
    pub fn not_found(message: impl Into<String>) -> Self {
        BudgetError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BudgetError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        BudgetError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        BudgetError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        BudgetError::Forbidden(message.into())
    }
}
