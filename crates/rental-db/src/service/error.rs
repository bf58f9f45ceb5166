//! # Service Errors
//!
//! What callers of the engine see:
//!
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► ServiceError::Validation  recoverable, adjust and retry
//!                  ├──► ServiceError::NotFound    different input needed
//! DbError ─────────┴──► ServiceError::Store       propagated as-is
//! ```

use rental_core::{Conflict, CoreError, ValidationError};
use thiserror::Error;

use crate::error::DbError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A business rule rejected the request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced rental, product, customer or payment does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The store failed. Never retried here.
    #[error("store error: {0}")]
    Store(DbError),
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Only validation failures can succeed on a retry with adjusted input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }

    /// The full conflict list of an availability failure.
    pub fn conflicts(&self) -> Option<&[Conflict]> {
        match self {
            ServiceError::Validation(err) => err.conflicts(),
            _ => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ServiceError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            other => ServiceError::Store(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ServiceError::not_found(entity, id),
            CoreError::Validation(err) => ServiceError::Validation(err),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_not_found_maps_to_not_found() {
        let err: ServiceError = DbError::not_found("Rental", "r1").into();
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Rental not found: r1");
    }

    #[test]
    fn test_store_errors_not_retryable() {
        let err: ServiceError = DbError::PoolExhausted.into();
        assert!(matches!(err, ServiceError::Store(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_core_errors_flatten() {
        let err: ServiceError = CoreError::not_found("Product", "p1").into();
        assert!(err.is_not_found());

        let err: ServiceError = CoreError::Validation(ValidationError::MissingDates).into();
        assert!(err.is_retryable());
        assert_eq!(err.validation(), Some(&ValidationError::MissingDates));
        assert!(err.conflicts().is_none());
    }
}
