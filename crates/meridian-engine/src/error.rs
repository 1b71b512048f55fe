//! # Service Errors
//!
//! What callers of the services see, and the single place where internal
//! failures are classified.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Meridian POS                           │
//! │                                                                         │
//! │  Service operation                                                     │
//! │  async { ... }  ──► Result<T, Failure>                                 │
//! │         │                                                               │
//! │         │  CoreError          ─► kind() ─────────────► warn!  ─┐       │
//! │         │  DbError::NotFound  ─► NotFound ───────────► warn!  ─┤       │
//! │         │  DbError unique on  ─► StateConflict ──────► warn!  ─┤       │
//! │         │   cash_registers.kind                                 │       │
//! │         │  other DbError      ─► Infra (sanitized) ──► error! ─┤       │
//! │         │  CollaboratorError  ─► Infra (sanitized) ──► error! ─┤       │
//! │         ▼                                                       ▼       │
//! │  Failure::at_boundary(operation, entity_id) ──► ServiceError {kind,msg}│
//! │                                                                         │
//! │  The transaction is dropped (rolled back) before the boundary runs.    │
//! │  Nothing is retried.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::collaborators::CollaboratorError;
use meridian_core::{CoreError, ErrorKind, RegisterKind, ValidationError};
use meridian_db::{DbError, OPEN_REGISTER_UNIQUE_COLUMN};

/// Message returned for every infrastructure failure.
pub const INFRA_MESSAGE: &str = "The operation could not be completed. Please try again later.";

// =============================================================================
// Service Error
// =============================================================================

/// Error returned from every public service operation.
///
/// ## Serialization
/// ```json
/// {
///   "kind": "STATE_CONFLICT",
///   "message": "Sale already closed"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    /// Machine-readable classification
    pub kind: ErrorKind,

    /// Human-readable message, never carrying storage details
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServiceError {
            kind,
            message: message.into(),
        }
    }

    pub fn infra() -> Self {
        ServiceError::new(ErrorKind::Infra, INFRA_MESSAGE)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ServiceError {}

pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Internal Failure
// =============================================================================

/// Everything that can go wrong inside an operation before classification.
#[derive(Debug, Error)]
pub(crate) enum Failure {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl From<ValidationError> for Failure {
    fn from(err: ValidationError) -> Self {
        Failure::Core(CoreError::Validation(err))
    }
}

pub(crate) type FailureResult<T> = Result<T, Failure>;

impl Failure {
    /// Classifies the failure once, logs it with the entity id, and turns it
    /// into what the caller sees.
    pub(crate) fn at_boundary(self, operation: &'static str, entity_id: &str) -> ServiceError {
        match self {
            Failure::Core(err) => {
                let kind = err.kind();
                warn!(operation, entity_id = %entity_id, ?kind, error = %err, "Operation rejected");
                ServiceError::new(kind, err.to_string())
            }

            Failure::Db(err) if err.is_unique_violation_on(OPEN_REGISTER_UNIQUE_COLUMN) => {
                warn!(operation, entity_id = %entity_id, error = %err, "Open register already exists");
                let kind = kind_from_entity(entity_id);
                ServiceError::new(
                    ErrorKind::StateConflict,
                    match kind {
                        Some(kind) => CoreError::RegisterAlreadyOpen { kind }.to_string(),
                        None => "A register of this kind is already open".to_string(),
                    },
                )
            }

            Failure::Db(DbError::NotFound { entity, id }) => {
                warn!(operation, entity_id = %entity_id, entity = %entity, id = %id, "Referenced entity missing");
                ServiceError::new(ErrorKind::NotFound, format!("{} not found: {}", entity, id))
            }

            Failure::Db(err) => {
                error!(operation, entity_id = %entity_id, error = %err, "Storage failure");
                ServiceError::infra()
            }

            Failure::Collaborator(err) => {
                error!(operation, entity_id = %entity_id, error = %err, "Collaborator failure");
                ServiceError::infra()
            }
        }
    }
}

/// Register operations log the kind as their entity id before one exists.
fn kind_from_entity(entity_id: &str) -> Option<RegisterKind> {
    RegisterKind::ALL
        .iter()
        .copied()
        .find(|kind| kind.as_str() == entity_id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_their_kind_and_message() {
        let err = Failure::from(CoreError::SaleClosed {
            sale_id: "s-1".to_string(),
        })
        .at_boundary("close_sale", "s-1");

        assert_eq!(err.kind, ErrorKind::StateConflict);
        assert_eq!(err.message, "Sale already closed");
    }

    #[test]
    fn test_validation_error_is_validation() {
        let err = Failure::from(ValidationError::MustNotBeZero {
            field: "delta".to_string(),
        })
        .at_boundary("add_line", "adj-1");

        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_db_not_found_is_not_found() {
        let err = Failure::from(DbError::not_found("Product", "p-9")).at_boundary("add_item", "s-1");

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Product not found: p-9");
    }

    #[test]
    fn test_open_register_violation_is_state_conflict() {
        let violation = DbError::UniqueViolation {
            field: OPEN_REGISTER_UNIQUE_COLUMN.to_string(),
            value: "drawer".to_string(),
        };
        let err = Failure::from(violation).at_boundary("open_register", "drawer");

        assert_eq!(err.kind, ErrorKind::StateConflict);
        assert_eq!(err.message, "A drawer register is already open");
    }

    #[test]
    fn test_infra_failures_are_sanitized() {
        let err = Failure::from(DbError::QueryFailed("disk I/O error at page 4".to_string()))
            .at_boundary("close_sale", "s-1");

        assert_eq!(err.kind, ErrorKind::Infra);
        assert_eq!(err.message, INFRA_MESSAGE);

        let err = Failure::from(CollaboratorError::Inventory("scanner offline".to_string()))
            .at_boundary("close_sale", "s-1");

        assert_eq!(err.kind, ErrorKind::Infra);
        assert!(!err.message.contains("scanner"));
    }

    #[test]
    fn test_service_error_serializes_kind() {
        let json = serde_json::to_string(&ServiceError::new(ErrorKind::NotFound, "gone")).unwrap();
        assert_eq!(json, r#"{"kind":"NOT_FOUND","message":"gone"}"#);
    }
}
