//! # Error Types
//!
//! Domain-specific error types for meridian-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  meridian-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Taxonomy every failure is classified into      │
//! │                                                                         │
//! │  meridian-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  meridian-engine errors                                                │
//! │  └── ServiceError     - What callers see (kind + sanitized message)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │        DbError ─────────────────────┼──► ServiceError                  │
//! │        CollaboratorError ───────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (IDs, amounts)
//! 3. Every business error knows its `ErrorKind`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::types::RegisterKind;

// =============================================================================
// Error Kind
// =============================================================================

/// Classification of every failure the services can report.
///
/// ```text
/// Validation     → bad input, the user must correct it
/// StateConflict  → entity is in a terminal or incompatible state
/// NotFound       → a referenced entity does not exist
/// Auth           → credentials did not verify
/// Infra          → storage or collaborator failure (never retried)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    StateConflict,
    NotFound,
    Auth,
    Infra,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule errors raised by the settlement, register and stock
/// adjustment rules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    // -------------------------------------------------------------------------
    // Sale settlement
    // -------------------------------------------------------------------------
    /// Sale is already Closed (terminal).
    #[error("Sale already closed")]
    SaleClosed { sale_id: String },

    /// Products total is zero or negative.
    #[error("Sale has no value")]
    SaleHasNoValue { sale_id: String },

    /// Payment schedule and installment amounts disagree in length.
    #[error("Payment schedule has {schedule} installments but {amounts} amounts were given")]
    ScheduleLengthMismatch { schedule: usize, amounts: usize },

    /// Payment document for an installment index is missing.
    #[error("payment document not found for this sale")]
    PaymentDocumentMissing { sale_id: String, index: usize },

    /// Cash tender requested while no drawer is open.
    #[error("No register is open")]
    NoOpenRegister,

    /// Sum of installment amounts differs from the products total.
    #[error("Installment total differs from products total (expected {expected}, got {actual})")]
    InstallmentTotalMismatch { expected: Money, actual: Money },

    /// Immediate installment without an amount.
    #[error("Installment {index} has no value")]
    BlankInstallment { index: usize },

    /// Deferred tender on a sale without a customer.
    #[error("Sale requires a customer")]
    CustomerRequired { sale_id: String },

    /// Deferred installment without an amount.
    #[error("Invalid receivable amount")]
    InvalidReceivableAmount { index: usize },

    /// Immediate installment paid with a tender that cannot settle on the spot.
    #[error("Tender '{tender}' cannot settle an immediate installment")]
    UnsupportedTender { tender: String },

    // -------------------------------------------------------------------------
    // Cash register ledger
    // -------------------------------------------------------------------------
    /// A register of this kind is already open.
    #[error("A {kind} register is already open")]
    RegisterAlreadyOpen { kind: RegisterKind },

    /// Register is already closed (terminal).
    #[error("Register {register_id} is already closed")]
    RegisterClosed { register_id: String },

    /// Password missing when closing a register.
    #[error("Password is required")]
    PasswordRequired,

    /// Password did not match the acting user's credential.
    #[error("Incorrect password")]
    IncorrectPassword,

    // -------------------------------------------------------------------------
    // Stock adjustments
    // -------------------------------------------------------------------------
    /// Adjustment was already processed (terminal).
    #[error("Stock adjustment {adjustment_id} is already processed")]
    AdjustmentProcessed { adjustment_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classifies this error into the service taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } | CoreError::PaymentDocumentMissing { .. } => {
                ErrorKind::NotFound
            }

            CoreError::SaleClosed { .. }
            | CoreError::NoOpenRegister
            | CoreError::RegisterAlreadyOpen { .. }
            | CoreError::RegisterClosed { .. }
            | CoreError::AdjustmentProcessed { .. } => ErrorKind::StateConflict,

            CoreError::IncorrectPassword => ErrorKind::Auth,

            CoreError::SaleHasNoValue { .. }
            | CoreError::ScheduleLengthMismatch { .. }
            | CoreError::InstallmentTotalMismatch { .. }
            | CoreError::BlankInstallment { .. }
            | CoreError::CustomerRequired { .. }
            | CoreError::InvalidReceivableAmount { .. }
            | CoreError::UnsupportedTender { .. }
            | CoreError::PasswordRequired
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is outside the allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    MustNotBeZero { field: String },

    /// Invalid format (e.g., invalid UUID, invalid amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SaleClosed {
            sale_id: "s-1".to_string(),
        };
        assert_eq!(err.to_string(), "Sale already closed");

        let err = CoreError::InstallmentTotalMismatch {
            expected: Money::from_cents(20000),
            actual: Money::from_cents(19000),
        };
        assert_eq!(
            err.to_string(),
            "Installment total differs from products total (expected 200.00, got 190.00)"
        );

        let err = CoreError::RegisterAlreadyOpen {
            kind: RegisterKind::Drawer,
        };
        assert_eq!(err.to_string(), "A drawer register is already open");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CoreError::NoOpenRegister.kind(), ErrorKind::StateConflict);
        assert_eq!(
            CoreError::SaleHasNoValue {
                sale_id: "s".into()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::PaymentDocumentMissing {
                sale_id: "s".into(),
                index: 0
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(CoreError::IncorrectPassword.kind(), ErrorKind::Auth);
        assert_eq!(CoreError::PasswordRequired.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }
}
