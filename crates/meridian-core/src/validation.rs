//! # Validation Module
//!
//! Input validation utilities for Meridian POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service boundary (meridian-engine)                           │
//! │  └── THIS MODULE: field checks before any write                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Business rules (CoreError)                                   │
//! │  ├── Sale must be open, register must be open                          │
//! │  └── Installments must reconcile with the products total               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK / NOT NULL constraints                                      │
//! │  ├── Partial UNIQUE index (one open drawer, one open safe)             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use meridian_core::validation::{digits_only, validate_quantity};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert_eq!(digits_only("0001-2"), "00012");
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_ITEM_QUANTITY, MAX_TEXT_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Strips everything but ASCII digits.
///
/// Bank agency and account numbers are stored in this form.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalizes an optional digit field: digits only, `None` when nothing is left.
pub fn normalize_digits(value: Option<&str>) -> Option<String> {
    value.map(digits_only).filter(|digits| !digits.is_empty())
}

/// Validates free text such as notes or observations.
///
/// Returns the trimmed text, or `None` when blank.
pub fn validate_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        });
    }

    Ok(Some(value.to_string()))
}

/// Validates that a password was supplied. Whitespace-only counts as blank.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock adjustment delta.
///
/// Positive adds stock, negative removes it, zero is meaningless.
pub fn validate_adjustment_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::MustNotBeZero {
            field: "quantity delta".to_string(),
        });
    }

    Ok(())
}

/// Rejects amounts whose magnitude exceeds [`MAX_AMOUNT`].
pub fn validate_amount_range(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.cents().unsigned_abs() > (MAX_AMOUNT * 100).unsigned_abs() {
        return Err(amount_out_of_range(field));
    }

    Ok(())
}

/// The error for an amount, or a sum of amounts, past [`MAX_AMOUNT`].
pub fn amount_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: -MAX_AMOUNT,
        max: MAX_AMOUNT,
    }
}

/// Validates a register opening balance. Zero is allowed.
pub fn validate_opening_balance(balance: Money) -> ValidationResult<()> {
    if balance.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "opening balance".to_string(),
        });
    }

    validate_amount_range("opening balance", balance)
}

/// Validates discount and surcharge amounts on a settlement.
pub fn validate_adjustment_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    validate_amount_range(field, amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("1234-5"), "12345");
        assert_eq!(digits_only(" 00.123/4 "), "001234");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn test_normalize_digits() {
        assert_eq!(normalize_digits(Some("12-3")), Some("123".to_string()));
        assert_eq!(normalize_digits(Some("--")), None);
        assert_eq!(normalize_digits(None), None);
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("notes", Some("  hello ")).unwrap(), Some("hello".to_string()));
        assert_eq!(validate_text("notes", Some("   ")).unwrap(), None);
        assert_eq!(validate_text("notes", None).unwrap(), None);
        assert!(validate_text("notes", Some(&"x".repeat(MAX_TEXT_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("   ").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_adjustment_delta() {
        assert!(validate_adjustment_delta(5).is_ok());
        assert!(validate_adjustment_delta(-3).is_ok());
        assert!(validate_adjustment_delta(0).is_err());
    }

    #[test]
    fn test_validate_opening_balance() {
        assert!(validate_opening_balance(Money::zero()).is_ok());
        assert!(validate_opening_balance(Money::from_cents(10000)).is_ok());
        assert!(validate_opening_balance(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_amount_range() {
        let limit = Money::from_cents(MAX_AMOUNT * 100);
        let one_cent = Money::from_cents(1);

        assert!(validate_amount_range("amount", limit).is_ok());
        assert!(validate_amount_range("amount", -limit).is_ok());
        assert!(validate_amount_range("amount", limit + one_cent).is_err());
        assert!(validate_amount_range("amount", Money::from_cents(i64::MIN)).is_err());

        assert!(validate_opening_balance(limit + one_cent).is_err());
        assert!(matches!(
            validate_adjustment_amount("surcharge", Money::from_cents(i64::MAX)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
