//! # meridian-core: Pure Business Logic for Meridian POS
//!
//! This crate holds the domain model and every rule that can be decided
//! without touching storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Meridian POS Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 meridian-engine (services)                      │   │
//! │  │   SaleSettlementEngine • CashRegisterLedger • StockAdjustments  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ meridian-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ schedule  │  │check_digit│  │   │
//! │  │   │   Sale    │  │   Money   │  │  00/30/60 │  │  mod 11   │  │   │
//! │  │   │ Register  │  │ allocate  │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  meridian-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, CashRegister, StockAdjustment, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`schedule`] - Payment schedules decoded from `"00/30/60"` definitions
//! - [`check_digit`] - Modulo 11 check digit for invoice access keys
//! - [`error`] - Domain error types and the error taxonomy
//! - [`validation`] - Field-level input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use meridian_core::money::Money;
//! use meridian_core::schedule::PaymentSchedule;
//!
//! let total = Money::parse_decimal("100.00").unwrap();
//! let schedule = PaymentSchedule::parse("30/60/90").unwrap();
//!
//! // Leftover cents go to the earliest installments
//! let shares = total.allocate(schedule.len());
//! assert_eq!(shares[0].cents(), 3334);
//! assert_eq!(shares[2].cents(), 3333);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod check_digit;
pub mod error;
pub mod money;
pub mod schedule;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use check_digit::compute_check_digit;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use schedule::{PaymentSchedule, ScheduleEntry};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single sale item.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of notes, observations and descriptions.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Largest amount, in major units, accepted from callers in either direction.
///
/// Keeps every sum of a settlement far below `i64::MAX` cents.
pub const MAX_AMOUNT: i64 = 999_999_999;
