//! # Domain Types
//!
//! Core domain types used throughout Meridian POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Sales                    Payments                 Registers            │
//! │  ─────────────────        ─────────────────        ─────────────────    │
//! │  Sale (Open|Closed)       PaymentType              CashRegister         │
//! │  SaleItem                 PaymentDocument          LedgerEntry          │
//! │  Product                  Receivable               RegisterKind         │
//! │                           Installment                                   │
//! │                           CardTransaction          Stock                │
//! │                                                    ─────────────────    │
//! │                                                    StockAdjustment      │
//! │                                                    StockAdjustmentLine  │
//! │                                                    StockMovement        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Terminal States
//! A Closed sale, a Closed register and a Processed adjustment never change
//! again. The database layer guards each terminal transition with a
//! conditional UPDATE.
//!
//! ## Money Columns
//! Row structs keep the raw `*_cents` integers so they map 1:1 onto SQLite
//! columns; accessor methods return [`Money`].

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::schedule::PaymentSchedule;

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Items can still be added and removed.
    #[default]
    Open,
    /// Settled. Terminal.
    Closed,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Open => "open",
            SaleStatus::Closed => "closed",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product that can be sold or adjusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Stock on hand. May go negative when sales outrun adjustments.
    pub stock_quantity: i64,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale, open while items are being added and closed once settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub status: SaleStatus,
    /// Customer reference. Required for deferred tenders.
    pub customer_id: Option<String>,
    /// Sum of the item line totals.
    pub products_total_cents: i64,
    pub discount_cents: i64,
    pub surcharge_cents: i64,
    /// products + surcharge - discount, written at settlement.
    pub total_cents: i64,
    pub payment_type_id: Option<String>,
    /// User who opened the sale.
    pub user_id: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn products_total(&self) -> Money {
        Money::from_cents(self.products_total_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SaleStatus::Open
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tender Kind
// =============================================================================

/// How a payment document is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TenderKind {
    Cash,
    DebitCard,
    CreditCard,
    /// Store credit, paid later through installments.
    Deferred,
    Check,
    Other,
}

impl TenderKind {
    /// Debit and credit cards go through the card settlement collaborator.
    #[inline]
    pub fn is_card(&self) -> bool {
        matches!(self, TenderKind::DebitCard | TenderKind::CreditCard)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TenderKind::Cash => "cash",
            TenderKind::DebitCard => "debit_card",
            TenderKind::CreditCard => "credit_card",
            TenderKind::Deferred => "deferred",
            TenderKind::Check => "check",
            TenderKind::Other => "other",
        }
    }
}

impl fmt::Display for TenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Document
// =============================================================================

/// A tender reference (e.g. "Cash", "Visa credit") chosen per installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentDocument {
    pub id: String,
    pub description: String,
    pub tender_kind: TenderKind,
}

// =============================================================================
// Payment Type
// =============================================================================

/// A payment plan offered at the counter, e.g. "Cash" (`00`) or
/// "30/60 days" (`30/60`).
///
/// The schedule is decoded when the row is loaded, never re-parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentType {
    pub id: String,
    pub description: String,
    pub schedule: PaymentSchedule,
}

// =============================================================================
// Receivables
// =============================================================================

/// Accounts-receivable header. One per settled sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Receivable {
    pub id: String,
    pub sale_id: String,
    pub customer_id: Option<String>,
    pub description: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Receivable {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One deferred payment owed against a receivable. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Installment {
    pub id: String,
    pub receivable_id: String,
    /// 1-based, counts deferred tenders only.
    pub sequence: i64,
    pub amount_cents: i64,
    pub interest_cents: i64,
    pub fine_cents: i64,
    /// Equal to the amount at creation.
    pub outstanding_cents: i64,
    pub issued_at: DateTime<Utc>,
    pub due_date: NaiveDate,
}

impl Installment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

}

/// Record of a card charge made during settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CardTransaction {
    pub id: String,
    pub payment_document_id: String,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl CardTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Cash Registers
// =============================================================================

/// Kind of cash register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    /// The daily till at the point of sale.
    Drawer,
    Safe,
    Bank,
}

/// Per-kind defaults applied when a register is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterProfile {
    /// Used when the draft's description is blank.
    pub default_description: &'static str,
    /// Description of the opening balance ledger entry.
    pub opening_reason: &'static str,
    /// At most one open register of this kind may exist.
    pub unique_while_open: bool,
}

impl RegisterKind {
    pub const ALL: [RegisterKind; 3] = [RegisterKind::Drawer, RegisterKind::Safe, RegisterKind::Bank];

    pub fn profile(&self) -> RegisterProfile {
        match self {
            RegisterKind::Drawer => RegisterProfile {
                default_description: "Daily cash drawer",
                opening_reason: "Cash drawer opening",
                unique_while_open: true,
            },
            RegisterKind::Safe => RegisterProfile {
                default_description: "Safe",
                opening_reason: "Safe opening",
                unique_while_open: true,
            },
            RegisterKind::Bank => RegisterProfile {
                default_description: "Bank account",
                opening_reason: "Bank account opening",
                unique_while_open: false,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterKind::Drawer => "drawer",
            RegisterKind::Safe => "safe",
            RegisterKind::Bank => "bank",
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cash register. Open while `closed_at` is null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashRegister {
    pub id: String,
    pub kind: RegisterKind,
    pub description: String,
    pub opening_balance_cents: i64,
    /// Moves with every ledger entry while open.
    pub running_total_cents: i64,
    /// Frozen copy of the running total, set on close.
    pub closing_balance_cents: Option<i64>,
    pub opened_by: String,
    pub opened_on: NaiveDate,
    /// Bank kind only, digits only.
    pub agency: Option<String>,
    /// Bank kind only, digits only.
    pub account: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashRegister {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    #[inline]
    pub fn running_total(&self) -> Money {
        Money::from_cents(self.running_total_cents)
    }

    #[inline]
    pub fn opening_balance(&self) -> Money {
        Money::from_cents(self.opening_balance_cents)
    }

    pub fn closing_balance(&self) -> Option<Money> {
        self.closing_balance_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Direction of a ledger entry or stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Entry,
    Exit,
}

impl Direction {
    /// Positive deltas enter, everything else exits.
    #[inline]
    pub fn for_delta(delta: i64) -> Self {
        if delta > 0 {
            Direction::Entry
        } else {
            Direction::Exit
        }
    }

    /// Applies this direction's sign to an unsigned magnitude.
    #[inline]
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            Direction::Entry => amount.abs(),
            Direction::Exit => -amount.abs(),
        }
    }
}

/// What a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    OpeningBalance,
    Receipt,
    Payment,
    Deposit,
    Withdrawal,
    Transfer,
}

/// An append-only movement on a cash register.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: String,
    pub register_id: String,
    pub description: String,
    /// Signed: negative for Exit.
    pub amount_cents: i64,
    pub direction: Direction,
    pub kind: LedgerEntryKind,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Status of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStatus {
    #[default]
    Pending,
    /// Terminal.
    Processed,
}

/// A batch of inventory corrections applied together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAdjustment {
    pub id: String,
    pub status: AdjustmentStatus,
    pub created_by: String,
    pub created_on: NaiveDate,
    /// Set when processed.
    pub observation: Option<String>,
    pub processed_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl StockAdjustment {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == AdjustmentStatus::Pending
    }
}

/// One product correction inside an adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAdjustmentLine {
    pub id: String,
    pub adjustment_id: String,
    pub product_id: String,
    /// Signed quantity. Never zero.
    pub delta: i64,
}

impl StockAdjustmentLine {
    #[inline]
    pub fn direction(&self) -> Direction {
        Direction::for_delta(self.delta)
    }
}

/// An applied change to a product's stock on hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// Signed quantity applied to stock.
    pub quantity: i64,
    pub direction: Direction,
    pub reason: String,
    pub moved_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Users
// =============================================================================

/// An operator account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    /// argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_profiles() {
        let drawer = RegisterKind::Drawer.profile();
        assert_eq!(drawer.default_description, "Daily cash drawer");
        assert_eq!(drawer.opening_reason, "Cash drawer opening");
        assert!(drawer.unique_while_open);

        assert!(RegisterKind::Safe.profile().unique_while_open);
        assert!(!RegisterKind::Bank.profile().unique_while_open);
    }

    #[test]
    fn test_direction_for_delta() {
        assert_eq!(Direction::for_delta(5), Direction::Entry);
        assert_eq!(Direction::for_delta(-3), Direction::Exit);
    }

    #[test]
    fn test_direction_signed() {
        let amount = Money::from_cents(1500);
        assert_eq!(Direction::Entry.signed(amount).cents(), 1500);
        assert_eq!(Direction::Exit.signed(amount).cents(), -1500);
        assert_eq!(Direction::Exit.signed(-amount).cents(), -1500);
    }

    #[test]
    fn test_tender_kind_card() {
        assert!(TenderKind::DebitCard.is_card());
        assert!(TenderKind::CreditCard.is_card());
        assert!(!TenderKind::Cash.is_card());
        assert!(!TenderKind::Deferred.is_card());
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(SaleStatus::default(), SaleStatus::Open);
        assert_eq!(AdjustmentStatus::default(), AdjustmentStatus::Pending);
    }

    #[test]
    fn test_enum_serialization() {
        let json = serde_json::to_string(&TenderKind::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");

        let kind: LedgerEntryKind = serde_json::from_str("\"opening_balance\"").unwrap();
        assert_eq!(kind, LedgerEntryKind::OpeningBalance);
    }
}
