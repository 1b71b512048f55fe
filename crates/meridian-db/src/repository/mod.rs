//! # Repository Module
//!
//! Database repository implementations for Meridian POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service operation (meridian-engine)                                   │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  SaleRepository::get_by_id(&mut tx, id)                        │
//! │       │  ReceivableRepository::create(&mut tx, ...)                    │
//! │       │  SaleRepository::close(&mut tx, &closing)                      │
//! │       │  commit(tx)                                                    │
//! │       ▼                                                                 │
//! │  Every repository function borrows `&mut SqliteConnection`:            │
//! │  a transaction and a pooled connection both deref to one, so the       │
//! │  caller decides the atomic unit.                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products and stock on hand
//! - [`SaleRepository`](sale::SaleRepository) - Sales and sale items
//! - [`PaymentTypeRepository`](catalog::PaymentTypeRepository) /
//!   [`PaymentDocumentRepository`](catalog::PaymentDocumentRepository) - Payment catalog
//! - [`ReceivableRepository`](receivable::ReceivableRepository) - Receivables and installments
//! - [`RegisterRepository`](register::RegisterRepository) - Cash registers
//! - [`LedgerRepository`](ledger::LedgerRepository) - Ledger entries
//! - [`AdjustmentRepository`](adjustment::AdjustmentRepository) - Stock adjustments
//! - [`StockMovementRepository`](movement::StockMovementRepository) /
//!   [`CardTransactionRepository`](movement::CardTransactionRepository) - Collaborator records
//! - [`UserRepository`](user::UserRepository) - Operators

pub mod adjustment;
pub mod catalog;
pub mod ledger;
pub mod movement;
pub mod product;
pub mod receivable;
pub mod register;
pub mod sale;
pub mod user;
