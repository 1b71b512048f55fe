//! # meridian-db: Database Layer for Meridian POS
//!
//! This crate provides database access for the Meridian POS back end.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Meridian POS Data Flow                           │
//! │                                                                         │
//! │  SaleSettlementEngine::close_sale                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   meridian-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ RegisterRepo  │    │ 0001_initial │  │   │
//! │  │   │ begin()       │    │ LedgerRepo    │    │ _schema.sql  │  │   │
//! │  │   │ acquire()     │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meridian_db::{Database, DbConfig, SaleRepository};
//!
//! let db = Database::new(DbConfig::new("meridian.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! let sale = SaleRepository::create(&mut tx, &user_id, None, None).await?;
//! meridian_db::commit(tx).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{commit, Database, DbConfig};

pub use repository::adjustment::AdjustmentRepository;
pub use repository::catalog::{PaymentDocumentRepository, PaymentTypeRepository};
pub use repository::ledger::LedgerRepository;
pub use repository::movement::{CardTransactionRepository, StockMovementRepository};
pub use repository::product::ProductRepository;
pub use repository::receivable::{NewInstallment, ReceivableRepository};
pub use repository::register::{RegisterRepository, OPEN_REGISTER_UNIQUE_COLUMN};
pub use repository::sale::{SaleClosing, SaleRepository};
pub use repository::user::UserRepository;

/// Connection type every repository borrows.
pub use sqlx::SqliteConnection;
