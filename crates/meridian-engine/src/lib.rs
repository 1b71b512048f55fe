//! # meridian-engine: Services for Meridian POS
//!
//! The three services that own transactions, plus configuration, tracing
//! setup and the collaborator implementations they run with.
//!
//! ## Service Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SaleSettlementEngine ──────┬──► CashRegisterLedger (cash receipts)     │
//! │   open_sale / add_item      ├──► CardSettlement    (card tenders)       │
//! │   close_sale                ├──► ReceivableRepository (installments)    │
//! │                             └──► Inventory::move_stock                  │
//! │                                                                         │
//! │  CashRegisterLedger ────────────► PasswordVerifier (close)              │
//! │   open / close / entries                                               │
//! │                                                                         │
//! │  StockAdjustmentProcessor ──────► Inventory::adjust_stock               │
//! │   create / add_line / process / remove                                 │
//! │                                                                         │
//! │  Every public operation: one transaction, one error boundary.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meridian_engine::{Actor, EngineConfig, SaleSettlementEngine};
//!
//! let config = EngineConfig::load_or_default(None);
//! meridian_engine::telemetry::init_tracing(&config.logging);
//!
//! let db = meridian_db::Database::new(config.database.to_db_config()).await?;
//! let engine = SaleSettlementEngine::with_sqlite_collaborators(db);
//! let sale_id = engine.open_sale(None, None, &Actor::new(user_id)).await?;
//! ```

pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod settlement;
pub mod stock;
pub mod telemetry;

pub use collaborators::{
    hash_password, Argon2Verifier, CardSettlement, CollaboratorError, Inventory,
    PasswordVerifier, SqliteCardSettlement, SqliteInventory,
};
pub use config::{ConfigError, EngineConfig};
pub use context::Actor;
pub use error::{ServiceError, ServiceResult};
pub use ledger::{CashRegisterLedger, ClosedRegister, RegisterDraft};
pub use settlement::{
    ReceivableDetail, SaleSettlementEngine, SettlementOutcome, SettlementRequest,
};
pub use stock::{AdjustmentDetail, StockAdjustmentProcessor};

pub use meridian_core::ErrorKind;
