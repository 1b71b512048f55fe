//! # Collaborators
//!
//! Interfaces the services consume for work they do not own, plus the
//! built-in implementations backed by the local SQLite store.
//!
//! ## Transaction Sharing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleSettlementEngine::close_sale                                      │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin()                                       │
//! │       ├── ReceivableRepository::create(&mut tx, ...)                   │
//! │       ├── CardSettlement::charge(&mut tx, amount, document)            │
//! │       ├── Inventory::move_stock(&mut tx, sale_id, Exit)                │
//! │       └── commit(tx)                                                   │
//! │                                                                         │
//! │  Collaborators borrow the caller's connection, so whatever they write  │
//! │  commits or rolls back together with the service operation.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier as _};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use meridian_core::{Direction, Money, PaymentDocument};
use meridian_db::{
    CardTransactionRepository, DbError, ProductRepository, SaleRepository, SqliteConnection,
    StockMovementRepository,
};

// =============================================================================
// Errors
// =============================================================================

/// Failure inside a collaborator. Always reported to callers as Infra.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Inventory movement failed: {0}")]
    Inventory(String),

    #[error("Card settlement failed: {0}")]
    CardSettlement(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] DbError),
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

// =============================================================================
// Traits
// =============================================================================

/// Stock on hand.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Moves every item of a settled sale in one call.
    async fn move_stock(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        direction: Direction,
    ) -> CollaboratorResult<()>;

    /// Applies one signed correction to a product.
    async fn adjust_stock(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        delta: i64,
        direction: Direction,
        reason: &str,
        date: NaiveDate,
    ) -> CollaboratorResult<()>;
}

/// Settles an immediate card installment. Card settlement keeps its own
/// records, so no register ledger entry is written for it.
#[async_trait]
pub trait CardSettlement: Send + Sync {
    async fn charge(
        &self,
        conn: &mut SqliteConnection,
        amount: Money,
        document: &PaymentDocument,
    ) -> CollaboratorResult<()>;
}

/// Checks a plain password against a stored credential.
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

// =============================================================================
// SQLite Inventory
// =============================================================================

/// Updates `products.stock_quantity` and records a stock movement per change.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteInventory;

#[async_trait]
impl Inventory for SqliteInventory {
    async fn move_stock(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        direction: Direction,
    ) -> CollaboratorResult<()> {
        let items = SaleRepository::get_items(conn, sale_id).await?;
        let reason = format!("Sale {}", sale_id);
        let today = Utc::now().date_naive();

        debug!(sale_id = %sale_id, items = items.len(), ?direction, "Moving sale stock");

        for item in &items {
            let quantity = match direction {
                Direction::Entry => item.quantity,
                Direction::Exit => -item.quantity,
            };

            ProductRepository::apply_stock_delta(conn, &item.product_id, quantity).await?;
            StockMovementRepository::insert(
                conn,
                &item.product_id,
                quantity,
                direction,
                &reason,
                today,
            )
            .await?;
        }

        Ok(())
    }

    async fn adjust_stock(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        delta: i64,
        direction: Direction,
        reason: &str,
        date: NaiveDate,
    ) -> CollaboratorResult<()> {
        if delta == 0 {
            return Err(CollaboratorError::Inventory(format!(
                "zero adjustment for product {}",
                product_id
            )));
        }

        ProductRepository::apply_stock_delta(conn, product_id, delta).await?;
        StockMovementRepository::insert(conn, product_id, delta, direction, reason, date).await?;

        Ok(())
    }
}

// =============================================================================
// SQLite Card Settlement
// =============================================================================

/// Records a card transaction for every charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCardSettlement;

#[async_trait]
impl CardSettlement for SqliteCardSettlement {
    async fn charge(
        &self,
        conn: &mut SqliteConnection,
        amount: Money,
        document: &PaymentDocument,
    ) -> CollaboratorResult<()> {
        if !document.tender_kind.is_card() {
            return Err(CollaboratorError::CardSettlement(format!(
                "document {} is not a card tender ({})",
                document.id, document.tender_kind
            )));
        }

        CardTransactionRepository::insert(conn, &document.id, amount).await?;
        Ok(())
    }
}

// =============================================================================
// Argon2
// =============================================================================

/// Verifies argon2 PHC strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl PasswordVerifier for Argon2Verifier {
    fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hashes a password into an argon2 PHC string with a random salt.
pub fn hash_password(plain: &str) -> CollaboratorResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CollaboratorError::Hashing(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("drawer-secret").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(Argon2Verifier.verify("drawer-secret", &hash));
        assert!(!Argon2Verifier.verify("wrong", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!Argon2Verifier.verify("anything", "not-a-phc-string"));
        assert!(!Argon2Verifier.verify("", ""));
    }
}
