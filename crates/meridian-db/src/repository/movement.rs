//! # Stock Movement and Card Transaction Repositories
//!
//! Records written by the built-in inventory and card settlement
//! collaborators. Both are insert-only audit trails.

use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use meridian_core::{CardTransaction, Direction, Money, StockMovement};

// =============================================================================
// Stock Movements
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct StockMovementRepository;

impl StockMovementRepository {
    /// Records a movement. `quantity` is already signed.
    pub async fn insert(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
        direction: Direction,
        reason: &str,
        moved_on: NaiveDate,
    ) -> DbResult<StockMovement> {
        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            quantity,
            direction,
            reason: reason.to_string(),
            moved_on,
            created_at: Utc::now(),
        };

        debug!(product_id = %product_id, quantity, reason = %reason, "Recording stock movement");

        sqlx::query(
            r#"
            INSERT INTO stock_movements (id, product_id, quantity, direction, reason, moved_on, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.quantity)
        .bind(movement.direction)
        .bind(&movement.reason)
        .bind(movement.moved_on)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(movement)
    }

    pub async fn list_by_reason(
        conn: &mut SqliteConnection,
        reason: &str,
    ) -> DbResult<Vec<StockMovement>> {
        Ok(sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, quantity, direction, reason, moved_on, created_at
            FROM stock_movements
            WHERE reason = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(reason)
        .fetch_all(&mut *conn)
        .await?)
    }
}

// =============================================================================
// Card Transactions
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct CardTransactionRepository;

impl CardTransactionRepository {
    pub async fn insert(
        conn: &mut SqliteConnection,
        payment_document_id: &str,
        amount: Money,
    ) -> DbResult<CardTransaction> {
        let transaction = CardTransaction {
            id: Uuid::new_v4().to_string(),
            payment_document_id: payment_document_id.to_string(),
            amount_cents: amount.cents(),
            created_at: Utc::now(),
        };

        debug!(payment_document_id = %payment_document_id, amount = %amount, "Recording card transaction");

        sqlx::query(
            r#"
            INSERT INTO card_transactions (id, payment_document_id, amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.payment_document_id)
        .bind(transaction.amount_cents)
        .bind(transaction.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(transaction)
    }

    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<CardTransaction>> {
        Ok(sqlx::query_as::<_, CardTransaction>(
            r#"
            SELECT id, payment_document_id, amount_cents, created_at
            FROM card_transactions
            ORDER BY created_at, rowid
            "#,
        )
        .fetch_all(&mut *conn)
        .await?)
    }
}
