//! # Stock Adjustment Repository
//!
//! ## Adjustment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create() ──► Pending ──mark_processed()──► Processed (terminal)        │
//! │                 │                                                       │
//! │                 ├── add_line() / remove_line()                          │
//! │                 └── delete()  (lines cascade)                           │
//! │                                                                         │
//! │  Every write after create() is guarded by status = 'pending'.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use meridian_core::{AdjustmentStatus, StockAdjustment, StockAdjustmentLine};

const ADJUSTMENT_COLUMNS: &str =
    "id, status, created_by, created_on, observation, processed_on, created_at";

#[derive(Debug, Clone, Copy)]
pub struct AdjustmentRepository;

impl AdjustmentRepository {
    /// Creates a pending adjustment owned by `user_id`.
    pub async fn create(
        conn: &mut SqliteConnection,
        user_id: &str,
        created_on: NaiveDate,
    ) -> DbResult<StockAdjustment> {
        let adjustment = StockAdjustment {
            id: Uuid::new_v4().to_string(),
            status: AdjustmentStatus::Pending,
            created_by: user_id.to_string(),
            created_on,
            observation: None,
            processed_on: None,
            created_at: Utc::now(),
        };

        debug!(id = %adjustment.id, user_id = %user_id, "Creating stock adjustment");

        sqlx::query(
            r#"
            INSERT INTO stock_adjustments (id, status, created_by, created_on, observation, processed_on, created_at)
            VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5)
            "#,
        )
        .bind(&adjustment.id)
        .bind(adjustment.status)
        .bind(&adjustment.created_by)
        .bind(adjustment.created_on)
        .bind(adjustment.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(adjustment)
    }

    pub async fn get_by_id(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<StockAdjustment>> {
        let sql = format!("SELECT {ADJUSTMENT_COLUMNS} FROM stock_adjustments WHERE id = ?1");

        Ok(sqlx::query_as::<_, StockAdjustment>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?)
    }

    /// All adjustments, newest first.
    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<StockAdjustment>> {
        let sql = format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM stock_adjustments ORDER BY created_at DESC"
        );

        Ok(sqlx::query_as::<_, StockAdjustment>(&sql)
            .fetch_all(&mut *conn)
            .await?)
    }

    pub async fn add_line(
        conn: &mut SqliteConnection,
        adjustment_id: &str,
        product_id: &str,
        delta: i64,
    ) -> DbResult<StockAdjustmentLine> {
        let line = StockAdjustmentLine {
            id: Uuid::new_v4().to_string(),
            adjustment_id: adjustment_id.to_string(),
            product_id: product_id.to_string(),
            delta,
        };

        debug!(adjustment_id = %adjustment_id, product_id = %product_id, delta, "Adding adjustment line");

        sqlx::query(
            r#"
            INSERT INTO stock_adjustment_lines (id, adjustment_id, product_id, delta)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&line.id)
        .bind(&line.adjustment_id)
        .bind(&line.product_id)
        .bind(line.delta)
        .execute(&mut *conn)
        .await?;

        Ok(line)
    }

    /// Removes a line. Returns `false` if it was not on this adjustment.
    pub async fn remove_line(
        conn: &mut SqliteConnection,
        adjustment_id: &str,
        line_id: &str,
    ) -> DbResult<bool> {
        let result =
            sqlx::query("DELETE FROM stock_adjustment_lines WHERE id = ?1 AND adjustment_id = ?2")
                .bind(line_id)
                .bind(adjustment_id)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lines in insertion order.
    pub async fn lines(
        conn: &mut SqliteConnection,
        adjustment_id: &str,
    ) -> DbResult<Vec<StockAdjustmentLine>> {
        Ok(sqlx::query_as::<_, StockAdjustmentLine>(
            r#"
            SELECT id, adjustment_id, product_id, delta
            FROM stock_adjustment_lines
            WHERE adjustment_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(adjustment_id)
        .fetch_all(&mut *conn)
        .await?)
    }

    /// Moves a pending adjustment to Processed.
    ///
    /// ## Returns
    /// `false` when it was not pending any more.
    pub async fn mark_processed(
        conn: &mut SqliteConnection,
        adjustment_id: &str,
        observation: Option<&str>,
        processed_on: NaiveDate,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE stock_adjustments SET
                status = 'processed',
                observation = ?2,
                processed_on = ?3
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(adjustment_id)
        .bind(observation)
        .bind(processed_on)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a pending adjustment and its lines.
    ///
    /// ## Returns
    /// `false` when it was missing or already processed.
    pub async fn delete_pending(conn: &mut SqliteConnection, adjustment_id: &str) -> DbResult<bool> {
        let result =
            sqlx::query("DELETE FROM stock_adjustments WHERE id = ?1 AND status = 'pending'")
                .bind(adjustment_id)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
