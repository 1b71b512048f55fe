//! # Ledger Entry Repository
//!
//! Insert and read only: entries are never updated or deleted.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use meridian_core::LedgerEntry;

#[derive(Debug, Clone, Copy)]
pub struct LedgerRepository;

impl LedgerRepository {
    pub async fn insert(conn: &mut SqliteConnection, entry: &LedgerEntry) -> DbResult<()> {
        debug!(
            register_id = %entry.register_id,
            kind = ?entry.kind,
            amount_cents = entry.amount_cents,
            "Appending ledger entry"
        );

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, register_id, description, amount_cents,
                direction, kind, user_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.register_id)
        .bind(&entry.description)
        .bind(entry.amount_cents)
        .bind(entry.direction)
        .bind(entry.kind)
        .bind(&entry.user_id)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Entries of a register in the order they were appended.
    pub async fn list_by_register(
        conn: &mut SqliteConnection,
        register_id: &str,
    ) -> DbResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, register_id, description, amount_cents, direction, kind, user_id, created_at
            FROM ledger_entries
            WHERE register_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(register_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }
}
