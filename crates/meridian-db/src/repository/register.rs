//! # Cash Register Repository
//!
//! ## Register Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Unopened ──insert()──► Open ──close()──► Closed (terminal)             │
//! │                          │                                              │
//! │                          └── apply_to_running_total() per ledger entry  │
//! │                                                                         │
//! │  Open  ⇔ closed_at IS NULL                                              │
//! │  close() freezes closing_balance_cents = running_total_cents in the    │
//! │  same UPDATE, guarded by closed_at IS NULL.                            │
//! │                                                                         │
//! │  idx_cash_registers_one_open: one open drawer, one open safe.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use meridian_core::{CashRegister, RegisterKind};

const REGISTER_COLUMNS: &str = r#"
    id, kind, description, opening_balance_cents, running_total_cents,
    closing_balance_cents, opened_by, opened_on, agency, account,
    opened_at, closed_at
"#;

/// Column reported by SQLite when the open-register index rejects an insert.
pub const OPEN_REGISTER_UNIQUE_COLUMN: &str = "cash_registers.kind";

#[derive(Debug, Clone, Copy)]
pub struct RegisterRepository;

impl RegisterRepository {
    /// Inserts a register exactly as given.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` on `cash_registers.kind` when a drawer or
    /// safe is already open.
    pub async fn insert(conn: &mut SqliteConnection, register: &CashRegister) -> DbResult<()> {
        debug!(id = %register.id, kind = %register.kind, "Inserting cash register");

        sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, kind, description, opening_balance_cents, running_total_cents,
                closing_balance_cents, opened_by, opened_on, agency, account,
                opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&register.id)
        .bind(register.kind)
        .bind(&register.description)
        .bind(register.opening_balance_cents)
        .bind(register.running_total_cents)
        .bind(register.closing_balance_cents)
        .bind(&register.opened_by)
        .bind(register.opened_on)
        .bind(&register.agency)
        .bind(&register.account)
        .bind(register.opened_at)
        .bind(register.closed_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<CashRegister>> {
        let sql = format!("SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?1");

        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(register)
    }

    /// All registers, most recently opened first.
    pub async fn list_all(conn: &mut SqliteConnection) -> DbResult<Vec<CashRegister>> {
        let sql = format!("SELECT {REGISTER_COLUMNS} FROM cash_registers ORDER BY opened_at DESC");

        Ok(sqlx::query_as::<_, CashRegister>(&sql)
            .fetch_all(&mut *conn)
            .await?)
    }

    /// Open registers of every kind.
    pub async fn list_open(conn: &mut SqliteConnection) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE closed_at IS NULL ORDER BY opened_at DESC"
        );

        Ok(sqlx::query_as::<_, CashRegister>(&sql)
            .fetch_all(&mut *conn)
            .await?)
    }

    /// Open registers of one kind.
    pub async fn list_open_by_kind(
        conn: &mut SqliteConnection,
        kind: RegisterKind,
    ) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE closed_at IS NULL AND kind = ?1 ORDER BY opened_at DESC"
        );

        Ok(sqlx::query_as::<_, CashRegister>(&sql)
            .bind(kind)
            .fetch_all(&mut *conn)
            .await?)
    }

    /// Registers opened on a business date.
    pub async fn list_opened_on(
        conn: &mut SqliteConnection,
        date: NaiveDate,
    ) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE opened_on = ?1 ORDER BY opened_at DESC"
        );

        Ok(sqlx::query_as::<_, CashRegister>(&sql)
            .bind(date)
            .fetch_all(&mut *conn)
            .await?)
    }

    /// The most recent open register opened by a user.
    pub async fn find_open_by_user(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<Option<CashRegister>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE closed_at IS NULL AND opened_by = ?1 ORDER BY opened_at DESC LIMIT 1"
        );

        Ok(sqlx::query_as::<_, CashRegister>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?)
    }

    /// True when a register of this kind is open.
    pub async fn exists_open(conn: &mut SqliteConnection, kind: RegisterKind) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cash_registers WHERE closed_at IS NULL AND kind = ?1)",
        )
        .bind(kind)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    /// Moves the running total of an open register.
    ///
    /// ## Returns
    /// `false` when the register is missing or closed.
    pub async fn apply_to_running_total(
        conn: &mut SqliteConnection,
        register_id: &str,
        delta_cents: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cash_registers SET running_total_cents = running_total_cents + ?2
            WHERE id = ?1 AND closed_at IS NULL
            "#,
        )
        .bind(register_id)
        .bind(delta_cents)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Closes an open register and freezes its balance.
    ///
    /// ## Returns
    /// `false` when the register is missing or already closed.
    pub async fn close(
        conn: &mut SqliteConnection,
        register_id: &str,
        closed_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(register_id = %register_id, "Closing cash register");

        let result = sqlx::query(
            r#"
            UPDATE cash_registers SET
                closed_at = ?2,
                closing_balance_cents = running_total_cents
            WHERE id = ?1 AND closed_at IS NULL
            "#,
        )
        .bind(register_id)
        .bind(closed_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
