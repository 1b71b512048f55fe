//! # Receivable Repository
//!
//! Accounts-receivable headers and their installments.
//!
//! ```text
//! Receivable (one per settled sale, total = products + surcharge - discount)
//!   ├── Installment #1  due today + 30
//!   └── Installment #2  due today + 60
//! ```
//! Both are insert-only.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use meridian_core::{Installment, Money, Receivable};

/// Fields of a new installment.
#[derive(Debug, Clone)]
pub struct NewInstallment<'a> {
    pub receivable_id: &'a str,
    pub sequence: i64,
    pub amount: Money,
    pub issued_at: DateTime<Utc>,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Copy)]
pub struct ReceivableRepository;

impl ReceivableRepository {
    /// Creates a receivable header.
    pub async fn create(
        conn: &mut SqliteConnection,
        sale_id: &str,
        customer_id: Option<&str>,
        description: &str,
        total: Money,
        created_at: DateTime<Utc>,
    ) -> DbResult<Receivable> {
        let receivable = Receivable {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            customer_id: customer_id.map(str::to_string),
            description: description.to_string(),
            total_cents: total.cents(),
            created_at,
        };

        debug!(id = %receivable.id, sale_id = %sale_id, total = %total, "Creating receivable");

        sqlx::query(
            r#"
            INSERT INTO receivables (id, sale_id, customer_id, description, total_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&receivable.id)
        .bind(&receivable.sale_id)
        .bind(&receivable.customer_id)
        .bind(&receivable.description)
        .bind(receivable.total_cents)
        .bind(receivable.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(receivable)
    }

    /// Schedules an installment. Interest and fine start at zero and the
    /// outstanding balance equals the amount.
    pub async fn add_installment(
        conn: &mut SqliteConnection,
        new: &NewInstallment<'_>,
    ) -> DbResult<Installment> {
        let installment = Installment {
            id: Uuid::new_v4().to_string(),
            receivable_id: new.receivable_id.to_string(),
            sequence: new.sequence,
            amount_cents: new.amount.cents(),
            interest_cents: 0,
            fine_cents: 0,
            outstanding_cents: new.amount.cents(),
            issued_at: new.issued_at,
            due_date: new.due_date,
        };

        debug!(
            receivable_id = %installment.receivable_id,
            sequence = installment.sequence,
            amount = %new.amount,
            due_date = %installment.due_date,
            "Scheduling installment"
        );

        sqlx::query(
            r#"
            INSERT INTO installments (
                id, receivable_id, sequence, amount_cents,
                interest_cents, fine_cents, outstanding_cents,
                issued_at, due_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&installment.id)
        .bind(&installment.receivable_id)
        .bind(installment.sequence)
        .bind(installment.amount_cents)
        .bind(installment.interest_cents)
        .bind(installment.fine_cents)
        .bind(installment.outstanding_cents)
        .bind(installment.issued_at)
        .bind(installment.due_date)
        .execute(&mut *conn)
        .await?;

        Ok(installment)
    }

    /// Gets the receivable created for a sale, if it was settled.
    pub async fn get_by_sale(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Option<Receivable>> {
        let receivable = sqlx::query_as::<_, Receivable>(
            r#"
            SELECT id, sale_id, customer_id, description, total_cents, created_at
            FROM receivables
            WHERE sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(receivable)
    }

    /// Installments of a receivable ordered by sequence.
    pub async fn installments(
        conn: &mut SqliteConnection,
        receivable_id: &str,
    ) -> DbResult<Vec<Installment>> {
        let installments = sqlx::query_as::<_, Installment>(
            r#"
            SELECT
                id, receivable_id, sequence, amount_cents,
                interest_cents, fine_cents, outstanding_cents,
                issued_at, due_date
            FROM installments
            WHERE receivable_id = ?1
            ORDER BY sequence
            "#,
        )
        .bind(receivable_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(installments)
    }
}
