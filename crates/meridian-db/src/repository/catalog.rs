//! # Payment Catalog Repository
//!
//! Payment types (installment plans) and payment documents (tenders).
//!
//! ## Schedule Decoding
//! ```text
//! payment_types.schedule = '00/30/60'   (TEXT column)
//!        │
//!        ▼  PaymentTypeRow → PaymentType  (TryFrom, once per load)
//!        │
//! PaymentType.schedule = [Immediate, Deferred{30}, Deferred{60}]
//! ```
//! A row whose schedule cannot be decoded surfaces as `DbError::Corrupt`
//! instead of reaching settlement half-parsed.

use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::{PaymentDocument, PaymentSchedule, PaymentType, TenderKind};

// =============================================================================
// Payment Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PaymentTypeRow {
    id: String,
    description: String,
    schedule: String,
}

impl TryFrom<PaymentTypeRow> for PaymentType {
    type Error = DbError;

    fn try_from(row: PaymentTypeRow) -> Result<Self, Self::Error> {
        let schedule = PaymentSchedule::parse(&row.schedule).map_err(|e| DbError::Corrupt {
            entity: "PaymentType".to_string(),
            id: row.id.clone(),
            reason: e.to_string(),
        })?;

        Ok(PaymentType {
            id: row.id,
            description: row.description,
            schedule,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaymentTypeRepository;

impl PaymentTypeRepository {
    /// Inserts a payment type, storing the schedule in canonical form.
    pub async fn insert(
        conn: &mut SqliteConnection,
        description: &str,
        schedule: &PaymentSchedule,
    ) -> DbResult<PaymentType> {
        let payment_type = PaymentType {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            schedule: schedule.clone(),
        };

        debug!(id = %payment_type.id, schedule = %schedule, "Inserting payment type");

        sqlx::query("INSERT INTO payment_types (id, description, schedule) VALUES (?1, ?2, ?3)")
            .bind(&payment_type.id)
            .bind(&payment_type.description)
            .bind(schedule.to_string())
            .execute(&mut *conn)
            .await?;

        Ok(payment_type)
    }

    /// Loads a payment type and decodes its schedule.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PaymentType>> {
        let row = sqlx::query_as::<_, PaymentTypeRow>(
            "SELECT id, description, schedule FROM payment_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(PaymentType::try_from).transpose()
    }

    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<PaymentType>> {
        let rows = sqlx::query_as::<_, PaymentTypeRow>(
            "SELECT id, description, schedule FROM payment_types ORDER BY description",
        )
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(PaymentType::try_from).collect()
    }
}

// =============================================================================
// Payment Documents
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct PaymentDocumentRepository;

impl PaymentDocumentRepository {
    pub async fn insert(
        conn: &mut SqliteConnection,
        description: &str,
        tender_kind: TenderKind,
    ) -> DbResult<PaymentDocument> {
        let document = PaymentDocument {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            tender_kind,
        };

        debug!(id = %document.id, tender = %tender_kind, "Inserting payment document");

        sqlx::query("INSERT INTO payment_documents (id, description, tender_kind) VALUES (?1, ?2, ?3)")
            .bind(&document.id)
            .bind(&document.description)
            .bind(document.tender_kind)
            .execute(&mut *conn)
            .await?;

        Ok(document)
    }

    pub async fn get_by_id(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<PaymentDocument>> {
        let document = sqlx::query_as::<_, PaymentDocument>(
            "SELECT id, description, tender_kind FROM payment_documents WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(document)
    }

    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<PaymentDocument>> {
        let documents = sqlx::query_as::<_, PaymentDocument>(
            "SELECT id, description, tender_kind FROM payment_documents ORDER BY description",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_decodes_schedule() {
        let row = PaymentTypeRow {
            id: "pt-1".to_string(),
            description: "30/60".to_string(),
            schedule: "30/60".to_string(),
        };

        let payment_type = PaymentType::try_from(row).unwrap();
        assert_eq!(payment_type.schedule.len(), 2);
    }

    #[test]
    fn test_row_with_bad_schedule_is_corrupt() {
        let row = PaymentTypeRow {
            id: "pt-2".to_string(),
            description: "broken".to_string(),
            schedule: "soon".to_string(),
        };

        let err = PaymentType::try_from(row).unwrap_err();
        assert!(matches!(err, DbError::Corrupt { ref id, .. } if id == "pt-2"));
    }
}
