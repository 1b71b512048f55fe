//! # Stock Adjustment Processor
//!
//! Batches of manual inventory corrections, applied all at once.
//!
//! ## Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process(id, observation)                     one transaction          │
//! │                                                                         │
//! │   ├── missing → NotFound, processed → StateConflict                    │
//! │   ├── for each line:                                                   │
//! │   │     direction = Entry if delta > 0 else Exit                       │
//! │   │     Inventory::adjust_stock(product, delta, direction,             │
//! │   │                             "Stock adjustment <id>", today)        │
//! │   ├── UPDATE ... status = 'processed' WHERE status = 'pending'         │
//! │   │     0 rows → StateConflict (someone else processed it)             │
//! │   └── commit                                                           │
//! │                                                                         │
//! │  Any line failure drops the transaction: no stock moves and the        │
//! │  adjustment stays Pending.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::collaborators::{Inventory, SqliteInventory};
use crate::context::Actor;
use crate::error::{Failure, FailureResult, ServiceResult};
use meridian_core::validation::{validate_adjustment_delta, validate_text};
use meridian_core::{CoreError, StockAdjustment, StockAdjustmentLine, StockMovement};
use meridian_db::{
    commit, AdjustmentRepository, Database, ProductRepository, SqliteConnection,
    StockMovementRepository,
};

/// Reason recorded on every stock movement an adjustment produces.
pub fn adjustment_reason(adjustment_id: &str) -> String {
    format!("Stock adjustment {}", adjustment_id)
}

/// An adjustment together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentDetail {
    pub adjustment: StockAdjustment,
    pub lines: Vec<StockAdjustmentLine>,
}

#[derive(Clone)]
pub struct StockAdjustmentProcessor {
    db: Database,
    inventory: Arc<dyn Inventory>,
}

impl StockAdjustmentProcessor {
    pub fn new(db: Database, inventory: Arc<dyn Inventory>) -> Self {
        StockAdjustmentProcessor { db, inventory }
    }

    /// Processor backed by the SQLite inventory.
    pub fn with_sqlite_inventory(db: Database) -> Self {
        Self::new(db, Arc::new(SqliteInventory))
    }

    /// Creates a pending adjustment owned by the actor, dated today.
    pub async fn create(&self, actor: &Actor) -> ServiceResult<String> {
        async {
            let mut tx = self.db.begin().await?;
            actor.resolve(&mut tx).await?;

            let adjustment =
                AdjustmentRepository::create(&mut tx, &actor.user_id, Utc::now().date_naive())
                    .await?;
            commit(tx).await?;

            info!(adjustment_id = %adjustment.id, user_id = %actor.user_id, "Stock adjustment created");
            Ok::<_, Failure>(adjustment.id)
        }
        .await
        .map_err(|f| f.at_boundary("create_adjustment", &actor.user_id))
    }

    /// Adds a product correction to a pending adjustment.
    pub async fn add_line(
        &self,
        adjustment_id: &str,
        product_id: &str,
        delta: i64,
    ) -> ServiceResult<StockAdjustmentLine> {
        async {
            validate_adjustment_delta(delta)?;

            let mut tx = self.db.begin().await?;
            load_pending(&mut tx, adjustment_id).await?;

            if ProductRepository::get_by_id(&mut tx, product_id).await?.is_none() {
                return Err(Failure::from(CoreError::not_found("Product", product_id)));
            }

            let line = AdjustmentRepository::add_line(&mut tx, adjustment_id, product_id, delta).await?;
            commit(tx).await?;

            Ok::<_, Failure>(line)
        }
        .await
        .map_err(|f| f.at_boundary("add_adjustment_line", adjustment_id))
    }

    /// Removes a line from a pending adjustment.
    pub async fn remove_line(&self, adjustment_id: &str, line_id: &str) -> ServiceResult<()> {
        async {
            let mut tx = self.db.begin().await?;
            load_pending(&mut tx, adjustment_id).await?;

            if !AdjustmentRepository::remove_line(&mut tx, adjustment_id, line_id).await? {
                return Err(Failure::from(CoreError::not_found("Adjustment line", line_id)));
            }
            commit(tx).await?;

            Ok::<_, Failure>(())
        }
        .await
        .map_err(|f| f.at_boundary("remove_adjustment_line", adjustment_id))
    }

    /// Applies every line and marks the adjustment Processed.
    pub async fn process(
        &self,
        adjustment_id: &str,
        observation: Option<&str>,
    ) -> ServiceResult<String> {
        self.try_process(adjustment_id, observation)
            .await
            .map_err(|f| f.at_boundary("process_adjustment", adjustment_id))
    }

    async fn try_process(
        &self,
        adjustment_id: &str,
        observation: Option<&str>,
    ) -> FailureResult<String> {
        let observation = validate_text("observation", observation)?;

        let mut tx = self.db.begin().await?;
        load_pending(&mut tx, adjustment_id).await?;

        let lines = AdjustmentRepository::lines(&mut tx, adjustment_id).await?;
        let reason = adjustment_reason(adjustment_id);
        let today = Utc::now().date_naive();

        for line in &lines {
            debug!(
                adjustment_id = %adjustment_id,
                product_id = %line.product_id,
                delta = line.delta,
                "Applying adjustment line"
            );

            self.inventory
                .adjust_stock(
                    &mut tx,
                    &line.product_id,
                    line.delta,
                    line.direction(),
                    &reason,
                    today,
                )
                .await?;
        }

        let marked = AdjustmentRepository::mark_processed(
            &mut tx,
            adjustment_id,
            observation.as_deref(),
            today,
        )
        .await?;
        if !marked {
            return Err(already_processed(adjustment_id));
        }

        commit(tx).await?;

        info!(adjustment_id = %adjustment_id, lines = lines.len(), "Stock adjustment processed");

        Ok(format!(
            "Stock adjustment {} processed ({} lines)",
            adjustment_id,
            lines.len()
        ))
    }

    /// Deletes a pending adjustment and its lines.
    pub async fn remove(&self, adjustment_id: &str) -> ServiceResult<()> {
        async {
            let mut tx = self.db.begin().await?;
            load_pending(&mut tx, adjustment_id).await?;

            if !AdjustmentRepository::delete_pending(&mut tx, adjustment_id).await? {
                return Err(already_processed(adjustment_id));
            }
            commit(tx).await?;

            info!(adjustment_id = %adjustment_id, "Stock adjustment removed");
            Ok::<_, Failure>(())
        }
        .await
        .map_err(|f| f.at_boundary("remove_adjustment", adjustment_id))
    }

    pub async fn get(&self, adjustment_id: &str) -> ServiceResult<AdjustmentDetail> {
        async {
            let mut conn = self.db.acquire().await?;
            let adjustment = AdjustmentRepository::get_by_id(&mut conn, adjustment_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Stock adjustment", adjustment_id))?;
            let lines = AdjustmentRepository::lines(&mut conn, adjustment_id).await?;

            Ok::<_, Failure>(AdjustmentDetail { adjustment, lines })
        }
        .await
        .map_err(|f| f.at_boundary("get_adjustment", adjustment_id))
    }

    /// Stock movements the adjustment produced. Empty while pending.
    pub async fn movements(&self, adjustment_id: &str) -> ServiceResult<Vec<StockMovement>> {
        async {
            let mut conn = self.db.acquire().await?;
            if AdjustmentRepository::get_by_id(&mut conn, adjustment_id).await?.is_none() {
                return Err(Failure::from(CoreError::not_found(
                    "Stock adjustment",
                    adjustment_id,
                )));
            }

            let reason = adjustment_reason(adjustment_id);
            Ok::<_, Failure>(StockMovementRepository::list_by_reason(&mut conn, &reason).await?)
        }
        .await
        .map_err(|f| f.at_boundary("adjustment_movements", adjustment_id))
    }

    /// All adjustments, newest first.
    pub async fn list(&self) -> ServiceResult<Vec<StockAdjustment>> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(AdjustmentRepository::list(&mut conn).await?)
        }
        .await
        .map_err(|f| f.at_boundary("list_adjustments", "*"))
    }
}

/// Loads an adjustment that can still be edited or processed.
async fn load_pending(
    conn: &mut SqliteConnection,
    adjustment_id: &str,
) -> FailureResult<StockAdjustment> {
    let adjustment = AdjustmentRepository::get_by_id(conn, adjustment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Stock adjustment", adjustment_id))?;

    if !adjustment.is_pending() {
        return Err(already_processed(adjustment_id));
    }

    Ok(adjustment)
}

fn already_processed(adjustment_id: &str) -> Failure {
    CoreError::AdjustmentProcessed {
        adjustment_id: adjustment_id.to_string(),
    }
    .into()
}
