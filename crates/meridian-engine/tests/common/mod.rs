//! Shared fixtures for the service integration tests.
//!
//! Every test gets its own in-memory database with one seeded operator.
//! The pool holds a single connection, so helpers acquire and release it
//! before returning.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use meridian_core::{
    Direction, Installment, Money, PaymentDocument, PaymentSchedule, PaymentType, Product,
    Receivable, TenderKind,
};
use meridian_db::{
    Database, DbConfig, PaymentDocumentRepository, PaymentTypeRepository, ProductRepository,
    SqliteConnection, UserRepository,
};
use meridian_engine::collaborators::CollaboratorResult;
use meridian_engine::{
    hash_password, Actor, CardSettlement, CashRegisterLedger, CollaboratorError, Inventory,
    SaleSettlementEngine, SqliteCardSettlement, SqliteInventory, StockAdjustmentProcessor,
};

pub const PASSWORD: &str = "counter-42";

// =============================================================================
// Recording Collaborators
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryCall {
    MoveStock {
        sale_id: String,
        direction: Direction,
    },
    AdjustStock {
        product_id: String,
        delta: i64,
        direction: Direction,
        reason: String,
        date: NaiveDate,
    },
}

/// Delegates to [`SqliteInventory`] and records every call that succeeded.
#[derive(Debug, Default)]
pub struct RecordingInventory {
    calls: Mutex<Vec<InventoryCall>>,
    fail_move_stock: AtomicBool,
    /// 1-based adjust_stock call that fails. 0 = never.
    fail_adjust_on: AtomicUsize,
    adjust_attempts: AtomicUsize,
}

impl RecordingInventory {
    pub fn calls(&self) -> Vec<InventoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_move_stock(&self) {
        self.fail_move_stock.store(true, Ordering::SeqCst);
    }

    pub fn fail_adjust_on(&self, call: usize) {
        self.fail_adjust_on.store(call, Ordering::SeqCst);
    }

    fn record(&self, call: InventoryCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Inventory for RecordingInventory {
    async fn move_stock(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        direction: Direction,
    ) -> CollaboratorResult<()> {
        if self.fail_move_stock.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Inventory("warehouse offline".to_string()));
        }

        SqliteInventory.move_stock(conn, sale_id, direction).await?;
        self.record(InventoryCall::MoveStock {
            sale_id: sale_id.to_string(),
            direction,
        });
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
        let attempt = self.adjust_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_adjust_on.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Inventory(format!(
                "cannot adjust {}",
                product_id
            )));
        }

        SqliteInventory
            .adjust_stock(conn, product_id, delta, direction, reason, date)
            .await?;
        self.record(InventoryCall::AdjustStock {
            product_id: product_id.to_string(),
            delta,
            direction,
            reason: reason.to_string(),
            date,
        });
        Ok(())
    }
}

/// Delegates to [`SqliteCardSettlement`] and records (document id, amount).
#[derive(Debug, Default)]
pub struct RecordingCards {
    charges: Mutex<Vec<(String, Money)>>,
}

impl RecordingCards {
    pub fn charges(&self) -> Vec<(String, Money)> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl CardSettlement for RecordingCards {
    async fn charge(
        &self,
        conn: &mut SqliteConnection,
        amount: Money,
        document: &PaymentDocument,
    ) -> CollaboratorResult<()> {
        SqliteCardSettlement.charge(conn, amount, document).await?;
        self.charges
            .lock()
            .unwrap()
            .push((document.id.clone(), amount));
        Ok(())
    }
}

// =============================================================================
// Test Point of Sale
// =============================================================================

pub struct TestPos {
    pub db: Database,
    pub actor: Actor,
    pub inventory: Arc<RecordingInventory>,
    pub cards: Arc<RecordingCards>,
}

impl TestPos {
    pub async fn spawn() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let hash = hash_password(PASSWORD).unwrap();
        let user = {
            let mut conn = db.acquire().await.unwrap();
            UserRepository::insert(&mut conn, "ana", &hash).await.unwrap()
        };

        TestPos {
            db,
            actor: Actor::new(user.id),
            inventory: Arc::new(RecordingInventory::default()),
            cards: Arc::new(RecordingCards::default()),
        }
    }

    pub fn ledger(&self) -> CashRegisterLedger {
        CashRegisterLedger::with_argon2(self.db.clone())
    }

    pub fn stock(&self) -> StockAdjustmentProcessor {
        StockAdjustmentProcessor::new(self.db.clone(), self.inventory.clone())
    }

    pub fn engine(&self) -> SaleSettlementEngine {
        SaleSettlementEngine::new(self.db.clone(), self.inventory.clone(), self.cards.clone())
    }

    pub async fn add_user(&self, username: &str, password: &str) -> Actor {
        let hash = hash_password(password).unwrap();
        let mut conn = self.db.acquire().await.unwrap();
        let user = UserRepository::insert(&mut conn, username, &hash).await.unwrap();
        Actor::new(user.id)
    }

    pub async fn product(&self, name: &str, price_cents: i64, stock: i64) -> Product {
        let mut conn = self.db.acquire().await.unwrap();
        ProductRepository::insert(&mut conn, name, Money::from_cents(price_cents), stock)
            .await
            .unwrap()
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        let mut conn = self.db.acquire().await.unwrap();
        ProductRepository::get_by_id(&mut conn, product_id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    pub async fn payment_type(&self, definition: &str) -> PaymentType {
        let schedule = PaymentSchedule::parse(definition).unwrap();
        let mut conn = self.db.acquire().await.unwrap();
        PaymentTypeRepository::insert(&mut conn, definition, &schedule)
            .await
            .unwrap()
    }

    pub async fn document(&self, tender: TenderKind) -> PaymentDocument {
        let mut conn = self.db.acquire().await.unwrap();
        PaymentDocumentRepository::insert(&mut conn, tender.as_str(), tender)
            .await
            .unwrap()
    }

    pub async fn receivable_of(&self, sale_id: &str) -> Option<(Receivable, Vec<Installment>)> {
        self.engine()
            .receivable_of(sale_id)
            .await
            .unwrap()
            .map(|detail| (detail.receivable, detail.installments))
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
