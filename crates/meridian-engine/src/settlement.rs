//! # Sale Settlement Engine
//!
//! Drafts sales and closes them: splits the total across the payment
//! schedule's tenders and records receivables, installments, cash receipts,
//! card charges and the outbound stock movement.
//!
//! ## close_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Preconditions (no writes yet)                                         │
//! │   sale exists ─► NotFound        sale open ─► StateConflict            │
//! │   products total > 0 ─► Validation                                     │
//! │   payment type exists ─► NotFound                                      │
//! │   len(schedule) == len(amounts) ─► Validation                          │
//! │                                                                         │
//! │  total = products + surcharge - discount                               │
//! │  Receivable("Receivable for sale <id>", total)                         │
//! │  discount / surcharge ─► Money::allocate(n)  (shares reconcile)        │
//! │                                                                         │
//! │  for i, entry in schedule:                                             │
//! │    document i ─► NotFound if absent                                    │
//! │    Immediate + Cash     ─► open drawer, Σ amounts == products,         │
//! │                            Receipt/Entry amount_i + s_i - d_i          │
//! │    Immediate + Card     ─► CardSettlement::charge(amount_i)            │
//! │    Immediate + other    ─► Validation                                  │
//! │    Deferred(n)          ─► customer, amount, Installment #seq          │
//! │                            amount_i + s_i - d_i, due today + n         │
//! │                                                                         │
//! │  UPDATE sales ... WHERE status = 'open'      (single terminal write)   │
//! │  Inventory::move_stock(sale, Exit)                                     │
//! │  commit                                          one transaction       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collaborators::{
    CardSettlement, Inventory, SqliteCardSettlement, SqliteInventory,
};
use crate::context::Actor;
use crate::error::{Failure, FailureResult, ServiceResult};
use crate::ledger::{append_entry, open_drawer, Posting};
use meridian_core::validation::{
    amount_out_of_range, validate_adjustment_amount, validate_amount_range, validate_quantity,
    validate_text,
};
use meridian_core::{
    CoreError, Direction, Installment, LedgerEntry, LedgerEntryKind, Money, PaymentDocument,
    Receivable, Sale, SaleItem, SaleStatus, ScheduleEntry, TenderKind, ValidationError,
};
use meridian_db::{
    commit, Database, NewInstallment, PaymentDocumentRepository, PaymentTypeRepository,
    ProductRepository, ReceivableRepository, SaleClosing, SaleRepository, SqliteConnection,
};

/// Description of the ledger entry written for a cash installment.
pub const CASH_RECEIPT_DESCRIPTION: &str = "Cash sale receipt";

/// Description of the receivable created for every settled sale.
pub fn receivable_description(sale_id: &str) -> String {
    format!("Receivable for sale {}", sale_id)
}

// =============================================================================
// Request / Outcome
// =============================================================================

/// Everything the caller decides when closing a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub sale_id: String,
    pub payment_type_id: String,
    pub products_total: Money,
    pub discount: Money,
    pub surcharge: Money,
    /// One decimal string per schedule entry, as typed by the operator.
    pub installment_amounts: Vec<String>,
    /// Payment document per schedule entry, by index.
    pub payment_document_ids: Vec<String>,
}

/// What a successful settlement produced.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    pub sale_id: String,
    pub receivable_id: String,
    pub total: Money,
    pub installments: Vec<Installment>,
    pub ledger_entries: Vec<LedgerEntry>,
    pub card_charges: usize,
    pub message: String,
}

/// A settled sale's receivable and its installments.
#[derive(Debug, Clone, Serialize)]
pub struct ReceivableDetail {
    pub receivable: Receivable,
    pub installments: Vec<Installment>,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Clone)]
pub struct SaleSettlementEngine {
    db: Database,
    inventory: Arc<dyn Inventory>,
    cards: Arc<dyn CardSettlement>,
}

impl SaleSettlementEngine {
    pub fn new(db: Database, inventory: Arc<dyn Inventory>, cards: Arc<dyn CardSettlement>) -> Self {
        SaleSettlementEngine {
            db,
            inventory,
            cards,
        }
    }

    /// Engine backed by the SQLite inventory and card settlement.
    pub fn with_sqlite_collaborators(db: Database) -> Self {
        Self::new(db, Arc::new(SqliteInventory), Arc::new(SqliteCardSettlement))
    }

    // =========================================================================
    // Drafting
    // =========================================================================

    /// Starts an empty open sale.
    pub async fn open_sale(
        &self,
        customer_id: Option<&str>,
        notes: Option<&str>,
        actor: &Actor,
    ) -> ServiceResult<String> {
        async {
            let customer_id = validate_text("customer", customer_id)?;
            let notes = validate_text("notes", notes)?;

            let mut tx = self.db.begin().await?;
            actor.resolve(&mut tx).await?;

            let sale = SaleRepository::create(
                &mut tx,
                &actor.user_id,
                customer_id.as_deref(),
                notes.as_deref(),
            )
            .await?;
            commit(tx).await?;

            info!(sale_id = %sale.id, user_id = %actor.user_id, "Sale opened");
            Ok::<_, Failure>(sale.id)
        }
        .await
        .map_err(|f| f.at_boundary("open_sale", &actor.user_id))
    }

    /// Replaces the customer and notes of an open sale.
    pub async fn update_details(
        &self,
        sale_id: &str,
        customer_id: Option<&str>,
        notes: Option<&str>,
    ) -> ServiceResult<()> {
        async {
            let customer_id = validate_text("customer", customer_id)?;
            let notes = validate_text("notes", notes)?;

            let mut tx = self.db.begin().await?;
            load_open_sale(&mut tx, sale_id).await?;

            let updated = SaleRepository::update_details(
                &mut tx,
                sale_id,
                customer_id.as_deref(),
                notes.as_deref(),
            )
            .await?;
            if !updated {
                return Err(sale_closed(sale_id));
            }
            commit(tx).await?;

            Ok::<_, Failure>(())
        }
        .await
        .map_err(|f| f.at_boundary("update_sale_details", sale_id))
    }

    /// Adds a product to an open sale and refreshes its products total.
    pub async fn add_item(
        &self,
        sale_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> ServiceResult<SaleItem> {
        async {
            validate_quantity(quantity)?;

            let mut tx = self.db.begin().await?;
            load_open_sale(&mut tx, sale_id).await?;

            let product = ProductRepository::get_by_id(&mut tx, product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", product_id))?;

            let line_total = product
                .price()
                .checked_mul(quantity)
                .ok_or_else(|| amount_out_of_range("line total"))?;
            validate_amount_range("line total", line_total)?;

            let item =
                SaleRepository::add_item(&mut tx, sale_id, &product, quantity, line_total).await?;
            let products_total = SaleRepository::refresh_products_total(&mut tx, sale_id).await?;
            commit(tx).await?;

            debug!(sale_id = %sale_id, product_id = %product_id, quantity, products_total = %products_total, "Item added");
            Ok::<_, Failure>(item)
        }
        .await
        .map_err(|f| f.at_boundary("add_sale_item", sale_id))
    }

    /// Removes an item from an open sale and refreshes its products total.
    pub async fn remove_item(&self, sale_id: &str, item_id: &str) -> ServiceResult<()> {
        async {
            let mut tx = self.db.begin().await?;
            load_open_sale(&mut tx, sale_id).await?;

            if !SaleRepository::remove_item(&mut tx, sale_id, item_id).await? {
                return Err(Failure::from(CoreError::not_found("Sale item", item_id)));
            }
            SaleRepository::refresh_products_total(&mut tx, sale_id).await?;
            commit(tx).await?;

            Ok::<_, Failure>(())
        }
        .await
        .map_err(|f| f.at_boundary("remove_sale_item", sale_id))
    }

    pub async fn get(&self, sale_id: &str) -> ServiceResult<Sale> {
        async {
            let mut conn = self.db.acquire().await?;
            load_sale(&mut conn, sale_id).await
        }
        .await
        .map_err(|f| f.at_boundary("get_sale", sale_id))
    }

    pub async fn items(&self, sale_id: &str) -> ServiceResult<Vec<SaleItem>> {
        async {
            let mut conn = self.db.acquire().await?;
            load_sale(&mut conn, sale_id).await?;
            Ok::<_, Failure>(SaleRepository::get_items(&mut conn, sale_id).await?)
        }
        .await
        .map_err(|f| f.at_boundary("sale_items", sale_id))
    }

    pub async fn list_by_status(&self, status: SaleStatus) -> ServiceResult<Vec<Sale>> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(SaleRepository::list_by_status(&mut conn, status).await?)
        }
        .await
        .map_err(|f| f.at_boundary("list_sales", status.as_str()))
    }

    /// Number of sales still waiting for settlement.
    pub async fn count_open(&self) -> ServiceResult<i64> {
        async {
            let mut conn = self.db.acquire().await?;
            Ok::<_, Failure>(SaleRepository::count_by_status(&mut conn, SaleStatus::Open).await?)
        }
        .await
        .map_err(|f| f.at_boundary("count_open_sales", "*"))
    }

    /// Receivable of a sale. `None` until the sale is settled.
    pub async fn receivable_of(&self, sale_id: &str) -> ServiceResult<Option<ReceivableDetail>> {
        async {
            let mut conn = self.db.acquire().await?;
            load_sale(&mut conn, sale_id).await?;

            let Some(receivable) = ReceivableRepository::get_by_sale(&mut conn, sale_id).await?
            else {
                return Ok(None);
            };
            let installments = ReceivableRepository::installments(&mut conn, &receivable.id).await?;

            Ok::<_, Failure>(Some(ReceivableDetail {
                receivable,
                installments,
            }))
        }
        .await
        .map_err(|f| f.at_boundary("sale_receivable", sale_id))
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Closes a sale. Everything is written in one transaction or not at all.
    pub async fn close_sale(
        &self,
        request: SettlementRequest,
        actor: &Actor,
    ) -> ServiceResult<SettlementOutcome> {
        self.try_close_sale(&request, actor)
            .await
            .map_err(|f| f.at_boundary("close_sale", &request.sale_id))
    }

    async fn try_close_sale(
        &self,
        request: &SettlementRequest,
        actor: &Actor,
    ) -> FailureResult<SettlementOutcome> {
        let sale_id = request.sale_id.as_str();
        let mut tx = self.db.begin().await?;

        // ---------------------------------------------------------------------
        // Preconditions
        // ---------------------------------------------------------------------
        let sale = load_open_sale(&mut tx, sale_id).await?;

        if !request.products_total.is_positive() {
            return Err(CoreError::SaleHasNoValue {
                sale_id: sale_id.to_string(),
            }
            .into());
        }
        validate_adjustment_amount("discount", request.discount)?;
        validate_adjustment_amount("surcharge", request.surcharge)?;
        validate_amount_range("products total", request.products_total)?;

        let total = request
            .products_total
            .checked_add(request.surcharge)
            .and_then(|total| total.checked_sub(request.discount))
            .ok_or_else(|| amount_out_of_range("total"))?;
        if total.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "total".to_string(),
            }
            .into());
        }

        let payment_type = PaymentTypeRepository::get_by_id(&mut tx, &request.payment_type_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment type", &request.payment_type_id))?;

        let schedule = &payment_type.schedule;
        if schedule.len() != request.installment_amounts.len() {
            return Err(CoreError::ScheduleLengthMismatch {
                schedule: schedule.len(),
                amounts: request.installment_amounts.len(),
            }
            .into());
        }

        actor.resolve(&mut tx).await?;

        // ---------------------------------------------------------------------
        // Receivable and tenders
        // ---------------------------------------------------------------------
        let now = Utc::now();
        let today = now.date_naive();

        let receivable = ReceivableRepository::create(
            &mut tx,
            sale_id,
            sale.customer_id.as_deref(),
            &receivable_description(sale_id),
            total,
            now,
        )
        .await?;

        let parts = request.installment_amounts.len();
        let discount_shares = request.discount.allocate(parts);
        let surcharge_shares = request.surcharge.allocate(parts);

        let mut installments = Vec::new();
        let mut ledger_entries = Vec::new();
        let mut card_charges = 0;
        let mut sequence = 0;

        let plan = schedule
            .iter()
            .zip(&request.installment_amounts)
            .zip(discount_shares.iter().zip(&surcharge_shares))
            .enumerate();

        for (index, ((entry, raw_amount), (discount_share, surcharge_share))) in plan {
            let document = resolve_document(&mut tx, request, index).await?;

            match entry {
                ScheduleEntry::Immediate => match document.tender_kind {
                    TenderKind::Cash => {
                        let drawer = open_drawer(&mut tx)
                            .await?
                            .ok_or(CoreError::NoOpenRegister)?;

                        let amount = immediate_amount(raw_amount, index)?;
                        let entered = sum_amounts(&request.installment_amounts)?;
                        if entered != request.products_total {
                            return Err(CoreError::InstallmentTotalMismatch {
                                expected: request.products_total,
                                actual: entered,
                            }
                            .into());
                        }

                        let received = net_share(amount, *surcharge_share, *discount_share)?;
                        let ledger_entry = append_entry(
                            &mut tx,
                            &Posting {
                                register_id: &drawer.id,
                                description: CASH_RECEIPT_DESCRIPTION,
                                amount: received,
                                direction: Direction::Entry,
                                kind: LedgerEntryKind::Receipt,
                                user_id: &actor.user_id,
                            },
                        )
                        .await?;
                        ledger_entries.push(ledger_entry);
                    }

                    kind if kind.is_card() => {
                        let amount = immediate_amount(raw_amount, index)?;
                        self.cards.charge(&mut tx, amount, &document).await?;
                        card_charges += 1;
                    }

                    other => {
                        return Err(CoreError::UnsupportedTender {
                            tender: other.to_string(),
                        }
                        .into());
                    }
                },

                ScheduleEntry::Deferred { days } => {
                    if sale.customer_id.is_none() {
                        return Err(CoreError::CustomerRequired {
                            sale_id: sale_id.to_string(),
                        }
                        .into());
                    }

                    if raw_amount.trim().is_empty() {
                        return Err(CoreError::InvalidReceivableAmount { index }.into());
                    }
                    let amount = Money::parse_decimal(raw_amount)?;

                    sequence += 1;
                    let installment = ReceivableRepository::add_installment(
                        &mut tx,
                        &NewInstallment {
                            receivable_id: &receivable.id,
                            sequence,
                            amount: net_share(amount, *surcharge_share, *discount_share)?,
                            issued_at: now,
                            due_date: due_date(today, *days)?,
                        },
                    )
                    .await?;
                    installments.push(installment);
                }
            }
        }

        // ---------------------------------------------------------------------
        // Terminal write and stock
        // ---------------------------------------------------------------------
        let closed = SaleRepository::close(
            &mut tx,
            &SaleClosing {
                sale_id,
                payment_type_id: &payment_type.id,
                products_total: request.products_total,
                discount: request.discount,
                surcharge: request.surcharge,
                total,
                closed_at: now,
            },
        )
        .await?;
        if !closed {
            return Err(sale_closed(sale_id));
        }

        self.inventory
            .move_stock(&mut tx, sale_id, Direction::Exit)
            .await?;

        commit(tx).await?;

        info!(
            sale_id = %sale_id,
            total = %total,
            installments = installments.len(),
            receipts = ledger_entries.len(),
            card_charges,
            user_id = %actor.user_id,
            "Sale settled"
        );

        Ok(SettlementOutcome {
            sale_id: sale_id.to_string(),
            receivable_id: receivable.id,
            total,
            installments,
            ledger_entries,
            card_charges,
            message: format!("Sale {} closed with total {}", sale_id, total),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_sale(conn: &mut SqliteConnection, sale_id: &str) -> FailureResult<Sale> {
    Ok(SaleRepository::get_by_id(conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Sale", sale_id))?)
}

async fn load_open_sale(conn: &mut SqliteConnection, sale_id: &str) -> FailureResult<Sale> {
    let sale = load_sale(conn, sale_id).await?;
    if !sale.is_open() {
        return Err(sale_closed(sale_id));
    }
    Ok(sale)
}

/// Payment document for schedule index `index`. A missing id and an
/// unknown id are the same failure.
async fn resolve_document(
    conn: &mut SqliteConnection,
    request: &SettlementRequest,
    index: usize,
) -> FailureResult<PaymentDocument> {
    let missing = || CoreError::PaymentDocumentMissing {
        sale_id: request.sale_id.clone(),
        index,
    };

    let Some(document_id) = request.payment_document_ids.get(index) else {
        return Err(missing().into());
    };

    Ok(PaymentDocumentRepository::get_by_id(conn, document_id)
        .await?
        .ok_or_else(missing)?)
}

fn immediate_amount(raw: &str, index: usize) -> FailureResult<Money> {
    if raw.trim().is_empty() {
        return Err(CoreError::BlankInstallment { index }.into());
    }
    Ok(Money::parse_decimal(raw)?)
}

/// Sum of every entered amount. Blank entries count as zero.
fn sum_amounts(raw_amounts: &[String]) -> FailureResult<Money> {
    let mut sum = Money::zero();
    for raw in raw_amounts.iter().filter(|raw| !raw.trim().is_empty()) {
        sum = sum
            .checked_add(Money::parse_decimal(raw)?)
            .ok_or_else(|| amount_out_of_range("installment total"))?;
    }
    Ok(sum)
}

/// Installment amount after its surcharge and discount shares.
fn net_share(amount: Money, surcharge_share: Money, discount_share: Money) -> FailureResult<Money> {
    let net = amount
        .checked_add(surcharge_share)
        .and_then(|net| net.checked_sub(discount_share))
        .ok_or_else(|| amount_out_of_range("installment amount"))?;
    if net.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "installment amount".to_string(),
        }
        .into());
    }
    Ok(net)
}

fn due_date(today: NaiveDate, days: u32) -> FailureResult<NaiveDate> {
    today.checked_add_days(Days::new(u64::from(days))).ok_or_else(|| {
        ValidationError::InvalidFormat {
            field: "payment schedule".to_string(),
            reason: format!("{} days from {} is out of range", days, today),
        }
        .into()
    })
}

fn sale_closed(sale_id: &str) -> Failure {
    CoreError::SaleClosed {
        sale_id: sale_id.to_string(),
    }
    .into()
}
