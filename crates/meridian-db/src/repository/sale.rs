//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Sale { status: Open, products_total: 0 }            │
//! │                                                                         │
//! │  2. ADD ITEMS (status = 'open' only)                                   │
//! │     └── add_item() → SaleItem                                          │
//! │     └── remove_item()                                                  │
//! │     └── refresh_products_total() → SUM(line_total_cents)               │
//! │                                                                         │
//! │  3. CLOSE (settlement)                                                 │
//! │     └── close() → Sale { status: Closed }                              │
//! │         UPDATE ... WHERE status = 'open'   (0 rows = already closed)   │
//! │                                                                         │
//! │  Closed is terminal: every write below is guarded by status = 'open'.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use meridian_core::{Money, Product, Sale, SaleItem, SaleStatus};

const SALE_COLUMNS: &str = r#"
    id, status, customer_id,
    products_total_cents, discount_cents, surcharge_cents, total_cents,
    payment_type_id, user_id, notes, created_at, closed_at
"#;

/// Closing fields written once, at the end of a settlement.
#[derive(Debug, Clone)]
pub struct SaleClosing<'a> {
    pub sale_id: &'a str,
    pub payment_type_id: &'a str,
    pub products_total: Money,
    pub discount: Money,
    pub surcharge: Money,
    pub total: Money,
    pub closed_at: DateTime<Utc>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone, Copy)]
pub struct SaleRepository;

impl SaleRepository {
    /// Creates a new open sale with no items.
    pub async fn create(
        conn: &mut SqliteConnection,
        user_id: &str,
        customer_id: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<Sale> {
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            status: SaleStatus::Open,
            customer_id: customer_id.map(str::to_string),
            products_total_cents: 0,
            discount_cents: 0,
            surcharge_cents: 0,
            total_cents: 0,
            payment_type_id: None,
            user_id: user_id.to_string(),
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
            closed_at: None,
        };

        debug!(id = %sale.id, user_id = %sale.user_id, "Creating sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, status, customer_id,
                products_total_cents, discount_cents, surcharge_cents, total_cents,
                payment_type_id, user_id, notes, created_at, closed_at
            ) VALUES (?1, ?2, ?3, 0, 0, 0, 0, NULL, ?4, ?5, ?6, NULL)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.status)
        .bind(&sale.customer_id)
        .bind(&sale.user_id)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(sale)
    }

    /// Lists sales in a given status, newest first.
    pub async fn list_by_status(
        conn: &mut SqliteConnection,
        status: SaleStatus,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE status = ?1 ORDER BY created_at DESC"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(status)
            .fetch_all(&mut *conn)
            .await?;

        Ok(sales)
    }

    /// Counts sales in a given status.
    pub async fn count_by_status(conn: &mut SqliteConnection, status: SaleStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE status = ?1")
            .bind(status)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// Replaces customer and notes of an open sale.
    ///
    /// ## Returns
    /// `false` when the sale is missing or no longer open.
    pub async fn update_details(
        conn: &mut SqliteConnection,
        sale_id: &str,
        customer_id: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET customer_id = ?2, notes = ?3
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(sale_id)
        .bind(customer_id)
        .bind(notes)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds an item to a sale, snapshotting the product's name and price.
    pub async fn add_item(
        conn: &mut SqliteConnection,
        sale_id: &str,
        product: &Product,
        quantity: i64,
        line_total: Money,
    ) -> DbResult<SaleItem> {
        let unit_price = product.price();
        let item = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            unit_price_cents: unit_price.cents(),
            quantity,
            line_total_cents: line_total.cents(),
            created_at: Utc::now(),
        };

        debug!(sale_id = %item.sale_id, product_id = %item.product_id, quantity, "Adding sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, name_snapshot,
                unit_price_cents, quantity, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Removes an item. Returns `false` if it was not on this sale.
    pub async fn remove_item(
        conn: &mut SqliteConnection,
        sale_id: &str,
        item_id: &str,
    ) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sale_items WHERE id = ?1 AND sale_id = ?2")
            .bind(item_id)
            .bind(sale_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Gets all items for a sale in insertion order.
    pub async fn get_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id, sale_id, product_id, name_snapshot,
                unit_price_cents, quantity, line_total_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Recomputes the products total of an open sale from its items.
    ///
    /// ## Returns
    /// The new total.
    pub async fn refresh_products_total(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Money> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(line_total_cents), 0) FROM sale_items WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE sales SET products_total_cents = ?2 WHERE id = ?1 AND status = 'open'",
        )
        .bind(sale_id)
        .bind(total)
        .execute(&mut *conn)
        .await?;

        Ok(Money::from_cents(total))
    }

    /// Writes the closing fields and moves the sale to Closed.
    ///
    /// ## Returns
    /// `false` when the sale was not open any more (another settlement won).
    pub async fn close(conn: &mut SqliteConnection, closing: &SaleClosing<'_>) -> DbResult<bool> {
        debug!(sale_id = %closing.sale_id, total = %closing.total, "Closing sale");

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'closed',
                payment_type_id = ?2,
                products_total_cents = ?3,
                discount_cents = ?4,
                surcharge_cents = ?5,
                total_cents = ?6,
                closed_at = ?7
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(closing.sale_id)
        .bind(closing.payment_type_id)
        .bind(closing.products_total.cents())
        .bind(closing.discount.cents())
        .bind(closing.surcharge.cents())
        .bind(closing.total.cents())
        .bind(closing.closed_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
