//! # Product Repository
//!
//! Database operations for products and their stock on hand.
//!
//! Catalog maintenance is not part of the back end; products are inserted by
//! the seed binary and tests, then read by sale drafting and moved by the
//! inventory collaborator.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::{Money, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let mut conn = db.acquire().await?;
/// let product = ProductRepository::get_by_id(&mut conn, "uuid-here").await?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProductRepository;

impl ProductRepository {
    /// Inserts a product with an initial stock level.
    pub async fn insert(
        conn: &mut SqliteConnection,
        name: &str,
        price: Money,
        stock_quantity: i64,
    ) -> DbResult<Product> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents: price.cents(),
            stock_quantity,
            updated_at: Utc::now(),
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock_quantity, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock_quantity, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Lists products ordered by name.
    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock_quantity, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(products)
    }

    /// Applies a signed quantity to a product's stock on hand.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the product does not exist.
    pub async fn apply_stock_delta(
        conn: &mut SqliteConnection,
        product_id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(product_id = %product_id, delta, "Applying stock delta");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }
}
