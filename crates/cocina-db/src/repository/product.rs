//! # Product Repository
//!
//! Database operations for sellable products and their recipe bindings.
//!
//! ## The Binding Decides the Sale Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product row                                                            │
//! │                                                                         │
//! │  recipe_id = NULL   ──► direct stock counter (integer `stock`)         │
//! │  recipe_id = r-...  ──► recipe graph walk; `stock` is ignored          │
//! │                                                                         │
//! │  `recipe_consumption_factor` scales sold units into recipe-units       │
//! │  (how many recipe-units one sold product-unit consumes, default 1).    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::decimal::{encode_decimal, parse_decimal};
use crate::error::{DbError, DbResult};
use cocina_core::Product;

/// Raw row as stored; decimal columns are TEXT.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    unit_price: String,
    bulk_price: String,
    available: bool,
    category_id: Option<String>,
    recipe_id: Option<String>,
    recipe_consumption_factor: String,
    stock: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl ProductRow {
    fn into_domain(self) -> DbResult<Product> {
        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            unit_price: parse_decimal("products.unit_price", &self.unit_price)?,
            bulk_price: parse_decimal("products.bulk_price", &self.bulk_price)?,
            available: self.available,
            category_id: self.category_id,
            recipe_id: self.recipe_id,
            recipe_consumption_factor: parse_decimal(
                "products.recipe_consumption_factor",
                &self.recipe_consumption_factor,
            )?,
            stock: self.stock,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

const SELECT_PRODUCT: &str = "SELECT id, name, description, unit_price, bulk_price, available, \
     category_id, recipe_id, recipe_consumption_factor, stock, created_at, updated_at, version \
     FROM products";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (id, name, description, unit_price, bulk_price, available, \
             category_id, recipe_id, recipe_consumption_factor, stock, created_at, updated_at, \
             version) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(encode_decimal(product.unit_price))
        .bind(encode_decimal(product.bulk_price))
        .bind(product.available)
        .bind(&product.category_id)
        .bind(&product.recipe_id)
        .bind(encode_decimal(product.recipe_consumption_factor))
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(ProductRow::into_domain).transpose()
    }

    /// Lists all products, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ProductRow::into_domain).collect()
    }

    /// Lists products currently offered for sale, sorted by name.
    pub async fn list_available(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE available = 1 ORDER BY name"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(ProductRow::into_domain).collect()
    }

    /// Searches products by name fragment, sorted by name.
    pub async fn search_by_name(&self, query: &str) -> DbResult<Vec<Product>> {
        let pattern = format!("%{}%", query.trim());

        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE name LIKE ?1 ORDER BY name"))
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(ProductRow::into_domain).collect()
    }

    /// Updates a product's catalog fields (everything except the direct
    /// stock counter, which only [`Self::set_stock`] and the sale path
    /// touch).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET name = ?2, description = ?3, unit_price = ?4, bulk_price = ?5, \
             available = ?6, category_id = ?7, updated_at = ?8, version = version + 1 \
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(encode_decimal(product.unit_price))
        .bind(encode_decimal(product.bulk_price))
        .bind(product.available)
        .bind(&product.category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Binds a product to a recipe (or unbinds it with `None`).
    ///
    /// Binding switches the sale path entirely away from the direct stock
    /// counter; unbinding restores it.
    pub async fn set_recipe(
        &self,
        id: &str,
        recipe_id: Option<&str>,
        consumption_factor: Decimal,
    ) -> DbResult<()> {
        debug!(id = %id, recipe_id = ?recipe_id, factor = %consumption_factor, "Binding product recipe");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET recipe_id = ?2, recipe_consumption_factor = ?3, \
             updated_at = ?4, version = version + 1 WHERE id = ?1",
        )
        .bind(id)
        .bind(recipe_id)
        .bind(encode_decimal(consumption_factor))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Sets a product's direct stock counter (restock / manual correction).
    pub async fn set_stock(&self, id: &str, stock: Option<i64>) -> DbResult<()> {
        debug!(id = %id, stock = ?stock, "Setting product stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET stock = ?2, updated_at = ?3, version = version + 1 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Fetches a product inside an open transaction (sale path).
    pub(crate) async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(ProductRow::into_domain).transpose()
    }

    /// Applies a direct stock deduction inside an open transaction, with the
    /// same optimistic version discipline as insumo stock writes.
    pub(crate) async fn deduct_stock_tx(
        conn: &mut SqliteConnection,
        id: &str,
        new_stock: i64,
        expected_version: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET stock = ?2, updated_at = ?3, version = version + 1 \
             WHERE id = ?1 AND version = ?4",
        )
        .bind(id)
        .bind(new_stock)
        .bind(now)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT version FROM products WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;

            return Err(match exists {
                Some(_) => DbError::conflict("Product", id),
                None => DbError::not_found("Product", id),
            });
        }

        debug!(id = %id, new_stock = %new_stock, "Deducted product stock");
        Ok(())
    }
}
