//! # Sale Service
//!
//! The sale-confirmation entrypoint: routes a `{product, quantity}` request
//! to the correct consumption path and owns the transaction around it.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sell(product_id, quantity)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                      │
//! │  look up product ──── absent? ──► ProductNotFound                      │
//! │       │                                                                 │
//! │       ├── recipe-backed ──► load graph snapshot (same transaction)     │
//! │       │        │                                                        │
//! │       │        ▼                                                        │
//! │       │   plan_consumption(recipe, factor × qty)   (phase 1, pure)     │
//! │       │        │                                                        │
//! │       │        ▼                                                        │
//! │       │   apply deductions in insumo-id order,     (phase 2)           │
//! │       │   each conditional on its snapshot version                     │
//! │       │                                                                 │
//! │       └── direct stock ──► validate counter, conditional deduction     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT — or roll back whole: no insumo is ever partially deducted     │
//! │                                                                         │
//! │  ConcurrencyConflict? retry with a fresh snapshot (bounded)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, ServiceResult};
use crate::repository::insumo::InsumoRepository;
use crate::repository::product::ProductRepository;
use crate::repository::recipe::RecipeRepository;
use cocina_core::validation::validate_sale_quantity;
use cocina_core::{plan_consumption, CoreError, PlannedDeduction, ValidationError};

/// How many times a sale is retried after losing an optimistic-version race.
pub const MAX_CONFLICT_RETRIES: u32 = 3;

/// What a completed sale did to stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SaleOutcome {
    /// The product was recipe-backed: insumo stock was consumed through the
    /// recipe graph.
    RecipeConsumed {
        product_id: String,
        recipe_id: String,
        /// Recipe-units consumed (consumption factor × quantity sold).
        recipe_units: Decimal,
        /// Applied deductions, sorted by insumo id.
        deductions: Vec<PlannedDeduction>,
    },
    /// The product was sold from its own direct stock counter.
    DirectStock {
        product_id: String,
        /// Whole units deducted (`floor(quantity)`).
        units: i64,
        remaining_stock: i64,
    },
}

/// Service handling sale confirmations.
#[derive(Debug, Clone)]
pub struct SaleService {
    pool: SqlitePool,
}

impl SaleService {
    /// Creates a new SaleService.
    pub fn new(pool: SqlitePool) -> Self {
        SaleService { pool }
    }

    /// Confirms a sale: deducts stock for `quantity` units of the product,
    /// all-or-nothing.
    ///
    /// Retries up to [`MAX_CONFLICT_RETRIES`] times when a concurrent sale
    /// wins a version race on a shared insumo; every other error propagates
    /// unchanged.
    ///
    /// ## Errors
    /// - `ProductNotFound` - unknown product id
    /// - `InsufficientStock` / `InsufficientProductStock` - the sale would
    ///   drive stock negative; nothing was deducted
    /// - `GraphCycle` / `TraversalDepthExceeded` - defective recipe graph
    /// - `ConcurrencyConflict` - still losing races after the retry budget
    pub async fn sell(&self, product_id: &str, quantity: Decimal) -> ServiceResult<SaleOutcome> {
        validate_sale_quantity(quantity).map_err(CoreError::from)?;

        let mut attempt = 0;
        loop {
            match self.try_sell(product_id, quantity).await {
                Err(err) if err.is_retryable() && attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    debug!(product_id = %product_id, attempt, "Retrying sale after version conflict");
                }
                other => return other,
            }
        }
    }

    /// One sale attempt inside one transaction.
    async fn try_sell(&self, product_id: &str, quantity: Decimal) -> ServiceResult<SaleOutcome> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product = ProductRepository::get_by_id_tx(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let outcome = if let Some(recipe_id) = product.recipe_id.clone() {
            let recipe_units = product.recipe_units_for(quantity);
            let graph = RecipeRepository::load_graph_tx(&mut tx, &recipe_id).await?;

            // Phase 1: pure dry-run over the snapshot. Any shortfall aborts
            // here, before a single row is written.
            let plan = plan_consumption(&graph, &recipe_id, recipe_units)?;

            // Phase 2: conditional writes, in the plan's insumo-id order.
            for deduction in &plan.deductions {
                let snapshot_version = graph
                    .insumo(&deduction.insumo_id)
                    .map(|i| i.version)
                    .ok_or_else(|| CoreError::InsumoNotFound(deduction.insumo_id.clone()))?;
                InsumoRepository::deduct_stock_tx(
                    &mut tx,
                    &deduction.insumo_id,
                    deduction.new_stock,
                    snapshot_version,
                )
                .await?;
            }

            SaleOutcome::RecipeConsumed {
                product_id: product.id.clone(),
                recipe_id,
                recipe_units,
                deductions: plan.deductions,
            }
        } else {
            // Direct stock path: whole units only.
            let units = quantity.trunc().to_i64().ok_or_else(|| {
                CoreError::from(ValidationError::OutOfRange {
                    field: "quantity sold".to_string(),
                    min: 1,
                    max: i64::MAX,
                })
            })?;

            let available = product.stock.unwrap_or(0);
            if available < units {
                return Err(CoreError::InsufficientProductStock {
                    product_id: product.id,
                    requested: units,
                    available,
                }
                .into());
            }

            let remaining = available - units;
            ProductRepository::deduct_stock_tx(&mut tx, &product.id, remaining, product.version)
                .await?;

            SaleOutcome::DirectStock {
                product_id: product.id,
                units,
                remaining_stock: remaining,
            }
        };

        tx.commit().await.map_err(DbError::from)?;

        info!(product_id = %product_id, quantity = %quantity, "Sale confirmed");
        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use cocina_core::{Insumo, Product, Recipe};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Flour 100 kg @ $10, Cheese 50 kg @ $20; Dough = 2 kg Flour;
    /// Pizza = 1 x Dough + 0.3 kg Cheese; product "Pizza" bound with
    /// factor 1; product "Soda" sold from direct stock 10.
    async fn seed_catalog(db: &Database) {
        let insumos = db.insumos();
        insumos
            .insert(&Insumo::new("i-flour", "Flour", "kg", dec("100"), dec("10")))
            .await
            .unwrap();
        insumos
            .insert(&Insumo::new("i-cheese", "Cheese", "kg", dec("50"), dec("20")))
            .await
            .unwrap();

        let recipes = db.recipes();
        recipes.insert(&Recipe::new("r-dough", "Dough")).await.unwrap();
        recipes.insert(&Recipe::new("r-pizza", "Pizza")).await.unwrap();
        recipes
            .set_insumo_edge("r-dough", "i-flour", dec("2"))
            .await
            .unwrap();
        recipes
            .set_insumo_edge("r-pizza", "i-cheese", dec("0.3"))
            .await
            .unwrap();
        recipes
            .set_sub_recipe_edge("r-pizza", "r-dough", dec("1"))
            .await
            .unwrap();

        let products = db.products();
        let mut pizza = Product::new("p-pizza", "Pizza", dec("50"));
        pizza.recipe_id = Some("r-pizza".to_string());
        products.insert(&pizza).await.unwrap();

        let mut soda = Product::new("p-soda", "Soda", dec("3"));
        soda.stock = Some(10);
        products.insert(&soda).await.unwrap();
    }

    async fn stock_of(db: &Database, insumo_id: &str) -> Decimal {
        db.insumos()
            .get_by_id(insumo_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_sell_recipe_backed_deducts_multiplicatively() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let outcome = db.sales().sell("p-pizza", dec("5")).await.unwrap();

        match outcome {
            SaleOutcome::RecipeConsumed {
                recipe_units,
                deductions,
                ..
            } => {
                assert_eq!(recipe_units, dec("5"));
                assert_eq!(deductions.len(), 2);
            }
            other => panic!("expected RecipeConsumed, got {other:?}"),
        }

        // 5 x 1 x 2 kg flour, 5 x 0.3 kg cheese
        assert_eq!(stock_of(&db, "i-flour").await, dec("90"));
        assert_eq!(stock_of(&db, "i-cheese").await, dec("48.5"));
    }

    #[tokio::test]
    async fn test_sell_consumption_factor_scales_recipe_units() {
        let db = test_db().await;
        seed_catalog(&db).await;
        db.products()
            .set_recipe("p-pizza", Some("r-pizza"), dec("2"))
            .await
            .unwrap();

        db.sales().sell("p-pizza", dec("5")).await.unwrap();

        // factor 2: 5 x 2 x 2 kg flour, 5 x 2 x 0.3 kg cheese
        assert_eq!(stock_of(&db, "i-flour").await, dec("80"));
        assert_eq!(stock_of(&db, "i-cheese").await, dec("47"));
    }

    #[tokio::test]
    async fn test_sell_insufficient_stock_rejects_and_rolls_back() {
        let db = test_db().await;
        seed_catalog(&db).await;
        db.insumos().set_stock("i-cheese", dec("1")).await.unwrap();

        let err = db.sales().sell("p-pizza", dec("5")).await.unwrap_err();
        match err {
            ServiceError::Core(CoreError::InsufficientStock {
                insumo_id,
                required,
                available,
                ..
            }) => {
                assert_eq!(insumo_id, "i-cheese");
                assert_eq!(required, dec("1.5"));
                assert_eq!(available, dec("1"));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Atomicity: nothing was deducted, flour included.
        assert_eq!(stock_of(&db, "i-flour").await, dec("100"));
        assert_eq!(stock_of(&db, "i-cheese").await, dec("1"));
    }

    #[tokio::test]
    async fn test_sell_direct_stock_product() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let outcome = db.sales().sell("p-soda", dec("3")).await.unwrap();

        match outcome {
            SaleOutcome::DirectStock {
                units,
                remaining_stock,
                ..
            } => {
                assert_eq!(units, 3);
                assert_eq!(remaining_stock, 7);
            }
            other => panic!("expected DirectStock, got {other:?}"),
        }

        let soda = db.products().get_by_id("p-soda").await.unwrap().unwrap();
        assert_eq!(soda.stock, Some(7));
    }

    #[tokio::test]
    async fn test_sell_direct_stock_truncates_fractional_quantity() {
        let db = test_db().await;
        seed_catalog(&db).await;

        db.sales().sell("p-soda", dec("2.9")).await.unwrap();

        let soda = db.products().get_by_id("p-soda").await.unwrap().unwrap();
        assert_eq!(soda.stock, Some(8));
    }

    #[tokio::test]
    async fn test_sell_direct_stock_rejects_oversell() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let err = db.sales().sell("p-soda", dec("11")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientProductStock {
                requested: 11,
                available: 10,
                ..
            })
        ));

        let soda = db.products().get_by_id("p-soda").await.unwrap().unwrap();
        assert_eq!(soda.stock, Some(10));
    }

    #[tokio::test]
    async fn test_sell_unknown_product() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let err = db.sales().sell("p-ghost", dec("1")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sell_rejects_non_positive_quantity() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let err = db.sales().sell("p-pizza", dec("0")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sell_cyclic_catalog_is_rejected() {
        let db = test_db().await;
        seed_catalog(&db).await;

        // Pre-existing bad data: close the cycle behind the repository's
        // back to prove the traversal-time defense holds.
        sqlx::query(
            "INSERT INTO recipe_sub_recipes (parent_id, child_id, quantity) \
             VALUES ('r-dough', 'r-pizza', '1')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.sales().sell("p-pizza", dec("1")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::GraphCycle { .. })
        ));

        assert_eq!(stock_of(&db, "i-flour").await, dec("100"));
    }
}
