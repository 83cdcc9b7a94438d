//! # Costing Service
//!
//! The costing-query entrypoint: given a recipe id, returns its recursively
//! computed unit cost.
//!
//! Read-only. The subgraph is loaded inside one read transaction so a
//! costing that races a catalog edit still sees a consistent snapshot; the
//! resolver itself takes no locks and writes nothing. Costs are not cached:
//! every query re-walks the subtree against current catalog state.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, ServiceResult};
use crate::repository::recipe::RecipeRepository;
use cocina_core::{unit_cost, Cost};

/// Service answering recipe costing queries.
#[derive(Debug, Clone)]
pub struct CostingService {
    pool: SqlitePool,
}

impl CostingService {
    /// Creates a new CostingService.
    pub fn new(pool: SqlitePool) -> Self {
        CostingService { pool }
    }

    /// Computes the unit cost of a recipe, rounded to currency precision.
    ///
    /// ## Errors
    /// - `RecipeNotFound` - unknown recipe id (or dangling sub-recipe edge)
    /// - `InsumoNotFound` - an edge references a missing insumo
    /// - `GraphCycle` / `TraversalDepthExceeded` - defective recipe graph
    pub async fn recipe_unit_cost(&self, recipe_id: &str) -> ServiceResult<Cost> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let graph = RecipeRepository::load_graph_tx(&mut tx, recipe_id).await?;
        tx.commit().await.map_err(DbError::from)?;

        let cost = unit_cost(&graph, recipe_id)?;
        debug!(recipe_id = %recipe_id, cost = %cost, "Resolved recipe unit cost");
        Ok(cost)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
