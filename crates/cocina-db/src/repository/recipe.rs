//! # Recipe Repository
//!
//! Database operations for recipes, their edges, and graph loading.
//!
//! ## Graph Loading
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 load_graph("Pizza")                                     │
//! │                                                                         │
//! │  pending = [Pizza]                                                     │
//! │    fetch Pizza row + its edges ──► queue Dough, note Cheese            │
//! │  pending = [Dough]                                                     │
//! │    fetch Dough row + its edges ──► note Flour                          │
//! │  fetch Flour, Cheese catalog rows                                      │
//! │                                                                         │
//! │  Result: a RecipeGraph snapshot of exactly the reachable subtree,      │
//! │  read inside one transaction so a concurrent catalog edit can never    │
//! │  produce a torn view.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edge Management
//! Edges are set-style upserts (the unique-pair invariant is the composite
//! primary key). A sub-recipe edge is refused when the child already
//! reaches the parent: persisting it would close a cycle and every later
//! walk of that subtree would fail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::decimal::{encode_decimal, parse_decimal};
use crate::error::{DbError, DbResult, ServiceResult};
use crate::repository::insumo::InsumoRepository;
use cocina_core::validation::validate_edge_quantity;
use cocina_core::{CoreError, InsumoEdge, Recipe, RecipeGraph, SubRecipeEdge, ValidationError};

/// Raw recipe row.
#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecipeRow {
    fn into_domain(self) -> Recipe {
        Recipe {
            id: self.id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Raw edge rows; quantities are TEXT decimals.
#[derive(sqlx::FromRow)]
struct InsumoEdgeRow {
    insumo_id: String,
    quantity: String,
}

#[derive(sqlx::FromRow)]
struct SubRecipeEdgeRow {
    child_id: String,
    quantity: String,
}

const SELECT_RECIPE: &str =
    "SELECT id, name, description, created_at, updated_at FROM recipes";

/// Repository for recipe database operations.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    /// Creates a new RecipeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    // =========================================================================
    // Recipe CRUD
    // =========================================================================

    /// Inserts a new recipe.
    pub async fn insert(&self, recipe: &Recipe) -> DbResult<()> {
        debug!(id = %recipe.id, name = %recipe.name, "Inserting recipe");

        sqlx::query(
            "INSERT INTO recipes (id, name, description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&recipe.id)
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a recipe by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Recipe>> {
        let row: Option<RecipeRow> = sqlx::query_as(&format!("{SELECT_RECIPE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(RecipeRow::into_domain))
    }

    /// Lists all recipes, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Recipe>> {
        let rows: Vec<RecipeRow> = sqlx::query_as(&format!("{SELECT_RECIPE} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(RecipeRow::into_domain).collect())
    }

    /// Searches recipes by name fragment, sorted by name.
    pub async fn search_by_name(&self, query: &str) -> DbResult<Vec<Recipe>> {
        let pattern = format!("%{}%", query.trim());

        let rows: Vec<RecipeRow> =
            sqlx::query_as(&format!("{SELECT_RECIPE} WHERE name LIKE ?1 ORDER BY name"))
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(RecipeRow::into_domain).collect())
    }

    /// Updates a recipe's name and description.
    pub async fn update(&self, recipe: &Recipe) -> DbResult<()> {
        debug!(id = %recipe.id, "Updating recipe");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE recipes SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&recipe.id)
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", &recipe.id));
        }

        Ok(())
    }

    /// Deletes a recipe. Its edges (both kinds, both directions) cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting recipe");

        let result = sqlx::query("DELETE FROM recipes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", id));
        }

        Ok(())
    }

    // =========================================================================
    // Edge Management
    // =========================================================================

    /// Sets the quantity of a Recipe→Insumo edge, creating it if absent.
    pub async fn set_insumo_edge(
        &self,
        recipe_id: &str,
        insumo_id: &str,
        quantity: Decimal,
    ) -> ServiceResult<()> {
        validate_edge_quantity(quantity).map_err(CoreError::from)?;

        debug!(recipe_id = %recipe_id, insumo_id = %insumo_id, quantity = %quantity, "Setting insumo edge");

        sqlx::query(
            "INSERT INTO recipe_insumos (recipe_id, insumo_id, quantity) VALUES (?1, ?2, ?3) \
             ON CONFLICT (recipe_id, insumo_id) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(recipe_id)
        .bind(insumo_id)
        .bind(encode_decimal(quantity))
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    /// Removes a Recipe→Insumo edge.
    pub async fn remove_insumo_edge(&self, recipe_id: &str, insumo_id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM recipe_insumos WHERE recipe_id = ?1 AND insumo_id = ?2")
                .bind(recipe_id)
                .bind(insumo_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Insumo edge",
                format!("{recipe_id}/{insumo_id}"),
            ));
        }

        Ok(())
    }

    /// Sets the quantity of a parent→child sub-recipe edge, creating it if
    /// absent.
    ///
    /// ## Errors
    /// - `Validation(SelfReference)` for `parent == child`
    /// - `GraphCycle` when the parent is already reachable from the child:
    ///   the edge would close a cycle
    /// - `ForeignKeyViolation` when either recipe does not exist
    pub async fn set_sub_recipe_edge(
        &self,
        parent_id: &str,
        child_id: &str,
        quantity: Decimal,
    ) -> ServiceResult<()> {
        validate_edge_quantity(quantity).map_err(CoreError::from)?;

        if parent_id == child_id {
            return Err(CoreError::from(ValidationError::SelfReference {
                recipe_id: parent_id.to_string(),
            })
            .into());
        }

        // Everything reachable from the child today; if the parent is in
        // there, parent→child would close a cycle.
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let child_subtree = Self::load_graph_tx(&mut *tx, child_id).await?;
        if child_subtree.is_reachable(child_id, parent_id) {
            return Err(CoreError::GraphCycle {
                recipe_id: parent_id.to_string(),
                path: vec![parent_id.to_string(), child_id.to_string(), parent_id.to_string()],
            }
            .into());
        }

        debug!(parent_id = %parent_id, child_id = %child_id, quantity = %quantity, "Setting sub-recipe edge");

        sqlx::query(
            "INSERT INTO recipe_sub_recipes (parent_id, child_id, quantity) VALUES (?1, ?2, ?3) \
             ON CONFLICT (parent_id, child_id) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(parent_id)
        .bind(child_id)
        .bind(encode_decimal(quantity))
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    /// Removes a parent→child sub-recipe edge.
    pub async fn remove_sub_recipe_edge(&self, parent_id: &str, child_id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM recipe_sub_recipes WHERE parent_id = ?1 AND child_id = ?2")
                .bind(parent_id)
                .bind(child_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Sub-recipe edge",
                format!("{parent_id}/{child_id}"),
            ));
        }

        Ok(())
    }

    /// Direct insumo edges of a recipe.
    pub async fn insumo_edges(&self, recipe_id: &str) -> DbResult<Vec<InsumoEdge>> {
        let mut conn = self.pool.acquire().await?;
        Self::insumo_edges_on(&mut conn, recipe_id).await
    }

    /// Direct sub-recipe edges of a recipe.
    pub async fn sub_recipe_edges(&self, recipe_id: &str) -> DbResult<Vec<SubRecipeEdge>> {
        let mut conn = self.pool.acquire().await?;
        Self::sub_recipe_edges_on(&mut conn, recipe_id).await
    }

    // =========================================================================
    // Graph Loading
    // =========================================================================

    /// Materializes the subtree reachable from `recipe_id` into a core
    /// [`RecipeGraph`] snapshot, inside its own read transaction.
    pub async fn load_graph(&self, recipe_id: &str) -> ServiceResult<RecipeGraph> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let graph = Self::load_graph_tx(&mut *tx, recipe_id).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(graph)
    }

    /// Graph loading inside an already-open transaction: the sale path uses
    /// this so the snapshot and the conditional stock writes share one
    /// transactional scope.
    pub(crate) async fn load_graph_tx(
        conn: &mut SqliteConnection,
        recipe_id: &str,
    ) -> ServiceResult<RecipeGraph> {
        let mut graph = RecipeGraph::new();
        let mut pending = vec![recipe_id.to_string()];
        let mut insumo_ids: Vec<String> = Vec::new();

        while let Some(id) = pending.pop() {
            if graph.contains_recipe(&id) {
                continue;
            }

            let row: Option<RecipeRow> =
                sqlx::query_as(&format!("{SELECT_RECIPE} WHERE id = ?1"))
                    .bind(&id)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(DbError::from)?;

            let recipe = row
                .map(RecipeRow::into_domain)
                .ok_or_else(|| CoreError::RecipeNotFound(id.clone()))?;
            graph.add_recipe(recipe);

            for edge in Self::insumo_edges_on(&mut *conn, &id).await? {
                insumo_ids.push(edge.insumo_id.clone());
                graph.add_insumo_edge(&id, edge)?;
            }

            for edge in Self::sub_recipe_edges_on(&mut *conn, &id).await? {
                pending.push(edge.child_id.clone());
                graph.add_sub_recipe_edge(&id, edge)?;
            }
        }

        for insumo_id in insumo_ids {
            if graph.insumo(&insumo_id).is_some() {
                continue;
            }
            let insumo = InsumoRepository::get_by_id_tx(&mut *conn, &insumo_id)
                .await?
                .ok_or_else(|| CoreError::InsumoNotFound(insumo_id))?;
            graph.add_insumo(insumo);
        }

        Ok(graph)
    }

    async fn insumo_edges_on(
        conn: &mut SqliteConnection,
        recipe_id: &str,
    ) -> DbResult<Vec<InsumoEdge>> {
        let rows: Vec<InsumoEdgeRow> = sqlx::query_as(
            "SELECT insumo_id, quantity FROM recipe_insumos WHERE recipe_id = ?1",
        )
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(InsumoEdge {
                    insumo_id: row.insumo_id,
                    quantity: parse_decimal("recipe_insumos.quantity", &row.quantity)?,
                })
            })
            .collect()
    }

    async fn sub_recipe_edges_on(
        conn: &mut SqliteConnection,
        recipe_id: &str,
    ) -> DbResult<Vec<SubRecipeEdge>> {
        let rows: Vec<SubRecipeEdgeRow> = sqlx::query_as(
            "SELECT child_id, quantity FROM recipe_sub_recipes WHERE parent_id = ?1",
        )
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SubRecipeEdge {
                    child_id: row.child_id,
                    quantity: parse_decimal("recipe_sub_recipes.quantity", &row.quantity)?,
                })
            })
            .collect()
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
    use cocina_core::Insumo;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_recipes(db: &Database) {
        let repo = db.recipes();
        repo.insert(&Recipe::new("r-a", "A")).await.unwrap();
        repo.insert(&Recipe::new("r-b", "B")).await.unwrap();
        repo.insert(&Recipe::new("r-c", "C")).await.unwrap();
    }

    #[tokio::test]
    async fn test_insumo_edge_is_a_set_style_upsert() {
        let db = test_db().await;
        seed_recipes(&db).await;
        db.insumos()
            .insert(&Insumo::new("i-1", "Harina", "kg", dec("10"), dec("1")))
            .await
            .unwrap();

        let repo = db.recipes();
        repo.set_insumo_edge("r-a", "i-1", dec("2")).await.unwrap();
        repo.set_insumo_edge("r-a", "i-1", dec("3.5")).await.unwrap();

        // The unique-pair invariant holds: one edge, latest quantity.
        let edges = repo.insumo_edges("r-a").await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].quantity, dec("3.5"));
    }

    #[tokio::test]
    async fn test_insumo_edge_requires_existing_endpoints() {
        let db = test_db().await;
        seed_recipes(&db).await;

        let err = db
            .recipes()
            .set_insumo_edge("r-a", "i-ghost", dec("1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Db(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_sub_recipe_edge_rejects_self_reference() {
        let db = test_db().await;
        seed_recipes(&db).await;

        let err = db
            .recipes()
            .set_sub_recipe_edge("r-a", "r-a", dec("1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::SelfReference { .. }))
        ));
    }

    #[tokio::test]
    async fn test_sub_recipe_edge_refuses_to_close_a_cycle() {
        let db = test_db().await;
        seed_recipes(&db).await;

        let repo = db.recipes();
        repo.set_sub_recipe_edge("r-a", "r-b", dec("1")).await.unwrap();
        repo.set_sub_recipe_edge("r-b", "r-c", dec("1")).await.unwrap();

        // c -> a would make a reachable from itself through b, c.
        let err = repo
            .set_sub_recipe_edge("r-c", "r-a", dec("1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::GraphCycle { .. })
        ));

        // Nothing was persisted.
        assert!(repo.sub_recipe_edges("r-c").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_graph_materializes_reachable_subtree() {
        let db = test_db().await;
        seed_recipes(&db).await;
        db.insumos()
            .insert(&Insumo::new("i-1", "Harina", "kg", dec("10"), dec("1")))
            .await
            .unwrap();

        let repo = db.recipes();
        repo.set_sub_recipe_edge("r-a", "r-b", dec("2")).await.unwrap();
        repo.set_insumo_edge("r-b", "i-1", dec("0.5")).await.unwrap();

        let graph = repo.load_graph("r-a").await.unwrap();
        assert!(graph.contains_recipe("r-a"));
        assert!(graph.contains_recipe("r-b"));
        // r-c is not reachable from r-a and must not be loaded.
        assert!(!graph.contains_recipe("r-c"));
        assert!(graph.insumo("i-1").is_some());

        let sub = graph.direct_sub_recipe_edges("r-a").unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].quantity, dec("2"));
    }

    #[tokio::test]
    async fn test_load_graph_unknown_root() {
        let db = test_db().await;
        seed_recipes(&db).await;

        let err = db.recipes().load_graph("r-ghost").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::RecipeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_recipe_cascades_edges() {
        let db = test_db().await;
        seed_recipes(&db).await;

        let repo = db.recipes();
        repo.set_sub_recipe_edge("r-a", "r-b", dec("1")).await.unwrap();
        repo.delete("r-b").await.unwrap();

        assert!(repo.sub_recipe_edges("r-a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let db = test_db().await;
        seed_recipes(&db).await;

        db.recipes()
            .insert(&Recipe::new("r-dough", "Masa de pizza"))
            .await
            .unwrap();

        let hits = db.recipes().search_by_name("masa").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "r-dough");
    }
}
