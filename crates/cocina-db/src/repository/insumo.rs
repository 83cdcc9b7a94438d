//! # Insumo Repository
//!
//! Database operations for insumos (raw materials).
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: unguarded read-modify-write (lost updates)                  │
//! │     read stock → compute → UPDATE insumos SET stock = ?                │
//! │                                                                         │
//! │  ✅ CORRECT: conditional on the version read in the same snapshot      │
//! │     UPDATE insumos SET stock = ?, version = version + 1                │
//! │     WHERE id = ? AND version = ?                                       │
//! │                                                                         │
//! │  Zero rows affected + row present = another sale won the race          │
//! │  → ConcurrencyConflict, transaction rolls back, caller retries         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::decimal::{encode_decimal, parse_decimal};
use crate::error::{DbError, DbResult};
use cocina_core::Insumo;

/// Raw row as stored; decimal columns are TEXT.
#[derive(sqlx::FromRow)]
struct InsumoRow {
    id: String,
    name: String,
    description: Option<String>,
    unit_of_measure: String,
    stock: String,
    unit_cost: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl InsumoRow {
    fn into_domain(self) -> DbResult<Insumo> {
        Ok(Insumo {
            id: self.id,
            name: self.name,
            description: self.description,
            unit_of_measure: self.unit_of_measure,
            stock: parse_decimal("insumos.stock", &self.stock)?,
            unit_cost: parse_decimal("insumos.unit_cost", &self.unit_cost)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

const SELECT_INSUMO: &str = "SELECT id, name, description, unit_of_measure, stock, unit_cost, \
     created_at, updated_at, version FROM insumos";

/// Repository for insumo database operations.
#[derive(Debug, Clone)]
pub struct InsumoRepository {
    pool: SqlitePool,
}

impl InsumoRepository {
    /// Creates a new InsumoRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InsumoRepository { pool }
    }

    /// Inserts a new insumo.
    pub async fn insert(&self, insumo: &Insumo) -> DbResult<()> {
        debug!(id = %insumo.id, name = %insumo.name, "Inserting insumo");

        sqlx::query(
            "INSERT INTO insumos (id, name, description, unit_of_measure, stock, unit_cost, \
             created_at, updated_at, version) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&insumo.id)
        .bind(&insumo.name)
        .bind(&insumo.description)
        .bind(&insumo.unit_of_measure)
        .bind(encode_decimal(insumo.stock))
        .bind(encode_decimal(insumo.unit_cost))
        .bind(insumo.created_at)
        .bind(insumo.updated_at)
        .bind(insumo.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an insumo by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Insumo>> {
        let row: Option<InsumoRow> =
            sqlx::query_as(&format!("{SELECT_INSUMO} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(InsumoRow::into_domain).transpose()
    }

    /// Lists all insumos, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Insumo>> {
        let rows: Vec<InsumoRow> = sqlx::query_as(&format!("{SELECT_INSUMO} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(InsumoRow::into_domain).collect()
    }

    /// Searches insumos by name fragment, sorted by name.
    pub async fn search_by_name(&self, query: &str) -> DbResult<Vec<Insumo>> {
        let pattern = format!("%{}%", query.trim());

        let rows: Vec<InsumoRow> =
            sqlx::query_as(&format!("{SELECT_INSUMO} WHERE name LIKE ?1 ORDER BY name"))
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(InsumoRow::into_domain).collect()
    }

    /// Updates an insumo's catalog fields (name, description, unit, cost).
    ///
    /// Stock is deliberately not written here: the consumption engine owns
    /// stock deductions, and restocking goes through [`Self::set_stock`].
    pub async fn update(&self, insumo: &Insumo) -> DbResult<()> {
        debug!(id = %insumo.id, "Updating insumo");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE insumos SET name = ?2, description = ?3, unit_of_measure = ?4, \
             unit_cost = ?5, updated_at = ?6, version = version + 1 WHERE id = ?1",
        )
        .bind(&insumo.id)
        .bind(&insumo.name)
        .bind(&insumo.description)
        .bind(&insumo.unit_of_measure)
        .bind(encode_decimal(insumo.unit_cost))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Insumo", &insumo.id));
        }

        Ok(())
    }

    /// Sets an insumo's stock level (restock / manual correction).
    pub async fn set_stock(&self, id: &str, stock: Decimal) -> DbResult<()> {
        debug!(id = %id, stock = %stock, "Setting insumo stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE insumos SET stock = ?2, updated_at = ?3, version = version + 1 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(encode_decimal(stock))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Insumo", id));
        }

        Ok(())
    }

    /// Deletes an insumo. Edges referencing it cascade away.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting insumo");

        let result = sqlx::query("DELETE FROM insumos WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Insumo", id));
        }

        Ok(())
    }

    /// Counts insumos (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM insumos")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Applies one planned stock deduction inside an open transaction.
    ///
    /// The write is conditional on the version observed when the graph
    /// snapshot was loaded in the same transaction. Zero rows affected
    /// means either the insumo vanished (NotFound) or another transaction
    /// bumped the version first (ConcurrencyConflict); the caller rolls
    /// back and retries the whole sale in the latter case.
    pub async fn deduct_stock_tx(
        conn: &mut SqliteConnection,
        id: &str,
        new_stock: Decimal,
        expected_version: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE insumos SET stock = ?2, updated_at = ?3, version = version + 1 \
             WHERE id = ?1 AND version = ?4",
        )
        .bind(id)
        .bind(encode_decimal(new_stock))
        .bind(now)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT version FROM insumos WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;

            return Err(match exists {
                Some(_) => DbError::conflict("Insumo", id),
                None => DbError::not_found("Insumo", id),
            });
        }

        debug!(id = %id, new_stock = %new_stock, "Deducted insumo stock");
        Ok(())
    }

    /// Fetches an insumo inside an open transaction.
    pub(crate) async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Insumo>> {
        let row: Option<InsumoRow> =
            sqlx::query_as(&format!("{SELECT_INSUMO} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(InsumoRow::into_domain).transpose()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = test_db().await;
        let repo = db.insumos();

        let mut insumo = Insumo::new("i-1", "Harina", "kg", dec("12.5"), dec("10.25"));
        insumo.description = Some("Harina 000".to_string());
        repo.insert(&insumo).await.unwrap();

        let loaded = repo.get_by_id("i-1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Harina");
        assert_eq!(loaded.description.as_deref(), Some("Harina 000"));
        assert_eq!(loaded.stock, dec("12.5"));
        assert_eq!(loaded.unit_cost, dec("10.25"));
        assert_eq!(loaded.version, 0);

        assert!(repo.get_by_id("i-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let db = test_db().await;
        let repo = db.insumos();

        repo.insert(&Insumo::new("i-1", "Harina", "kg", dec("1"), dec("1")))
            .await
            .unwrap();
        repo.insert(&Insumo::new("i-2", "Queso", "kg", dec("1"), dec("1")))
            .await
            .unwrap();

        let hits = repo.search_by_name("har").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "i-1");
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_deduct_stock_checks_version() {
        let db = test_db().await;
        let repo = db.insumos();
        repo.insert(&Insumo::new("i-1", "Harina", "kg", dec("10"), dec("1")))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();

        // Matching version succeeds and bumps the counter.
        InsumoRepository::deduct_stock_tx(&mut conn, "i-1", dec("8"), 0)
            .await
            .unwrap();
        let loaded = repo.get_by_id("i-1").await.unwrap().unwrap();
        assert_eq!(loaded.stock, dec("8"));
        assert_eq!(loaded.version, 1);

        // Stale version is a conflict, not a silent lost update.
        let err = InsumoRepository::deduct_stock_tx(&mut conn, "i-1", dec("6"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConcurrencyConflict { .. }));
        assert_eq!(repo.get_by_id("i-1").await.unwrap().unwrap().stock, dec("8"));

        // Unknown id is NotFound, even with a "matching" version.
        let err = InsumoRepository::deduct_stock_tx(&mut conn, "i-ghost", dec("1"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = test_db().await;
        let err = db.insumos().delete("i-ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
