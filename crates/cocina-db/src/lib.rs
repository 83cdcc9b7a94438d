//! # cocina-db: Database Layer for the Cocina Back Office
//!
//! This crate provides SQLite persistence for the recipe-based inventory
//! engine, plus the two service entrypoints the surrounding request
//! handlers invoke in-process: sale confirmation and recipe costing.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cocina Data Flow                               │
//! │                                                                         │
//! │  Sale trigger {product, qty}          Costing query {recipe}           │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cocina-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │   Services   │  │   │
//! │  │   │   (pool.rs)   │    │ insumo/recipe │    │ sales/costing│  │   │
//! │  │   │               │    │ product/...   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ typed queries │◄───│ transactions │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │                                                     │          │   │
//! │  └─────────────────────────────────────────────────────┼──────────┘   │
//! │                                                        ▼               │
//! │                                   cocina-core (pure engine)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Repository implementations (insumo, recipe, ...)
//! - [`sales`] - Sale-confirmation service (transactional consumption)
//! - [`costing`] - Costing-query service (snapshot reads)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cocina_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/cocina.db")).await?;
//!
//! // Confirm a sale: walks the recipe graph, deducts every reachable
//! // insumo, all-or-nothing.
//! let outcome = db.sales().sell(&product_id, quantity).await?;
//!
//! // Resolve a recipe's unit cost.
//! let cost = db.costing().recipe_unit_cost(&recipe_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
mod decimal;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sales;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, ServiceError};
pub use pool::{Database, DbConfig};

// Repository and service re-exports for convenience
pub use costing::CostingService;
pub use repository::category::CategoryRepository;
pub use repository::insumo::InsumoRepository;
pub use repository::product::ProductRepository;
pub use repository::recipe::RecipeRepository;
pub use sales::{SaleOutcome, SaleService};
