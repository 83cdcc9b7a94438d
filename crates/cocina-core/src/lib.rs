//! # cocina-core: Pure Business Logic for the Cocina Back Office
//!
//! This crate is the **heart** of the recipe-based inventory engine. It
//! contains the recipe graph, the cost resolver and the consumption planner
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cocina Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              External callers (order intake, reporting)         │   │
//! │  │        sale confirmation {product, qty} · costing {recipe}      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cocina-db (Service Layer)                    │   │
//! │  │       transactions, repositories, optimistic stock writes       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cocina-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   graph   │  │ traversal │  │  costing  │  │consumption│  │   │
//! │  │   │RecipeGraph│  │  explode  │  │ unit_cost │  │   plan    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Insumo, Recipe, Product, edges)
//! - [`graph`] - Explicit adjacency structure over the recipe graph
//! - [`traversal`] - Shared iterative walk with cycle detection
//! - [`costing`] - Recursive unit-cost resolution
//! - [`consumption`] - Two-phase consumption planning
//! - [`cost`] - Decimal cost type with minor-unit rounding
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Exact Decimals**: quantities and costs use `rust_decimal`, never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use cocina_core::costing::unit_cost;
//! use cocina_core::graph::RecipeGraph;
//! use cocina_core::types::{Insumo, InsumoEdge, Recipe};
//! use rust_decimal::Decimal;
//!
//! let mut graph = RecipeGraph::new();
//! graph.add_insumo(Insumo::new("i-flour", "Flour", "kg", Decimal::from(100), Decimal::from(10)));
//! graph.add_recipe(Recipe::new("r-dough", "Dough"));
//! graph
//!     .add_insumo_edge("r-dough", InsumoEdge::new("i-flour", Decimal::from(2)))
//!     .unwrap();
//!
//! // One unit of dough costs 2 kg x $10/kg = $20.00
//! let cost = unit_cost(&graph, "r-dough").unwrap();
//! assert_eq!(cost.to_string(), "$20.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod consumption;
pub mod cost;
pub mod costing;
pub mod error;
pub mod graph;
pub mod traversal;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use cocina_core::RecipeGraph` instead of
// `use cocina_core::graph::RecipeGraph`

pub use consumption::{plan_consumption, ConsumptionPlan, PlannedDeduction};
pub use cost::Cost;
pub use costing::unit_cost;
pub use error::{CoreError, CoreResult, ValidationError};
pub use graph::RecipeGraph;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum recipe nesting depth accepted by the traversal.
///
/// Cycle detection catches a recipe re-entered on the active path; this limit
/// additionally bounds pathological (but acyclic) nesting so a bad catalog
/// produces a fast, reportable error instead of unbounded work. Real recipes
/// nest two or three levels deep.
pub const MAX_RECIPE_DEPTH: usize = 32;

/// Maximum length for display names (insumos, recipes, products, categories).
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length for a unit-of-measure label ("kg", "litros", "unidades").
pub const MAX_UNIT_OF_MEASURE_LEN: usize = 20;
