//! # Repository Module
//!
//! Repository implementations for catalog access.
//!
//! ## Repository Pattern
//! Each repository:
//! - Owns a clone of the shared connection pool
//! - Provides typed methods for one entity's queries
//! - Returns `DbResult<T>` (or `ServiceResult<T>` where engine validation
//!   is involved, e.g. edge management)
//!
//! ## Available Repositories
//! - [`insumo::InsumoRepository`] - raw materials and their stock
//! - [`recipe::RecipeRepository`] - recipes, edges, graph loading
//! - [`product::ProductRepository`] - sellable products and recipe bindings
//! - [`category::CategoryRepository`] - product categories

pub mod category;
pub mod insumo;
pub mod product;
pub mod recipe;

use uuid::Uuid;

/// Generates a new UUID-v4 entity id.
///
/// ## Usage
/// ```rust,ignore
/// let insumo = Insumo::new(generate_id(), "Flour", "kg", stock, cost);
/// ```
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
