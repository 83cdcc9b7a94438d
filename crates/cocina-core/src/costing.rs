//! # Cost Resolver
//!
//! Computes the unit cost of a recipe: the cost to produce exactly one
//! recipe-unit, summed recursively over direct insumo edges and sub-recipe
//! edges.
//!
//! ## Algorithm
//! ```text
//! cost(recipe) = Σ insumo.unit_cost × edge.quantity     (direct insumos)
//!              + Σ cost(child) × edge.quantity          (sub-recipes)
//! ```
//!
//! The implementation rides on [`crate::traversal::explode`]: by
//! distributivity, the recursive sum equals the flat sum of
//! `unit_cost × total_required` over the exploded per-insumo requirements
//! of one recipe-unit — and the exploded form shares cycle detection with
//! the consumption planner.
//!
//! Pure function of the graph's current state: nothing is cached or
//! persisted, every invocation re-walks the subtree. Rounding to the
//! currency's 2 minor-unit digits happens once, here, at the outermost
//! level — intermediate contributions stay unrounded.

use rust_decimal::Decimal;

use crate::cost::Cost;
use crate::error::{CoreError, CoreResult};
use crate::graph::RecipeGraph;
use crate::traversal::explode;

/// Computes the unit cost of a recipe, rounded to currency precision.
///
/// ## Errors
/// - `RecipeNotFound` - the recipe (or a nested sub-recipe) is missing
/// - `InsumoNotFound` - an edge references an insumo missing from the
///   catalog snapshot
/// - `GraphCycle` / `TraversalDepthExceeded` - defective graph
///
/// ## Example
/// ```text
/// Flour $10/kg, Cheese $20/kg
/// Dough = 2 kg Flour                cost(Dough) = 20
/// Pizza = 1 x Dough + 0.3 kg Cheese cost(Pizza) = 20 + 6 = 26
/// ```
pub fn unit_cost(graph: &RecipeGraph, recipe_id: &str) -> CoreResult<Cost> {
    let requirements = explode(graph, recipe_id, Decimal::ONE)?;

    let mut total = Decimal::ZERO;
    for (insumo_id, required) in &requirements {
        let insumo = graph
            .insumo(insumo_id)
            .ok_or_else(|| CoreError::InsumoNotFound(insumo_id.clone()))?;
        total += insumo.unit_cost * required;
    }

    Ok(Cost::new(total).rounded())
}

// =============================================================================
// Unit Tests
// =============================================================================
