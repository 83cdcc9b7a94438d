//! # Consumption Planner
//!
//! Phase 1 of a sale: a read-only dry-run over the recipe subtree that
//! computes every insumo deduction and validates stock *before* anything is
//! written.
//!
//! ## Two-Phase Consumption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Phase 1 (THIS MODULE, pure)                                            │
//! │    explode the subtree ──► total need per insumo                       │
//! │    validate against current stock                                      │
//! │    ├── any shortfall? → InsufficientStock, NOTHING deducted            │
//! │    └── ok → ConsumptionPlan (deductions sorted by insumo id)           │
//! │                                                                         │
//! │  Phase 2 (cocina-db, one transaction)                                  │
//! │    apply every planned deduction with a version check                  │
//! │    └── all insumos deducted, or none are                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A consumption that would drive any insumo negative is rejected whole;
//! stock is never silently clamped at zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::graph::RecipeGraph;
use crate::traversal::explode;

/// One validated stock deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedDeduction {
    /// Insumo being deducted.
    pub insumo_id: String,

    /// Display name, carried for reporting.
    pub insumo_name: String,

    /// Total quantity required across the whole subtree.
    pub required: Decimal,

    /// Stock level the plan was validated against.
    pub available: Decimal,

    /// Stock level after the deduction. Never negative.
    pub new_stock: Decimal,
}

/// The full, validated deduction set for one consumption.
///
/// Deductions are sorted by insumo id; phase 2 applies them in this order
/// so concurrent consumptions touching overlapping insumo sets always write
/// in the same global order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionPlan {
    /// Root recipe of the walk.
    pub recipe_id: String,

    /// Recipe-units consumed.
    pub quantity: Decimal,

    /// Validated deductions, sorted by insumo id.
    pub deductions: Vec<PlannedDeduction>,
}

impl ConsumptionPlan {
    /// Whether the plan deducts anything at all.
    pub fn is_empty(&self) -> bool {
        self.deductions.is_empty()
    }
}

/// Plans the consumption of `quantity` recipe-units.
///
/// Read-only: the graph snapshot is not touched. Phase 2 (the db layer)
/// turns the returned plan into conditional stock writes inside one
/// transaction.
///
/// ## Errors
/// - `InsufficientStock` - the first insumo (in id order) whose stock does
///   not cover its total requirement; nothing is deducted
/// - `InsumoNotFound` - an edge references an insumo missing from the
///   catalog snapshot
/// - `RecipeNotFound` / `GraphCycle` / `TraversalDepthExceeded` - defective
///   graph, surfaced before any stock is considered
/// - `Validation(MustBeNonNegative)` - negative `quantity`
pub fn plan_consumption(
    graph: &RecipeGraph,
    recipe_id: &str,
    quantity: Decimal,
) -> CoreResult<ConsumptionPlan> {
    let requirements = explode(graph, recipe_id, quantity)?;

    let mut deductions = Vec::with_capacity(requirements.len());
    for (insumo_id, required) in requirements {
        if required.is_zero() {
            continue;
        }

        let insumo = graph
            .insumo(&insumo_id)
            .ok_or_else(|| CoreError::InsumoNotFound(insumo_id.clone()))?;

        if !insumo.has_stock_for(required) {
            return Err(CoreError::InsufficientStock {
                insumo_id,
                insumo_name: insumo.name.clone(),
                required,
                available: insumo.stock,
            });
        }

        deductions.push(PlannedDeduction {
            insumo_id,
            insumo_name: insumo.name.clone(),
            required,
            available: insumo.stock,
            new_stock: insumo.stock - required,
        });
    }

    Ok(ConsumptionPlan {
        recipe_id: recipe_id.to_string(),
        quantity,
        deductions,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Insumo, InsumoEdge, Recipe, SubRecipeEdge};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// Flour 100 kg @ $10, Cheese 50 kg @ $20; Dough = 2 kg Flour;
    /// Pizza = 1 x Dough + 0.3 kg Cheese.
    fn pizza_graph() -> RecipeGraph {
        let mut graph = RecipeGraph::new();
        graph.add_insumo(Insumo::new("i-flour", "Flour", "kg", dec("100"), dec("10")));
        graph.add_insumo(Insumo::new("i-cheese", "Cheese", "kg", dec("50"), dec("20")));
        graph.add_recipe(Recipe::new("r-dough", "Dough"));
        graph.add_recipe(Recipe::new("r-pizza", "Pizza"));
        graph
            .add_insumo_edge("r-dough", InsumoEdge::new("i-flour", dec("2")))
            .unwrap();
        graph
            .add_insumo_edge("r-pizza", InsumoEdge::new("i-cheese", dec("0.3")))
            .unwrap();
        graph
            .add_sub_recipe_edge("r-pizza", SubRecipeEdge::new("r-dough", dec("1")))
            .unwrap();
        graph
    }

    #[test]
    fn test_plan_multiplies_through_two_levels() {
        let graph = pizza_graph();
        let plan = plan_consumption(&graph, "r-pizza", dec("5")).unwrap();

        assert_eq!(plan.deductions.len(), 2);

        // Sorted by insumo id: i-cheese before i-flour.
        let cheese = &plan.deductions[0];
        assert_eq!(cheese.insumo_id, "i-cheese");
        assert_eq!(cheese.required, dec("1.5"));
        assert_eq!(cheese.new_stock, dec("48.5"));

        let flour = &plan.deductions[1];
        assert_eq!(flour.insumo_id, "i-flour");
        assert_eq!(flour.required, dec("10"));
        assert_eq!(flour.new_stock, dec("90"));
    }

    #[test]
    fn test_plan_exact_stock_is_allowed() {
        let graph = pizza_graph();
        // 50 pizzas need exactly 100 kg flour.
        let plan = plan_consumption(&graph, "r-pizza", dec("50")).unwrap();
        assert_eq!(plan.deductions[1].new_stock, dec("0"));
    }

    #[test]
    fn test_plan_rejects_shortfall_with_first_offender() {
        let graph = pizza_graph();
        // 51 pizzas need 102 kg flour (have 100) and 15.3 kg cheese (have 50).
        let err = plan_consumption(&graph, "r-pizza", dec("51")).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                insumo_id,
                required,
                available,
                ..
            } => {
                assert_eq!(insumo_id, "i-flour");
                assert_eq!(required, dec("102"));
                assert_eq!(available, dec("100"));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(
            plan_consumption(&graph, "r-pizza", dec("51"))
                .unwrap_err()
                .shortfall(),
            Some(dec("2"))
        );
    }

    #[test]
    fn test_plan_zero_quantity_is_a_noop() {
        let graph = pizza_graph();
        let plan = plan_consumption(&graph, "r-pizza", dec("0")).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_cycle_is_rejected_before_stock_checks() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe(Recipe::new("r-a", "A"));
        graph.add_recipe(Recipe::new("r-b", "B"));
        graph
            .add_sub_recipe_edge("r-a", SubRecipeEdge::new("r-b", dec("1")))
            .unwrap();
        graph
            .add_sub_recipe_edge("r-b", SubRecipeEdge::new("r-a", dec("1")))
            .unwrap();

        assert!(matches!(
            plan_consumption(&graph, "r-a", dec("1")).unwrap_err(),
            CoreError::GraphCycle { .. }
        ));
    }

    #[test]
    fn test_plan_missing_insumo() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe(Recipe::new("r-1", "Mix"));
        graph
            .add_insumo_edge("r-1", InsumoEdge::new("i-ghost", dec("1")))
            .unwrap();

        assert!(matches!(
            plan_consumption(&graph, "r-1", dec("1")).unwrap_err(),
            CoreError::InsumoNotFound(_)
        ));
    }
}
