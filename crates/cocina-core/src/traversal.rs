//! # Shared Traversal
//!
//! One explicit depth-first walk used by both the cost resolver and the
//! consumption planner.
//!
//! ## BOM Explosion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              explode("Pizza", 5)                                        │
//! │                                                                         │
//! │  Pizza ──1──► Dough ──2kg──► Flour      5 × 1 × 2   = 10 kg Flour      │
//! │    └────────0.3kg──► Cheese             5 × 0.3     = 1.5 kg Cheese    │
//! │                                                                         │
//! │  Edge quantities multiply through every nesting level; the result is   │
//! │  the total requirement per insumo for the whole subtree.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The walk is iterative (manual frame stack, no native recursion) and
//! carries a currently-on-path set: re-entering a recipe on the active path
//! raises [`CoreError::GraphCycle`] instead of recursing unguarded, and
//! [`crate::MAX_RECIPE_DEPTH`] bounds worst-case work on pathological
//! catalogs. A node reached twice via *different* paths (a diamond) is
//! legal and contributes once per path, as the multiplicative rule requires.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::graph::RecipeGraph;
use crate::types::SubRecipeEdge;
use crate::validation::validate_consumed_quantity;
use crate::MAX_RECIPE_DEPTH;

/// One level of the manual DFS stack: a recipe being expanded, the cursor
/// into its sub-recipe edges, and the multiplier accumulated along the path
/// from the root.
struct Frame<'g> {
    recipe_id: &'g str,
    edges: &'g [SubRecipeEdge],
    next: usize,
    multiplier: Decimal,
}

/// Computes total insumo requirements for consuming `quantity` units of the
/// recipe, propagating quantities multiplicatively through every level of
/// sub-recipe nesting.
///
/// The map is keyed by insumo id; `BTreeMap` iteration order is the fixed
/// order downstream stock writes are applied in, which keeps concurrent
/// consumptions that share insumos from deadlocking each other.
///
/// Pure read-only walk: phase 1 of a consumption, and (with `quantity = 1`)
/// the skeleton of the cost resolver.
///
/// ## Errors
/// - `RecipeNotFound` - the root or a sub-recipe edge target is missing
/// - `GraphCycle` - a recipe was re-entered on the active path
/// - `TraversalDepthExceeded` - nesting deeper than [`MAX_RECIPE_DEPTH`]
/// - `Validation(MustBeNonNegative)` - negative `quantity`
pub fn explode(
    graph: &RecipeGraph,
    recipe_id: &str,
    quantity: Decimal,
) -> CoreResult<BTreeMap<String, Decimal>> {
    validate_consumed_quantity(quantity)?;

    let mut requirements: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut on_path: HashSet<&str> = HashSet::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    enter(graph, recipe_id, quantity, &mut requirements, &mut on_path, &mut stack)?;

    while let Some(frame) = stack.last_mut() {
        let edges = frame.edges;
        if frame.next < edges.len() {
            let edge = &edges[frame.next];
            frame.next += 1;
            let child_multiplier = frame.multiplier * edge.quantity;
            enter(
                graph,
                edge.child_id.as_str(),
                child_multiplier,
                &mut requirements,
                &mut on_path,
                &mut stack,
            )?;
        } else {
            let finished = frame.recipe_id;
            stack.pop();
            on_path.remove(finished);
        }
    }

    Ok(requirements)
}

/// Pushes a recipe onto the walk: cycle and depth checks, then accumulate
/// its direct insumo requirements and queue its sub-recipe edges.
fn enter<'g>(
    graph: &'g RecipeGraph,
    recipe_id: &str,
    multiplier: Decimal,
    requirements: &mut BTreeMap<String, Decimal>,
    on_path: &mut HashSet<&'g str>,
    stack: &mut Vec<Frame<'g>>,
) -> CoreResult<()> {
    if on_path.contains(recipe_id) {
        let mut path: Vec<String> = stack.iter().map(|f| f.recipe_id.to_string()).collect();
        path.push(recipe_id.to_string());
        return Err(CoreError::GraphCycle {
            recipe_id: recipe_id.to_string(),
            path,
        });
    }

    if stack.len() >= MAX_RECIPE_DEPTH {
        return Err(CoreError::TraversalDepthExceeded {
            recipe_id: recipe_id.to_string(),
            limit: MAX_RECIPE_DEPTH,
        });
    }

    // Resolve to the graph-owned key so the borrow outlives this call.
    let node_recipe = graph
        .recipe(recipe_id)
        .ok_or_else(|| CoreError::RecipeNotFound(recipe_id.to_string()))?;
    let recipe_id: &'g str = node_recipe.id.as_str();

    for edge in graph.direct_insumo_edges(recipe_id)? {
        *requirements.entry(edge.insumo_id.clone()).or_default() += edge.quantity * multiplier;
    }

    on_path.insert(recipe_id);
    stack.push(Frame {
        recipe_id,
        edges: graph.direct_sub_recipe_edges(recipe_id)?,
        next: 0,
        multiplier,
    });

    Ok(())
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

    fn insumo(id: &str, name: &str) -> Insumo {
        Insumo::new(id, name, "kg", dec("100"), dec("10"))
    }

    /// Pizza = 1 x Dough + 0.3 kg Cheese; Dough = 2 kg Flour.
    fn pizza_graph() -> RecipeGraph {
        let mut graph = RecipeGraph::new();
        graph.add_insumo(insumo("i-flour", "Flour"));
        graph.add_insumo(insumo("i-cheese", "Cheese"));
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
    fn test_explode_flat_recipe() {
        let graph = pizza_graph();
        let requirements = explode(&graph, "r-dough", dec("3")).unwrap();

        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements["i-flour"], dec("6"));
    }

    #[test]
    fn test_explode_multiplies_through_nesting() {
        let graph = pizza_graph();
        let requirements = explode(&graph, "r-pizza", dec("5")).unwrap();

        // 5 pizzas x 1 dough x 2 kg flour, 5 pizzas x 0.3 kg cheese
        assert_eq!(requirements["i-flour"], dec("10"));
        assert_eq!(requirements["i-cheese"], dec("1.5"));
    }

    #[test]
    fn test_explode_diamond_accumulates_per_path() {
        // Top uses Dough directly (x1) and via Pizza (x2); Flour must count
        // both paths: 2kg + 2 x 1 x 2kg = 6kg per Top unit.
        let mut graph = pizza_graph();
        graph.add_recipe(Recipe::new("r-top", "Top"));
        graph
            .add_sub_recipe_edge("r-top", SubRecipeEdge::new("r-dough", dec("1")))
            .unwrap();
        graph
            .add_sub_recipe_edge("r-top", SubRecipeEdge::new("r-pizza", dec("2")))
            .unwrap();

        let requirements = explode(&graph, "r-top", dec("1")).unwrap();
        assert_eq!(requirements["i-flour"], dec("6"));
        assert_eq!(requirements["i-cheese"], dec("0.6"));
    }

    #[test]
    fn test_explode_zero_quantity_yields_zero_requirements() {
        let graph = pizza_graph();
        let requirements = explode(&graph, "r-pizza", dec("0")).unwrap();

        assert_eq!(requirements["i-flour"], dec("0"));
        assert_eq!(requirements["i-cheese"], dec("0"));
    }

    #[test]
    fn test_explode_missing_recipe() {
        let graph = pizza_graph();
        let err = explode(&graph, "r-nope", dec("1")).unwrap_err();
        assert!(matches!(err, CoreError::RecipeNotFound(_)));
    }

    #[test]
    fn test_explode_negative_quantity_rejected() {
        let graph = pizza_graph();
        let err = explode(&graph, "r-pizza", dec("-1")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_explode_detects_two_node_cycle() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe(Recipe::new("r-a", "A"));
        graph.add_recipe(Recipe::new("r-b", "B"));
        graph
            .add_sub_recipe_edge("r-a", SubRecipeEdge::new("r-b", dec("1")))
            .unwrap();
        graph
            .add_sub_recipe_edge("r-b", SubRecipeEdge::new("r-a", dec("1")))
            .unwrap();

        let err = explode(&graph, "r-a", dec("1")).unwrap_err();
        match err {
            CoreError::GraphCycle { recipe_id, path } => {
                assert_eq!(recipe_id, "r-a");
                assert_eq!(path, vec!["r-a", "r-b", "r-a"]);
            }
            other => panic!("expected GraphCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_explode_depth_limit_backstop() {
        // A strictly deeper-than-limit chain without a cycle.
        let mut graph = RecipeGraph::new();
        let ids: Vec<String> = (0..=MAX_RECIPE_DEPTH).map(|i| format!("r-{i}")).collect();
        for id in &ids {
            graph.add_recipe(Recipe::new(id.clone(), id.clone()));
        }
        for pair in ids.windows(2) {
            graph
                .add_sub_recipe_edge(&pair[0], SubRecipeEdge::new(pair[1].clone(), dec("1")))
                .unwrap();
        }

        let err = explode(&graph, &ids[0], dec("1")).unwrap_err();
        assert!(matches!(err, CoreError::TraversalDepthExceeded { .. }));
    }
}
