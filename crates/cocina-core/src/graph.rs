//! # Recipe Graph
//!
//! Explicit adjacency structure over recipes, their insumo edges and their
//! sub-recipe edges.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         RecipeGraph                                     │
//! │                                                                         │
//! │   recipe id ──► RecipeNode                                             │
//! │                 ├── recipe          (node payload)                     │
//! │                 ├── insumo_edges    [(insumo_id, qty), ...]            │
//! │                 └── sub_recipe_edges [(child_id, qty), ...]            │
//! │                                                                         │
//! │   insumo id ──► Insumo              (catalog snapshot for the walk)    │
//! │                                                                         │
//! │   Example:   Pizza ──1──► Dough ──2kg──► Flour                         │
//! │                └──0.3kg──► Cheese                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The structure is deliberately independent of any persistence technology:
//! the db layer materializes a subtree into a `RecipeGraph`, and the cost
//! resolver and consumption planner only ever see this snapshot. Structural
//! edits happen through catalog management, not here; within a walk the
//! graph is read-only.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Insumo, InsumoEdge, Recipe, SubRecipeEdge};
use crate::validation::validate_edge_quantity;

/// A recipe node with its outgoing edges.
#[derive(Debug, Clone)]
struct RecipeNode {
    recipe: Recipe,
    insumo_edges: Vec<InsumoEdge>,
    sub_recipe_edges: Vec<SubRecipeEdge>,
}

/// Adjacency view of the recipe graph plus the insumo catalog snapshot for
/// the loaded subtree.
#[derive(Debug, Clone, Default)]
pub struct RecipeGraph {
    nodes: HashMap<String, RecipeNode>,
    insumos: HashMap<String, Insumo>,
}

impl RecipeGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        RecipeGraph::default()
    }

    /// Adds a recipe node (no-op if the id is already present).
    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.nodes.entry(recipe.id.clone()).or_insert(RecipeNode {
            recipe,
            insumo_edges: Vec::new(),
            sub_recipe_edges: Vec::new(),
        });
    }

    /// Adds an insumo to the catalog snapshot (replacing any previous entry).
    pub fn add_insumo(&mut self, insumo: Insumo) {
        self.insumos.insert(insumo.id.clone(), insumo);
    }

    /// Adds a Recipe→Insumo edge.
    ///
    /// ## Errors
    /// - `RecipeNotFound` if the recipe is not in the graph
    /// - `Validation(DuplicateEdge)` if the (recipe, insumo) pair already
    ///   has an edge (unique-pair invariant)
    /// - `Validation(MustBeNonNegative)` for a negative quantity
    pub fn add_insumo_edge(&mut self, recipe_id: &str, edge: InsumoEdge) -> CoreResult<()> {
        validate_edge_quantity(edge.quantity)?;

        let node = self
            .nodes
            .get_mut(recipe_id)
            .ok_or_else(|| CoreError::RecipeNotFound(recipe_id.to_string()))?;

        if node.insumo_edges.iter().any(|e| e.insumo_id == edge.insumo_id) {
            return Err(ValidationError::DuplicateEdge {
                recipe_id: recipe_id.to_string(),
                ingredient_id: edge.insumo_id,
            }
            .into());
        }

        node.insumo_edges.push(edge);
        Ok(())
    }

    /// Adds a Recipe→Recipe edge.
    ///
    /// ## Errors
    /// - `RecipeNotFound` if the parent is not in the graph
    /// - `Validation(SelfReference)` if parent and child are the same node
    /// - `Validation(DuplicateEdge)` if the (parent, child) pair already
    ///   has an edge
    /// - `Validation(MustBeNonNegative)` for a negative quantity
    ///
    /// Longer cycles are not checked here: traversal detects them, and the
    /// repository layer refuses to persist them in the first place.
    pub fn add_sub_recipe_edge(&mut self, parent_id: &str, edge: SubRecipeEdge) -> CoreResult<()> {
        validate_edge_quantity(edge.quantity)?;

        if parent_id == edge.child_id {
            return Err(ValidationError::SelfReference {
                recipe_id: parent_id.to_string(),
            }
            .into());
        }

        let node = self
            .nodes
            .get_mut(parent_id)
            .ok_or_else(|| CoreError::RecipeNotFound(parent_id.to_string()))?;

        if node.sub_recipe_edges.iter().any(|e| e.child_id == edge.child_id) {
            return Err(ValidationError::DuplicateEdge {
                recipe_id: parent_id.to_string(),
                ingredient_id: edge.child_id,
            }
            .into());
        }

        node.sub_recipe_edges.push(edge);
        Ok(())
    }

    /// Whether a recipe node is present.
    pub fn contains_recipe(&self, recipe_id: &str) -> bool {
        self.nodes.contains_key(recipe_id)
    }

    /// Node payload for a recipe, if present.
    pub fn recipe(&self, recipe_id: &str) -> Option<&Recipe> {
        self.nodes.get(recipe_id).map(|n| &n.recipe)
    }

    /// Catalog snapshot entry for an insumo, if present.
    pub fn insumo(&self, insumo_id: &str) -> Option<&Insumo> {
        self.insumos.get(insumo_id)
    }

    /// Direct Recipe→Insumo edges of a recipe. Order is irrelevant.
    pub fn direct_insumo_edges(&self, recipe_id: &str) -> CoreResult<&[InsumoEdge]> {
        self.nodes
            .get(recipe_id)
            .map(|n| n.insumo_edges.as_slice())
            .ok_or_else(|| CoreError::RecipeNotFound(recipe_id.to_string()))
    }

    /// Direct Recipe→Recipe edges of a recipe. Order is irrelevant.
    pub fn direct_sub_recipe_edges(&self, recipe_id: &str) -> CoreResult<&[SubRecipeEdge]> {
        self.nodes
            .get(recipe_id)
            .map(|n| n.sub_recipe_edges.as_slice())
            .ok_or_else(|| CoreError::RecipeNotFound(recipe_id.to_string()))
    }

    /// Ids of all recipe nodes in the graph.
    pub fn recipe_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Whether `target` is reachable from `from` by following sub-recipe
    /// edges (including `from == target`).
    ///
    /// Used by catalog management before persisting a new sub-recipe edge:
    /// adding parent→child is illegal when the parent is reachable from the
    /// child, because the new edge would close a cycle.
    pub fn is_reachable(&self, from: &str, target: &str) -> bool {
        if from == target {
            return true;
        }

        let mut pending = vec![from];
        let mut seen = std::collections::HashSet::new();

        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            for edge in &node.sub_recipe_edges {
                if edge.child_id == target {
                    return true;
                }
                pending.push(edge.child_id.as_str());
            }
        }

        false
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn graph_with_recipe(id: &str) -> RecipeGraph {
        let mut graph = RecipeGraph::new();
        graph.add_recipe(Recipe::new(id, "Test"));
        graph
    }

    #[test]
    fn test_edges_round_trip() {
        let mut graph = graph_with_recipe("r-1");
        graph
            .add_insumo_edge("r-1", InsumoEdge::new("i-1", dec("2")))
            .unwrap();
        graph.add_recipe(Recipe::new("r-2", "Child"));
        graph
            .add_sub_recipe_edge("r-1", SubRecipeEdge::new("r-2", dec("0.5")))
            .unwrap();

        let insumo_edges = graph.direct_insumo_edges("r-1").unwrap();
        assert_eq!(insumo_edges.len(), 1);
        assert_eq!(insumo_edges[0].insumo_id, "i-1");

        let sub_edges = graph.direct_sub_recipe_edges("r-1").unwrap();
        assert_eq!(sub_edges.len(), 1);
        assert_eq!(sub_edges[0].child_id, "r-2");
        assert_eq!(sub_edges[0].quantity, dec("0.5"));
    }

    #[test]
    fn test_duplicate_insumo_edge_rejected() {
        let mut graph = graph_with_recipe("r-1");
        graph
            .add_insumo_edge("r-1", InsumoEdge::new("i-1", dec("2")))
            .unwrap();

        let err = graph
            .add_insumo_edge("r-1", InsumoEdge::new("i-1", dec("3")))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateEdge { .. })
        ));
    }

    #[test]
    fn test_duplicate_sub_recipe_edge_rejected() {
        let mut graph = graph_with_recipe("r-1");
        graph.add_recipe(Recipe::new("r-2", "Child"));
        graph
            .add_sub_recipe_edge("r-1", SubRecipeEdge::new("r-2", dec("1")))
            .unwrap();

        let err = graph
            .add_sub_recipe_edge("r-1", SubRecipeEdge::new("r-2", dec("2")))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateEdge { .. })
        ));
    }

    #[test]
    fn test_self_edge_rejected() {
        let mut graph = graph_with_recipe("r-1");
        let err = graph
            .add_sub_recipe_edge("r-1", SubRecipeEdge::new("r-1", dec("1")))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::SelfReference { .. })
        ));
    }

    #[test]
    fn test_negative_edge_quantity_rejected() {
        let mut graph = graph_with_recipe("r-1");
        let err = graph
            .add_insumo_edge("r-1", InsumoEdge::new("i-1", dec("-1")))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_unknown_recipe_errors() {
        let graph = RecipeGraph::new();
        assert!(matches!(
            graph.direct_insumo_edges("missing"),
            Err(CoreError::RecipeNotFound(_))
        ));
    }

    #[test]
    fn test_is_reachable() {
        let mut graph = graph_with_recipe("r-a");
        graph.add_recipe(Recipe::new("r-b", "B"));
        graph.add_recipe(Recipe::new("r-c", "C"));
        graph
            .add_sub_recipe_edge("r-a", SubRecipeEdge::new("r-b", dec("1")))
            .unwrap();
        graph
            .add_sub_recipe_edge("r-b", SubRecipeEdge::new("r-c", dec("1")))
            .unwrap();

        assert!(graph.is_reachable("r-a", "r-c"));
        assert!(graph.is_reachable("r-a", "r-a"));
        assert!(!graph.is_reachable("r-c", "r-a"));
    }
}
