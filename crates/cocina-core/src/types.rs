//! # Domain Types
//!
//! Core domain types for the recipe-based inventory engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Insumo      │   │     Recipe      │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  unit_of_measure│   │  name           │   │  recipe_id?     │       │
//! │  │  stock          │◄──│  InsumoEdge     │◄──│  factor         │       │
//! │  │  unit_cost      │   │  SubRecipeEdge ─┼─┐ │  stock? (direct)│       │
//! │  └─────────────────┘   └────────▲────────┘ │ └─────────────────┘       │
//! │                                 └──────────┘  (recipes nest)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A product is never both: a `recipe_id` switches the sale path entirely
//! away from the direct stock counter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Insumo
// =============================================================================

/// A raw material with a unit cost and a mutable stock quantity.
///
/// The leaf of the recipe graph. Stock is mutated only by the consumption
/// engine; cost and name change through catalog management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insumo {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Flour", "Cheese").
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Unit the stock and edge quantities are expressed in ("kg", "litros").
    pub unit_of_measure: String,

    /// Current stock quantity. Never negative.
    pub stock: Decimal,

    /// Cost per unit of measure. Never negative.
    pub unit_cost: Decimal,

    /// When the insumo was created.
    pub created_at: DateTime<Utc>,

    /// When the insumo was last updated.
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency counter; every stock write checks it.
    pub version: i64,
}

impl Insumo {
    /// Builds a catalog entry with fresh timestamps and version 0.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_of_measure: impl Into<String>,
        stock: Decimal,
        unit_cost: Decimal,
    ) -> Self {
        let now = Utc::now();
        Insumo {
            id: id.into(),
            name: name.into(),
            description: None,
            unit_of_measure: unit_of_measure.into(),
            stock,
            unit_cost,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Checks whether current stock covers a required quantity.
    #[inline]
    pub fn has_stock_for(&self, required: Decimal) -> bool {
        self.stock >= required
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// A named composition of insumos and/or other recipes.
///
/// The edges themselves live in [`crate::graph::RecipeGraph`]; this is the
/// node payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Dough", "Pizza").
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// When the recipe was created.
    pub created_at: DateTime<Utc>,

    /// When the recipe was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Builds a catalog entry with fresh timestamps.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Recipe {
            id: id.into(),
            name: name.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Edges
// =============================================================================

/// A Recipe→Insumo edge: how much of one insumo a single recipe-unit uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsumoEdge {
    /// The insumo consumed.
    pub insumo_id: String,

    /// Quantity per recipe-unit, in the insumo's unit of measure.
    /// Non-negative.
    pub quantity: Decimal,
}

impl InsumoEdge {
    pub fn new(insumo_id: impl Into<String>, quantity: Decimal) -> Self {
        InsumoEdge {
            insumo_id: insumo_id.into(),
            quantity,
        }
    }
}

/// A Recipe→Recipe edge: a recipe used as an ingredient of another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRecipeEdge {
    /// The child recipe consumed.
    pub child_id: String,

    /// Child recipe-units per parent recipe-unit. Non-negative.
    pub quantity: Decimal,
}

impl SubRecipeEdge {
    pub fn new(child_id: impl Into<String>, quantity: Decimal) -> Self {
        SubRecipeEdge {
            child_id: child_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category ("Bebidas", "Pizzas").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across categories.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// When the category was created.
    pub created_at: DateTime<Utc>,

    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A sellable product.
///
/// Either recipe-backed (consumes insumos through the recipe graph) or sold
/// against its own direct stock counter — never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Price per single unit.
    pub unit_price: Decimal,

    /// Price per bulk package.
    pub bulk_price: Decimal,

    /// Whether the product is currently offered.
    pub available: bool,

    /// Category this product belongs to, if any.
    pub category_id: Option<String>,

    /// Recipe backing this product, if any. Presence of a recipe switches
    /// the sale path entirely away from `stock`.
    pub recipe_id: Option<String>,

    /// Recipe-units consumed per product-unit sold. Default 1.
    pub recipe_consumption_factor: Decimal,

    /// Direct stock counter, used only when no recipe is attached.
    pub stock: Option<i64>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency counter for direct stock writes.
    pub version: i64,
}

impl Product {
    /// Builds a catalog entry with fresh timestamps, no recipe binding and
    /// no direct stock.
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            name: name.into(),
            description: None,
            unit_price,
            bulk_price: unit_price,
            available: true,
            category_id: None,
            recipe_id: None,
            recipe_consumption_factor: Decimal::ONE,
            stock: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Whether a sale of this product walks the recipe graph.
    #[inline]
    pub fn is_recipe_backed(&self) -> bool {
        self.recipe_id.is_some()
    }

    /// Recipe-units consumed by selling `quantity` product-units.
    #[inline]
    pub fn recipe_units_for(&self, quantity: Decimal) -> Decimal {
        self.recipe_consumption_factor * quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
