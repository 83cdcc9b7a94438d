//! # Error Types
//!
//! Domain-specific error types for cocina-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cocina-core errors (this file)                                        │
//! │  ├── CoreError        - Engine errors (not-found, cycle, shortfall)    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cocina-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures + conflicts        │
//! │  └── ServiceError     - Core ∪ Db at the service boundary              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (insumo id, shortfall, path)
//! 3. Errors are enum variants, never String
//! 4. Every engine error propagates unchanged to the sale/costing caller

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Engine errors raised by the cost resolver, the consumption planner and
/// the sale entrypoint.
///
/// These represent business rule violations or catalog defects. They are
/// never swallowed: the request handler translates them into a user-visible
/// response.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Recipe cannot be found (root of a walk, or a dangling sub-recipe edge).
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    /// Insumo referenced by an edge is missing from the catalog.
    #[error("Insumo not found: {0}")]
    InsumoNotFound(String),

    /// A recipe was reached twice on the same traversal path.
    ///
    /// ## When This Occurs
    /// - A sub-recipe edge chain leads back to an ancestor (A → B → A)
    /// - Traversal aborts before exhausting stack space; no stock is touched
    #[error("Recipe cycle detected at {recipe_id} (path: {})", .path.join(" -> "))]
    GraphCycle {
        recipe_id: String,
        /// Recipe ids on the active path, root first, offender last.
        path: Vec<String>,
    },

    /// Recipe nesting exceeded [`crate::MAX_RECIPE_DEPTH`] levels.
    ///
    /// A backstop for pathological catalogs; ordinary recipes never get
    /// anywhere near the limit.
    #[error("Recipe nesting exceeds {limit} levels at {recipe_id}")]
    TraversalDepthExceeded { recipe_id: String, limit: usize },

    /// A consumption dry-run would drive an insumo's stock negative.
    ///
    /// ## When This Occurs
    /// - Phase 1 of a sale computes total insumo needs across the subtree
    /// - The first insumo (in id order) whose stock cannot cover its
    ///   requirement aborts the whole sale; nothing is deducted
    #[error(
        "Insufficient stock for insumo {insumo_name} ({insumo_id}): required {required}, available {available}"
    )]
    InsufficientStock {
        insumo_id: String,
        insumo_name: String,
        required: Decimal,
        available: Decimal,
    },

    /// A direct-stock sale would drive the product's own counter negative.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientProductStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shortfall amount for an [`CoreError::InsufficientStock`] error.
    ///
    /// Returns `None` for every other variant.
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            CoreError::InsufficientStock {
                required,
                available,
                ..
            } => Some(required - available),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when catalog input or a sale request doesn't meet
/// requirements. Used for early validation before engine logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of the representable range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An edge for this (recipe, ingredient) pair already exists.
    #[error("recipe {recipe_id} already has an edge to {ingredient_id}")]
    DuplicateEdge {
        recipe_id: String,
        ingredient_id: String,
    },

    /// A recipe cannot be an ingredient of itself.
    #[error("recipe {recipe_id} cannot reference itself")]
    SelfReference { recipe_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
