//! # Validation Module
//!
//! Input validation for catalog writes and sale requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (order intake / catalog management)                   │
//! │  ├── Request shape, authentication — out of scope here                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── names non-empty and bounded                                       │
//! │  └── quantities non-negative, sale quantities positive                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── unique (recipe, ingredient) pairs                                 │
//! │  ├── no self-edges (CHECK)                                             │
//! │  └── foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::{MAX_NAME_LEN, MAX_UNIT_OF_MEASURE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (insumo, recipe, product or category).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 100 characters
///
/// ## Example
/// ```rust
/// use cocina_core::validation::validate_name;
///
/// assert!(validate_name("name", "Masa de pizza").is_ok());
/// assert!(validate_name("name", "").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a unit-of-measure label.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 20 characters ("kg", "litros", "unidades")
pub fn validate_unit_of_measure(unit: &str) -> ValidationResult<()> {
    let unit = unit.trim();

    if unit.is_empty() {
        return Err(ValidationError::Required {
            field: "unit_of_measure".to_string(),
        });
    }

    if unit.chars().count() > MAX_UNIT_OF_MEASURE_LEN {
        return Err(ValidationError::TooLong {
            field: "unit_of_measure".to_string(),
            max: MAX_UNIT_OF_MEASURE_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an edge quantity (insumo per recipe-unit, or child recipe-units
/// per parent recipe-unit).
///
/// ## Rules
/// - Must not be negative (zero is allowed: an edge can be parked at 0)
pub fn validate_edge_quantity(quantity: Decimal) -> ValidationResult<()> {
    if quantity.is_sign_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity of recipe-units being consumed.
///
/// ## Rules
/// - Must not be negative (zero consumes nothing and is a no-op)
pub fn validate_consumed_quantity(quantity: Decimal) -> ValidationResult<()> {
    if quantity.is_sign_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "quantity consumed".to_string(),
        });
    }

    Ok(())
}

/// Validates the quantity of a sale request.
///
/// ## Rules
/// - Must be strictly positive: selling zero or negative units is a caller
///   bug, not a no-op
pub fn validate_sale_quantity(quantity: Decimal) -> ValidationResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity sold".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level or unit cost entered through catalog management.
pub fn validate_non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value.is_sign_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use cocina_core::validation::validate_id;
///
/// assert!(validate_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("not-a-uuid").is_err());
/// ```
pub fn validate_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
