//! # Cost Module
//!
//! Provides the `Cost` type for recipe costing.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A recipe cost is a sum of products (unit cost × edge quantity)        │
//! │  multiplied through every nesting level; float drift compounds with    │
//! │  depth. rust_decimal keeps every intermediate value exact.             │
//! │                                                                         │
//! │  ROUNDING RULE: round to the currency's 2 minor-unit digits ONLY at    │
//! │  the outermost costing call, never at intermediate levels.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cocina_core::cost::Cost;
//! use rust_decimal::Decimal;
//!
//! let flour = Cost::new(Decimal::from(20));
//! let cheese = Cost::new("6.005".parse().unwrap());
//!
//! // Intermediate sums stay unrounded
//! let total = flour + cheese;
//! assert_eq!(total.value(), "26.005".parse::<Decimal>().unwrap());
//!
//! // Rounding happens once, at the boundary (banker's rounding)
//! assert_eq!(total.rounded().value(), Decimal::new(2600, 2));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Number of minor-unit digits in the currency (cents).
pub const CURRENCY_SCALE: u32 = 2;

// =============================================================================
// Cost Type
// =============================================================================

/// A monetary cost produced by the cost resolver.
///
/// ## Design Decisions
/// - **Decimal-backed**: exact arithmetic across arbitrarily deep recipes
/// - **Single field tuple struct**: zero-cost abstraction over `Decimal`
/// - **Late rounding**: [`Cost::rounded`] is called once by the outermost
///   costing call, never while summing sub-recipe contributions
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cost(Decimal);

impl Cost {
    /// Creates a Cost from a decimal amount.
    #[inline]
    pub fn new(amount: Decimal) -> Self {
        Cost(amount)
    }

    /// Zero cost.
    #[inline]
    pub fn zero() -> Self {
        Cost(Decimal::ZERO)
    }

    /// Returns the underlying (possibly unrounded) decimal value.
    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Rounds to the currency's minor-unit precision.
    ///
    /// Uses banker's rounding (round half to even), which avoids systematic
    /// bias across many costing calls. Call this ONLY at the outermost level
    /// of a cost computation; intermediate sums must stay unrounded so that
    /// rounding error cannot compound across recipe depth.
    ///
    /// ## Example
    /// ```rust
    /// use cocina_core::cost::Cost;
    /// use rust_decimal::Decimal;
    ///
    /// let cost = Cost::new("26.005".parse().unwrap());
    /// assert_eq!(cost.rounded().value(), Decimal::new(2600, 2));
    /// ```
    #[inline]
    pub fn rounded(&self) -> Cost {
        Cost(self.0.round_dp(CURRENCY_SCALE))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the cost at currency precision, for logs and receipts.
impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

/// Addition of two Cost values (unrounded).
impl Add for Cost {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Cost(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Cost {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Cost values.
impl Sub for Cost {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Cost(self.0 - other.0)
    }
}

/// Multiplication by an edge quantity (cost of a sub-recipe × units used).
impl Mul<Decimal> for Cost {
    type Output = Self;

    #[inline]
    fn mul(self, quantity: Decimal) -> Self {
        Cost(self.0 * quantity)
    }
}

/// Sum of per-ingredient contributions.
impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Self {
        iter.fold(Cost::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_and_value() {
        let cost = Cost::new(dec("10.99"));
        assert_eq!(cost.value(), dec("10.99"));
        assert!(!cost.is_zero());
        assert!(Cost::zero().is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Cost::new(dec("10.99"))), "$10.99");
        assert_eq!(format!("{}", Cost::new(dec("5"))), "$5.00");
        assert_eq!(format!("{}", Cost::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Cost::new(dec("10"));
        let b = Cost::new(dec("5.5"));

        assert_eq!((a + b).value(), dec("15.5"));
        assert_eq!((a - b).value(), dec("4.5"));
        assert_eq!((b * dec("2")).value(), dec("11"));
    }

    #[test]
    fn test_sum() {
        let total: Cost = vec![Cost::new(dec("1.10")), Cost::new(dec("2.20"))]
            .into_iter()
            .sum();
        assert_eq!(total.value(), dec("3.30"));
    }

    #[test]
    fn test_rounding_is_bankers() {
        // Half-to-even: 26.005 -> 26.00, 26.015 -> 26.02
        assert_eq!(Cost::new(dec("26.005")).rounded().value(), dec("26.00"));
        assert_eq!(Cost::new(dec("26.015")).rounded().value(), dec("26.02"));
    }

    /// Rounding at the boundary differs from rounding every term: the
    /// unrounded sum is what the resolver accumulates across depth.
    #[test]
    fn test_late_rounding_does_not_compound() {
        let terms = [dec("0.333"), dec("0.333"), dec("0.333")];

        let late: Cost = terms.iter().map(|t| Cost::new(*t)).sum();
        assert_eq!(late.rounded().value(), dec("1.00"));

        let early: Decimal = terms.iter().map(|t| t.round_dp(2)).sum();
        assert_eq!(early, dec("0.99"));
    }
}
