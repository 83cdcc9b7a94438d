//! # Decimal Column Codec
//!
//! SQLite has no native decimal type, so quantities, stocks and costs are
//! stored as canonical decimal TEXT and parsed on the way out. Parsing
//! failures surface as [`DbError::Decode`] (a corrupt row, not a caller
//! error).

use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

/// Parses a TEXT decimal column value.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|e| DbError::decode(column, e.to_string()))
}

/// Canonical TEXT encoding for a decimal column value.
pub(crate) fn encode_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}
