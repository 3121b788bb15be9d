//! Currency and rounding helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest number of decimal places a `Decimal` can carry.
pub const MAX_DECIMAL_PLACES: u32 = 28;

/// ISO 4217 currency codes a building can bill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Euro
    #[default]
    Eur,
    /// US Dollar
    Usd,
    /// Pound Sterling
    Gbp,
    /// Swiss Franc
    Chf,
}

/// Rounds an amount with Banker's Rounding (midpoint to even).
#[must_use]
pub fn round_money(amount: Decimal, decimal_places: u32) -> Decimal {
    amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}

/// Smallest unit at `decimal_places` (0.01 for cents).
///
/// Precision beyond [`MAX_DECIMAL_PLACES`] is capped.
#[must_use]
pub fn minor_unit(decimal_places: u32) -> Decimal {
    Decimal::new(1, decimal_places.min(MAX_DECIMAL_PLACES))
}

/// Returns true if `a` and `b` differ by no more than `tolerance`.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eur => write!(f, "EUR"),
            Self::Usd => write!(f, "USD"),
            Self::Gbp => write!(f, "GBP"),
            Self::Chf => write!(f, "CHF"),
        }
    }
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
