//! Flat management fee and previous-balance carry-forward.

use rust_decimal::Decimal;

use super::util::Allocation;
use crate::building::Apartment;

/// Flat management fee per apartment, independent of mills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeAllocation {
    /// Fee charged to each apartment.
    pub per_apartment: Allocation,
    /// `fee × apartment count`.
    pub total: Decimal,
}

/// Broadcasts the building's flat management fee.
pub struct FeeApplier;

impl FeeApplier {
    /// Charges `fee` to every apartment.
    #[must_use]
    pub fn apply(fee: Decimal, apartments: &[Apartment]) -> FeeAllocation {
        let per_apartment: Allocation = apartments.iter().map(|a| (a.id, fee)).collect();
        let total = fee * Decimal::from(per_apartment.len());
        FeeAllocation {
            per_apartment,
            total,
        }
    }
}

/// Merges an apartment's previous balance into its new total.
pub struct BalanceCarryForward;

impl BalanceCarryForward {
    /// `new_charges + previous_balance`, signed and unclamped.
    #[must_use]
    pub fn total_due(new_charges: Decimal, previous_balance: Decimal) -> Decimal {
        new_charges + previous_balance
    }

    /// Sum of previous balances across the building.
    #[must_use]
    pub fn building_total(apartments: &[Apartment]) -> Decimal {
        apartments.iter().map(|a| a.previous_balance).sum()
    }
}
