//! Amount allocation utilities using the Largest Remainder Method.
//!
//! Allocations are keyed by apartment and always sum exactly to the
//! (rounded) total:
//! 1. Round the total to the target precision
//! 2. Compute each exact share and round it down
//! 3. Hand the leftover units, one each, to the largest fractional parts
//! 4. Break ties on the fractional part by lowest apartment id
//!
//! Zero-weight recipients never receive a leftover unit.

use commonfee_shared::types::{ApartmentId, minor_unit, round_money};
use rust_decimal::prelude::*;
use std::collections::BTreeMap;

/// Per-apartment amounts, ordered by apartment id.
pub type Allocation = BTreeMap<ApartmentId, Decimal>;

/// Allocation utility for distributing amounts.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Allocate `total` proportionally to `weights`.
    ///
    /// Negative weights count as zero. Returns `None` when the weights sum
    /// to zero (or there are none), so the caller can pick a fallback
    /// instead of dividing by zero.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use rust_decimal_macros::dec;
    /// use commonfee_core::allocation::AllocationUtil;
    /// use commonfee_shared::types::ApartmentId;
    ///
    /// let weights = BTreeMap::from([
    ///     (ApartmentId::from_u128(1), dec!(600)),
    ///     (ApartmentId::from_u128(2), dec!(400)),
    /// ]);
    /// let shares = AllocationUtil::allocate_by_weights(dec!(100), &weights, 2).unwrap();
    /// assert_eq!(shares[&ApartmentId::from_u128(1)], dec!(60));
    /// assert_eq!(shares.values().copied().sum::<rust_decimal::Decimal>(), dec!(100));
    /// ```
    #[must_use]
    pub fn allocate_by_weights(
        total: Decimal,
        weights: &BTreeMap<ApartmentId, Decimal>,
        decimal_places: u32,
    ) -> Option<Allocation> {
        let weight_sum: Decimal = weights.values().map(|w| (*w).max(Decimal::ZERO)).sum();
        if weight_sum <= Decimal::ZERO {
            return None;
        }

        let unit = minor_unit(decimal_places);
        let total_rounded = round_money(total, decimal_places);

        // (id, weight, exact share)
        let exact: Vec<(ApartmentId, Decimal, Decimal)> = weights
            .iter()
            .map(|(id, w)| {
                let w = (*w).max(Decimal::ZERO);
                (*id, w, total_rounded * w / weight_sum)
            })
            .collect();

        // Round down each; flooring keeps the leftover non-negative even
        // for negative totals.
        let mut allocation: Allocation = exact
            .iter()
            .map(|(id, _, e)| {
                (
                    *id,
                    e.round_dp_with_strategy(decimal_places, RoundingStrategy::ToNegativeInfinity),
                )
            })
            .collect();

        let allocated: Decimal = allocation.values().copied().sum();
        let units_to_distribute = ((total_rounded - allocated) / unit)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
            .to_usize()
            .unwrap_or(0);

        if units_to_distribute == 0 {
            return Some(allocation);
        }

        // Candidates: positive weight only, largest fractional part first,
        // ties broken by lowest apartment id.
        let mut remainders: Vec<(ApartmentId, Decimal)> = exact
            .iter()
            .filter(|(_, w, _)| *w > Decimal::ZERO)
            .map(|(id, _, e)| (*id, *e - allocation[id]))
            .collect();
        remainders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (id, _) in remainders.iter().cycle().take(units_to_distribute) {
            if let Some(share) = allocation.get_mut(id) {
                *share += unit;
            }
        }

        Some(allocation)
    }

    /// Allocate `total` equally across `recipients`.
    ///
    /// Every share is either `floor(total / n)` or one unit more; the extra
    /// units go to the lowest apartment ids. Returns an empty allocation
    /// when there are no recipients.
    #[must_use]
    pub fn allocate_equal(
        total: Decimal,
        recipients: impl IntoIterator<Item = ApartmentId>,
        decimal_places: u32,
    ) -> Allocation {
        let weights: BTreeMap<ApartmentId, Decimal> =
            recipients.into_iter().map(|id| (id, Decimal::ONE)).collect();
        Self::allocate_by_weights(total, &weights, decimal_places).unwrap_or_default()
    }
}
