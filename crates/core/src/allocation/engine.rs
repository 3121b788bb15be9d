//! Distribution of one amount across apartments under a single rule.

use commonfee_shared::EngineConfig;
use commonfee_shared::types::{ApartmentId, MAX_DECIMAL_PLACES};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use super::edge_case::AllocationEdgeCase;
use super::util::{Allocation, AllocationUtil};
use crate::building::{Apartment, MillsBasis};
use crate::expense::MeterReadings;

/// A distribution rule together with the data it needs.
///
/// Meter-based allocation carries its readings and targeted allocation its
/// apartment set, so neither can be requested without them.
#[derive(Debug, Clone, Copy)]
pub enum AllocationRule<'a> {
    /// Proportional to a mills column.
    ByMills(MillsBasis),
    /// Same amount for every apartment.
    EqualShare,
    /// Proportional to meter consumption.
    ByMeters(&'a MeterReadings),
    /// Only the targeted apartments, proportional to their mills.
    SpecificApartments {
        /// Targeted apartments.
        targets: &'a BTreeSet<ApartmentId>,
        /// Mills column used inside the subset.
        basis: MillsBasis,
    },
}

/// Shares produced by one allocation plus any fallback that was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationOutcome {
    /// Amount per apartment.
    pub shares: Allocation,
    /// Conditions met while allocating.
    pub edge_cases: Vec<AllocationEdgeCase>,
}

impl AllocationOutcome {
    /// Sum of all shares.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.shares.values().copied().sum()
    }
}

/// Stateless allocation engine.
#[derive(Debug, Clone, Copy)]
pub struct AllocationEngine {
    decimal_places: u32,
}

impl AllocationEngine {
    /// Creates an engine rounding shares to `decimal_places`, capped at
    /// the precision `Decimal` can represent.
    #[must_use]
    pub const fn new(decimal_places: u32) -> Self {
        let decimal_places = if decimal_places > MAX_DECIMAL_PLACES {
            MAX_DECIMAL_PLACES
        } else {
            decimal_places
        };
        Self { decimal_places }
    }

    /// Creates an engine from the engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.decimal_places)
    }

    /// Precision shares are rounded to.
    #[must_use]
    pub const fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    /// Distributes `amount` across `apartments` according to `rule`.
    ///
    /// The shares always sum to `amount` rounded to currency precision,
    /// except when nobody can be charged (`NoRecipients`). Proportional
    /// rules whose weights sum to zero fall back to an equal split and
    /// record the fallback.
    #[must_use]
    pub fn allocate(
        &self,
        amount: Decimal,
        rule: AllocationRule<'_>,
        apartments: &[Apartment],
    ) -> AllocationOutcome {
        let mut edge_cases = Vec::new();

        let shares = match rule {
            AllocationRule::ByMills(basis) => {
                let weights = apartments
                    .iter()
                    .map(|a| (a.id, a.mills_for(basis)))
                    .collect();
                self.weighted_or_equal(amount, &weights, &mut edge_cases, || {
                    AllocationEdgeCase::ZeroTotalMills { basis, amount }
                })
            }
            AllocationRule::EqualShare => AllocationUtil::allocate_equal(
                amount,
                apartments.iter().map(|a| a.id),
                self.decimal_places,
            ),
            AllocationRule::ByMeters(readings) => {
                let weights = apartments
                    .iter()
                    .map(|a| (a.id, readings.consumption(a.id)))
                    .collect();
                self.weighted_or_equal(amount, &weights, &mut edge_cases, || {
                    AllocationEdgeCase::NoConsumptionData { amount }
                })
            }
            AllocationRule::SpecificApartments { targets, basis } => {
                for unknown in targets
                    .iter()
                    .filter(|id| !apartments.iter().any(|a| a.id == **id))
                {
                    edge_cases.push(AllocationEdgeCase::UnknownTargetApartment {
                        apartment_id: *unknown,
                    });
                }

                let weights = apartments
                    .iter()
                    .filter(|a| targets.contains(&a.id))
                    .map(|a| (a.id, a.mills_for(basis)))
                    .collect();
                self.weighted_or_equal(amount, &weights, &mut edge_cases, || {
                    AllocationEdgeCase::ZeroSubsetMills { amount }
                })
            }
        };

        if shares.is_empty() && !amount.is_zero() {
            warn!(%amount, "No apartments to allocate to");
            edge_cases.push(AllocationEdgeCase::NoRecipients { amount });
        }

        AllocationOutcome { shares, edge_cases }
    }

    /// Proportional allocation, or an equal split over the same
    /// recipients when the weights sum to zero.
    fn weighted_or_equal(
        &self,
        amount: Decimal,
        weights: &BTreeMap<ApartmentId, Decimal>,
        edge_cases: &mut Vec<AllocationEdgeCase>,
        fallback: impl FnOnce() -> AllocationEdgeCase,
    ) -> Allocation {
        if let Some(shares) =
            AllocationUtil::allocate_by_weights(amount, weights, self.decimal_places)
        {
            return shares;
        }

        let shares =
            AllocationUtil::allocate_equal(amount, weights.keys().copied(), self.decimal_places);
        if !shares.is_empty() {
            let edge_case = fallback();
            debug!(%edge_case, "Falling back to equal share");
            edge_cases.push(edge_case);
        }
        shares
    }
}
