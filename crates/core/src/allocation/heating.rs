//! Heating bill split into a fixed and a consumption-based part.
//!
//! Conventional heating (or none) distributes the whole bill by heating
//! mills. Metered systems distribute `fixed_percentage` of the bill by
//! heating mills and the rest by meter consumption, with the usual
//! zero-consumption fallback. The fixed/variable parts are kept apart per
//! apartment so they can be rendered separately.

use commonfee_shared::types::{ApartmentId, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::edge_case::AllocationEdgeCase;
use super::engine::{AllocationEngine, AllocationRule};
use crate::building::{Apartment, HeatingSystem, MillsBasis};
use crate::expense::MeterReadings;

/// Heating charge of one apartment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatingShare {
    /// Part distributed by heating mills.
    pub fixed: Decimal,
    /// Part distributed by consumption.
    pub variable: Decimal,
}

impl HeatingShare {
    /// Fixed plus variable.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.fixed + self.variable
    }
}

/// Result of splitting a heating bill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeatingSplit {
    /// Part of the bill distributed by heating mills.
    pub fixed_cost: Decimal,
    /// Part of the bill distributed by consumption.
    pub variable_cost: Decimal,
    /// Per-apartment decomposition.
    pub per_apartment: BTreeMap<ApartmentId, HeatingShare>,
    /// Fallbacks taken while splitting.
    pub edge_cases: Vec<AllocationEdgeCase>,
}

/// Splits heating bills.
#[derive(Debug, Clone, Copy)]
pub struct HeatingSplitter {
    engine: AllocationEngine,
}

impl HeatingSplitter {
    /// Creates a splitter on top of an allocation engine.
    #[must_use]
    pub const fn new(engine: AllocationEngine) -> Self {
        Self { engine }
    }

    /// Splits `total_cost` for a building with the given heating system.
    ///
    /// `fixed_cost + variable_cost` always equals `total_cost` rounded to
    /// currency precision. `fixed_percentage` is clamped to 0-100 and is
    /// ignored for conventional heating.
    #[must_use]
    pub fn split(
        &self,
        total_cost: Decimal,
        fixed_percentage: Decimal,
        system: HeatingSystem,
        apartments: &[Apartment],
        readings: &MeterReadings,
    ) -> HeatingSplit {
        let places = self.engine.decimal_places();
        let total = round_money(total_cost, places);

        let percentage = if system.is_metered() {
            fixed_percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        } else {
            Decimal::ONE_HUNDRED
        };
        let fixed_cost = round_money(total * percentage / Decimal::ONE_HUNDRED, places);
        let variable_cost = total - fixed_cost;

        let fixed = self.engine.allocate(
            fixed_cost,
            AllocationRule::ByMills(MillsBasis::Heating),
            apartments,
        );
        let variable = if variable_cost.is_zero() {
            Default::default()
        } else {
            self.engine
                .allocate(variable_cost, AllocationRule::ByMeters(readings), apartments)
        };

        let mut per_apartment: BTreeMap<ApartmentId, HeatingShare> = BTreeMap::new();
        for (id, amount) in &fixed.shares {
            per_apartment.entry(*id).or_default().fixed = *amount;
        }
        for (id, amount) in &variable.shares {
            per_apartment.entry(*id).or_default().variable = *amount;
        }

        let mut edge_cases = fixed.edge_cases;
        edge_cases.extend(variable.edge_cases);

        HeatingSplit {
            fixed_cost,
            variable_cost,
            per_apartment,
            edge_cases,
        }
    }
}
