//! Calculation inputs and the per-apartment share breakdown.

use commonfee_shared::types::{ApartmentId, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::allocation::{EdgeCaseRecord, ReserveOverride};
use crate::building::{Apartment, Building, Period};
use crate::expense::{BucketTotals, Expense, MeterReading};

/// Per-apartment charges by component.
///
/// `resident_total` and `owner_total` are a payer view of the same money:
/// together they equal the category components plus the management fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Common expenses.
    pub general: Decimal,
    /// Elevator expenses.
    pub elevator: Decimal,
    /// Heating, fixed plus variable.
    pub heating: Decimal,
    /// Heating part distributed by heating mills.
    pub heating_fixed: Decimal,
    /// Heating part distributed by consumption.
    pub heating_variable: Decimal,
    /// Expenses split equally.
    pub equal_share: Decimal,
    /// Expenses targeted at specific apartments.
    pub individual: Decimal,
    /// Reserve-fund contribution.
    pub reserve_fund_contribution: Decimal,
    /// Portion payable by the resident.
    pub resident_total: Decimal,
    /// Portion payable by the owner.
    pub owner_total: Decimal,
}

impl Breakdown {
    /// Sum of the category components (heating counted once).
    #[must_use]
    pub fn categories_total(&self) -> Decimal {
        self.general
            + self.elevator
            + self.heating
            + self.equal_share
            + self.individual
            + self.reserve_fund_contribution
    }
}

/// Computed charges of one apartment for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Apartment.
    pub apartment_id: ApartmentId,
    /// Human-facing identifier.
    pub identifier: String,
    /// Participation mills at calculation time.
    pub participation_mills: Decimal,
    /// Charges by component.
    pub breakdown: Breakdown,
    /// Flat management fee.
    pub management_fee_share: Decimal,
    /// Balance carried over from earlier periods.
    pub previous_balance: Decimal,
    /// Amount due: categories + fee + previous balance.
    pub total_due: Decimal,
}

impl Share {
    /// This period's charges without the carried-over balance.
    #[must_use]
    pub fn new_charges(&self) -> Decimal {
        self.breakdown.categories_total() + self.management_fee_share
    }

    /// What `total_due` must be for the share to be internally consistent.
    #[must_use]
    pub fn expected_total_due(&self) -> Decimal {
        self.new_charges() + self.previous_balance
    }
}

/// Independently aggregated totals, used only for cross-checking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSummary {
    /// Grand total of the period.
    pub grand_total: Option<Decimal>,
    /// Management fees of the period.
    pub management_fee_total: Option<Decimal>,
    /// Reserve-fund contributions of the period.
    pub reserve_fund_total: Option<Decimal>,
}

/// Everything the pipeline needs for one (building, period).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationInputs {
    /// Building settings.
    pub building: Building,
    /// Apartment registry of the building.
    pub apartments: Vec<Apartment>,
    /// Expense records of the period.
    pub expenses: Vec<Expense>,
    /// Meter readings; only those dated inside the period are used.
    pub meter_readings: Vec<MeterReading>,
    /// Reserve contributions computed upstream that take precedence over
    /// derived ones when non-zero.
    #[serde(default)]
    pub authoritative_reserve: BTreeMap<ApartmentId, Decimal>,
    /// Optional independently computed totals.
    #[serde(default)]
    pub external_summary: Option<ExternalSummary>,
}

/// Building-level totals, derived from the inputs rather than from the shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationTotals {
    /// Expense totals per bucket.
    pub buckets: BucketTotals,
    /// Heating part distributed by heating mills.
    pub heating_fixed: Decimal,
    /// Heating part distributed by consumption.
    pub heating_variable: Decimal,
    /// Management fees.
    pub management_fee_total: Decimal,
    /// Reserve-fund contributions as applied.
    pub reserve_fund_total: Decimal,
    /// Reserve-fund target for the period.
    pub reserve_monthly_target: Decimal,
    /// Previous balances.
    pub previous_balance_total: Decimal,
    /// Participation mills across the building.
    pub participation_mills_total: Decimal,
}

impl CalculationTotals {
    /// Grand total summed from components.
    #[must_use]
    pub fn component_total(&self) -> Decimal {
        self.buckets.total()
            + self.management_fee_total
            + self.reserve_fund_total
            + self.previous_balance_total
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    /// Period computed.
    pub period: Period,
    /// Currency every amount is billed in.
    pub currency: Currency,
    /// Nominal mills denominator of the building.
    pub mills_denominator: Decimal,
    /// One share per apartment, ordered by apartment id.
    pub shares: Vec<Share>,
    /// Building-level totals.
    pub totals: CalculationTotals,
    /// Totals per expense category name.
    pub category_totals: BTreeMap<String, Decimal>,
    /// Fallbacks taken.
    pub edge_cases: Vec<EdgeCaseRecord>,
    /// External reserve figures that replaced disagreeing derived ones.
    pub reserve_overrides: Vec<ReserveOverride>,
    /// External totals to cross-check against.
    pub external_summary: Option<ExternalSummary>,
}

impl Calculation {
    /// Grand total summed over shares.
    #[must_use]
    pub fn share_total(&self) -> Decimal {
        self.shares.iter().map(|s| s.total_due).sum()
    }

    /// Share of one apartment.
    #[must_use]
    pub fn share(&self, apartment_id: ApartmentId) -> Option<&Share> {
        self.shares.iter().find(|s| s.apartment_id == apartment_id)
    }
}
