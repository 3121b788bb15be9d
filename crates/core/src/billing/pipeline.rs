//! Calculation pipeline for one (building, period).
//!
//! Aggregates the period's expenses, allocates every charge line under its
//! rule, splits heating into fixed and variable parts, accrues the reserve
//! fund, broadcasts the management fee and carries previous balances
//! forward. Each allocated amount is also attributed to the resident or the
//! owner according to the expense's payer responsibility.

use commonfee_shared::EngineConfig;
use commonfee_shared::types::ApartmentId;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::types::{Breakdown, Calculation, CalculationInputs, CalculationTotals, Share};
use crate::allocation::{
    AllocationEngine, AllocationRule, BalanceCarryForward, EdgeCaseRecord, FeeApplier,
    HeatingSplitter, ReserveFundAccrual,
};
use crate::building::{Apartment, MillsBasis, Period};
use crate::expense::{
    CategoryMap, ChargeBucket, ChargeLine, DistributionType, ExpenseAggregator, MeterReadings,
    PayerFilter, PayerResponsibility,
};

/// Runs the allocation steps in order and assembles the share set.
#[derive(Debug, Clone)]
pub struct CalculationPipeline {
    engine: AllocationEngine,
    categories: CategoryMap,
    reserve_override_tolerance: Decimal,
}

impl Default for CalculationPipeline {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl CalculationPipeline {
    /// Creates a pipeline with the default category mapping.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            engine: AllocationEngine::from_config(config),
            categories: CategoryMap::default(),
            reserve_override_tolerance: config.reserve_override_tolerance,
        }
    }

    /// Replaces the category mapping table.
    #[must_use]
    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    /// Computes the share set for `period`.
    ///
    /// Pure: the same inputs always produce the same calculation. Fallbacks
    /// are recorded on the result instead of failing.
    #[must_use]
    pub fn compute(&self, inputs: &CalculationInputs, period: &Period) -> Calculation {
        let places = self.engine.decimal_places();
        let building = &inputs.building;

        let mut apartments = inputs.apartments.clone();
        apartments.sort_by_key(|a| a.id);

        let readings = MeterReadings::for_period(&inputs.meter_readings, period);
        let aggregated = ExpenseAggregator::new(places).aggregate(
            &inputs.expenses,
            &self.categories,
            PayerFilter::All,
        );

        let mut breakdowns: BTreeMap<ApartmentId, Breakdown> =
            apartments.iter().map(|a| (a.id, Breakdown::default())).collect();
        let mut edge_cases = aggregated.edge_cases.clone();

        // Non-heating lines, one allocation per expense.
        for line in aggregated
            .lines
            .iter()
            .filter(|l| l.bucket != ChargeBucket::Heating)
        {
            let Some(rule) = rule_for(line, &readings) else {
                continue;
            };
            let outcome = self.engine.allocate(line.amount, rule, &apartments);
            for case in outcome.edge_cases {
                warn!(expense_id = %line.expense_id, edge_case = %case, "Allocation fallback");
                edge_cases.push(EdgeCaseRecord::for_expense(line.expense_id, case));
            }
            for (id, amount) in outcome.shares {
                if let Some(breakdown) = breakdowns.get_mut(&id) {
                    credit(breakdown, line.bucket, amount);
                    attribute(breakdown, line.payer, amount, places);
                }
            }
        }

        // Heating, split once per payer group so the partition stays exact.
        let splitter = HeatingSplitter::new(self.engine);
        let mut heating_fixed = Decimal::ZERO;
        let mut heating_variable = Decimal::ZERO;
        for (payer, total) in heating_by_payer(&aggregated.lines) {
            let split = splitter.split(
                total,
                building.effective_fixed_percentage(),
                building.heating_system,
                &apartments,
                &readings,
            );
            heating_fixed += split.fixed_cost;
            heating_variable += split.variable_cost;
            for case in split.edge_cases {
                warn!(edge_case = %case, "Heating allocation fallback");
                edge_cases.push(EdgeCaseRecord::building_level(case));
            }
            for (id, share) in split.per_apartment {
                if let Some(breakdown) = breakdowns.get_mut(&id) {
                    breakdown.heating_fixed += share.fixed;
                    breakdown.heating_variable += share.variable;
                    breakdown.heating += share.total();
                    attribute(breakdown, payer, share.total(), places);
                }
            }
        }

        // Reserve fund, owner charge.
        let accrual = ReserveFundAccrual::new(self.engine).accrue(
            &building.reserve_fund,
            period,
            &apartments,
        );
        edge_cases.extend(accrual.edge_cases.into_iter().map(EdgeCaseRecord::building_level));
        let (reserve, reserve_overrides) = ReserveFundAccrual::resolve_with_external(
            &accrual.per_apartment,
            &inputs.authoritative_reserve,
            self.reserve_override_tolerance,
        );
        for (id, amount) in &reserve {
            if let Some(breakdown) = breakdowns.get_mut(id) {
                breakdown.reserve_fund_contribution = *amount;
                breakdown.owner_total += *amount;
            }
        }
        for reserve_override in &reserve_overrides {
            warn!(
                apartment_id = %reserve_override.apartment_id,
                derived = %reserve_override.derived,
                external = %reserve_override.external,
                "External reserve contribution replaces derived value"
            );
        }

        // Management fee, resident charge.
        let fees = FeeApplier::apply(building.management_fee_per_apartment, &apartments);

        let shares: Vec<Share> = apartments
            .iter()
            .map(|apartment| {
                let mut breakdown = breakdowns.remove(&apartment.id).unwrap_or_default();
                let fee = fees
                    .per_apartment
                    .get(&apartment.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                breakdown.resident_total += fee;
                let new_charges = breakdown.categories_total() + fee;
                Share {
                    apartment_id: apartment.id,
                    identifier: apartment.identifier.clone(),
                    participation_mills: apartment.participation_mills,
                    breakdown,
                    management_fee_share: fee,
                    previous_balance: apartment.previous_balance,
                    total_due: BalanceCarryForward::total_due(
                        new_charges,
                        apartment.previous_balance,
                    ),
                }
            })
            .collect();

        let totals = CalculationTotals {
            buckets: aggregated.totals,
            heating_fixed,
            heating_variable,
            management_fee_total: fees.total,
            reserve_fund_total: reserve.values().copied().sum(),
            reserve_monthly_target: accrual.monthly_target,
            previous_balance_total: BalanceCarryForward::building_total(&apartments),
            participation_mills_total: participation_total(&apartments),
        };

        debug!(
            fixed = %heating_fixed,
            variable = %heating_variable,
            reserve = %totals.reserve_fund_total,
            fees = %totals.management_fee_total,
            "Calculated building components"
        );
        info!(
            building_id = %building.id,
            period = %period.month_key,
            currency = %building.currency,
            apartments = shares.len(),
            edge_cases = edge_cases.len(),
            "Calculation completed"
        );

        Calculation {
            period: period.clone(),
            currency: building.currency,
            mills_denominator: building.mills_denominator,
            shares,
            totals,
            category_totals: aggregated.category_totals,
            edge_cases,
            reserve_overrides,
            external_summary: inputs.external_summary.clone(),
        }
    }
}

/// Allocation rule for a non-heating charge line.
fn rule_for<'a>(line: &'a ChargeLine, readings: &'a MeterReadings) -> Option<AllocationRule<'a>> {
    let metered = matches!(line.distribution, DistributionType::ByMeters);
    match (line.bucket, &line.distribution) {
        (ChargeBucket::Individual, DistributionType::SpecificApartments { apartments }) => {
            Some(AllocationRule::SpecificApartments {
                targets: apartments,
                basis: MillsBasis::Participation,
            })
        }
        (ChargeBucket::EqualShare, _) => Some(AllocationRule::EqualShare),
        (ChargeBucket::General | ChargeBucket::Elevator, _) if metered => {
            Some(AllocationRule::ByMeters(readings))
        }
        (ChargeBucket::General, _) => Some(AllocationRule::ByMills(MillsBasis::Participation)),
        (ChargeBucket::Elevator, _) => Some(AllocationRule::ByMills(MillsBasis::Elevator)),
        (ChargeBucket::Individual | ChargeBucket::Heating, _) => None,
    }
}

/// Heating totals grouped by payer, in a stable order.
fn heating_by_payer(lines: &[ChargeLine]) -> Vec<(PayerResponsibility, Decimal)> {
    [
        PayerResponsibility::Resident,
        PayerResponsibility::Owner,
        PayerResponsibility::Shared,
    ]
    .into_iter()
    .filter_map(|payer| {
        let total: Decimal = lines
            .iter()
            .filter(|l| l.bucket == ChargeBucket::Heating && l.payer == payer)
            .map(|l| l.amount)
            .sum();
        (!total.is_zero()).then_some((payer, total))
    })
    .collect()
}

fn credit(breakdown: &mut Breakdown, bucket: ChargeBucket, amount: Decimal) {
    match bucket {
        ChargeBucket::General => breakdown.general += amount,
        ChargeBucket::Elevator => breakdown.elevator += amount,
        ChargeBucket::Heating => breakdown.heating += amount,
        ChargeBucket::EqualShare => breakdown.equal_share += amount,
        ChargeBucket::Individual => breakdown.individual += amount,
    }
}

/// Adds `amount` to the payer totals. Shared charges are halved with the
/// odd unit going to the resident.
fn attribute(breakdown: &mut Breakdown, payer: PayerResponsibility, amount: Decimal, places: u32) {
    match payer {
        PayerResponsibility::Resident => breakdown.resident_total += amount,
        PayerResponsibility::Owner => breakdown.owner_total += amount,
        PayerResponsibility::Shared => {
            let owner_half =
                (amount / Decimal::TWO).round_dp_with_strategy(places, RoundingStrategy::ToZero);
            breakdown.owner_total += owner_half;
            breakdown.resident_total += amount - owner_half;
        }
    }
}

fn participation_total(apartments: &[Apartment]) -> Decimal {
    apartments.iter().map(|a| a.participation_mills).sum()
}
