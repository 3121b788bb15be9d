//! Property-based tests for allocation.
//!
//! - Mills allocation sums to the expense amount to the cent
//! - Equal share differs by at most one cent between apartments
//! - Heating fixed + variable equals the heating total
//! - Zero consumption never divides by zero
//! - Reserve accrual respects its window

use chrono::NaiveDate;
use commonfee_shared::types::ApartmentId;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

use super::edge_case::AllocationEdgeCase;
use super::engine::{AllocationEngine, AllocationRule};
use super::heating::HeatingSplitter;
use super::reserve::ReserveFundAccrual;
use crate::building::{Apartment, HeatingSystem, MillsBasis, Period, ReserveFundSettings};
use crate::expense::MeterReadings;

/// Strategy to generate positive amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a building of 1-40 apartments with mills 0-400.
fn apartments() -> impl Strategy<Value = Vec<Apartment>> {
    prop::collection::vec((0u32..400, 0u32..400), 1..40).prop_map(|mills| {
        mills
            .into_iter()
            .enumerate()
            .map(|(i, (participation, heating))| Apartment {
                id: ApartmentId::from_u128(i as u128 + 1),
                identifier: format!("A{}", i + 1),
                owner_name: None,
                tenant_name: None,
                participation_mills: Decimal::from(participation),
                heating_mills: Decimal::from(heating),
                elevator_mills: None,
                previous_balance: Decimal::ZERO,
            })
            .collect()
    })
}

/// Strategy to generate a fixed percentage 0-100 with two decimals.
fn percentage() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|v| Decimal::new(v, 2))
}

fn readings_for(apartments: &[Apartment], values: &[u32]) -> MeterReadings {
    apartments
        .iter()
        .zip(values.iter().cycle())
        .map(|(a, v)| (a.id, Decimal::from(*v)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Mills allocation sums to the amount, to the cent.
    #[test]
    fn prop_mills_allocation_sums_to_amount(
        amount in positive_amount(),
        apartments in apartments(),
    ) {
        let outcome = AllocationEngine::new(2).allocate(
            amount,
            AllocationRule::ByMills(MillsBasis::Participation),
            &apartments,
        );
        prop_assert_eq!(outcome.total(), amount);
        prop_assert_eq!(outcome.shares.len(), apartments.len());
    }

    /// Zero-mills apartments pay nothing unless every apartment has zero mills.
    #[test]
    fn prop_zero_mills_pay_nothing(
        amount in positive_amount(),
        apartments in apartments(),
    ) {
        let has_weight = apartments.iter().any(|a| a.participation_mills > Decimal::ZERO);
        prop_assume!(has_weight);

        let outcome = AllocationEngine::new(2).allocate(
            amount,
            AllocationRule::ByMills(MillsBasis::Participation),
            &apartments,
        );
        for apartment in apartments.iter().filter(|a| a.participation_mills.is_zero()) {
            prop_assert_eq!(outcome.shares[&apartment.id], Decimal::ZERO);
        }
    }

    /// Equal share: every share is floor(amount / n) or one cent more.
    #[test]
    fn prop_equal_share_within_one_cent(
        amount in positive_amount(),
        apartments in apartments(),
    ) {
        let outcome =
            AllocationEngine::new(2).allocate(amount, AllocationRule::EqualShare, &apartments);
        let n = Decimal::from(apartments.len());
        let floor = (amount / n).round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity);
        let cent = Decimal::new(1, 2);

        prop_assert_eq!(outcome.total(), amount);
        for share in outcome.shares.values() {
            prop_assert!(
                *share == floor || *share == floor + cent,
                "share {} floor {}",
                share,
                floor
            );
        }

        // Extra cents go to the lowest ids.
        let shares: Vec<Decimal> = outcome.shares.values().copied().collect();
        prop_assert!(shares.windows(2).all(|w| w[0] >= w[1]));
    }

    /// Heating split: fixed + variable == total for any percentage.
    #[test]
    fn prop_heating_parts_sum_to_total(
        amount in positive_amount(),
        pct in percentage(),
        apartments in apartments(),
        consumption in prop::collection::vec(0u32..500, 1..10),
    ) {
        let readings = readings_for(&apartments, &consumption);
        let split = HeatingSplitter::new(AllocationEngine::new(2)).split(
            amount,
            pct,
            HeatingSystem::HourMeters,
            &apartments,
            &readings,
        );

        prop_assert_eq!(split.fixed_cost + split.variable_cost, amount);
        let per_apartment: Decimal = split.per_apartment.values().map(|s| s.total()).sum();
        prop_assert_eq!(per_apartment, amount);
    }

    /// All-zero readings fall back to equal share and record the condition.
    #[test]
    fn prop_zero_readings_fall_back(
        amount in positive_amount(),
        apartments in apartments(),
    ) {
        let readings = readings_for(&apartments, &[0]);
        let outcome = AllocationEngine::new(2).allocate(
            amount,
            AllocationRule::ByMeters(&readings),
            &apartments,
        );

        prop_assert_eq!(outcome.total(), amount);
        prop_assert_eq!(
            outcome.edge_cases,
            vec![AllocationEdgeCase::NoConsumptionData { amount }]
        );
    }

    /// Reserve accrual is zero outside its window and goal/duration inside it.
    #[test]
    fn prop_reserve_window(
        goal_units in 1i64..1_000_000,
        duration in 1u32..120,
        offset in -24i32..36,
    ) {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let target = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let settings = ReserveFundSettings {
            goal: Some(Decimal::from(goal_units)),
            duration_months: Some(duration),
            start_date: Some(start),
            target_date: Some(target),
        };

        let months = 2026 * 12 + offset;
        let period = Period::for_month(
            months.div_euclid(12),
            months.rem_euclid(12).unsigned_abs() + 1,
        )
        .unwrap();
        let monthly =
            ReserveFundAccrual::new(AllocationEngine::new(2)).monthly_target(&settings, &period);

        if period.end_date < start || period.start_date > target {
            prop_assert_eq!(monthly, Decimal::ZERO);
        } else {
            let expected = (Decimal::from(goal_units) / Decimal::from(duration))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
            prop_assert_eq!(monthly, expected);
        }
    }
}
