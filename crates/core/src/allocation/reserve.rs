//! Reserve-fund accrual.
//!
//! The monthly target is `goal / duration_months`, collected only while the
//! period overlaps the fund's `[start_date, target_date]` window, and is
//! apportioned by participation mills.

use commonfee_shared::types::{ApartmentId, round_money, within_tolerance};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::edge_case::AllocationEdgeCase;
use super::engine::{AllocationEngine, AllocationRule};
use super::util::Allocation;
use crate::building::{Apartment, MillsBasis, Period, ReserveFundSettings};

/// Reserve contribution for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReserveAccrual {
    /// Amount to collect from the whole building this period.
    pub monthly_target: Decimal,
    /// Contribution per apartment.
    pub per_apartment: Allocation,
    /// Fallbacks taken while apportioning.
    pub edge_cases: Vec<AllocationEdgeCase>,
}

/// An externally supplied contribution that replaced a derived one it
/// disagrees with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveOverride {
    /// Apartment concerned.
    pub apartment_id: ApartmentId,
    /// Locally derived contribution.
    pub derived: Decimal,
    /// Externally supplied contribution that was applied.
    pub external: Decimal,
}

/// Reserve-fund accrual calculator.
#[derive(Debug, Clone, Copy)]
pub struct ReserveFundAccrual {
    engine: AllocationEngine,
}

impl ReserveFundAccrual {
    /// Creates a calculator on top of an allocation engine.
    #[must_use]
    pub const fn new(engine: AllocationEngine) -> Self {
        Self { engine }
    }

    /// Building-wide contribution for `period`.
    ///
    /// Zero when the goal or duration is missing or zero, or when the period
    /// lies entirely before `start_date` or entirely after `target_date`.
    #[must_use]
    pub fn monthly_target(&self, settings: &ReserveFundSettings, period: &Period) -> Decimal {
        let (Some(goal), Some(duration)) = (settings.goal, settings.duration_months) else {
            return Decimal::ZERO;
        };
        if duration == 0 || goal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        if !period.overlaps(settings.start_date, settings.target_date) {
            return Decimal::ZERO;
        }

        round_money(goal / Decimal::from(duration), self.engine.decimal_places())
    }

    /// Monthly target apportioned by participation mills.
    #[must_use]
    pub fn accrue(
        &self,
        settings: &ReserveFundSettings,
        period: &Period,
        apartments: &[Apartment],
    ) -> ReserveAccrual {
        let monthly_target = self.monthly_target(settings, period);
        if monthly_target.is_zero() {
            return ReserveAccrual {
                monthly_target,
                per_apartment: apartments.iter().map(|a| (a.id, Decimal::ZERO)).collect(),
                edge_cases: Vec::new(),
            };
        }

        let outcome = self.engine.allocate(
            monthly_target,
            AllocationRule::ByMills(MillsBasis::Participation),
            apartments,
        );

        ReserveAccrual {
            monthly_target,
            per_apartment: outcome.shares,
            edge_cases: outcome.edge_cases,
        }
    }

    /// Merges derived contributions with externally supplied ones.
    ///
    /// A non-zero external figure always wins; an external zero never
    /// replaces a derived value. When both are non-zero and differ by more
    /// than `tolerance`, the replacement is reported.
    #[must_use]
    pub fn resolve_with_external(
        derived: &Allocation,
        external: &BTreeMap<ApartmentId, Decimal>,
        tolerance: Decimal,
    ) -> (Allocation, Vec<ReserveOverride>) {
        let mut overrides = Vec::new();
        let resolved = derived
            .iter()
            .map(|(id, derived_amount)| {
                let amount = match external.get(id) {
                    Some(external_amount) if !external_amount.is_zero() => {
                        if !derived_amount.is_zero()
                            && !within_tolerance(*derived_amount, *external_amount, tolerance)
                        {
                            overrides.push(ReserveOverride {
                                apartment_id: *id,
                                derived: *derived_amount,
                                external: *external_amount,
                            });
                        }
                        *external_amount
                    }
                    _ => *derived_amount,
                };
                (*id, amount)
            })
            .collect();

        (resolved, overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn id(n: u128) -> ApartmentId {
        ApartmentId::from_u128(n)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn apartments() -> Vec<Apartment> {
        [(1, dec!(600)), (2, dec!(400))]
            .into_iter()
            .map(|(n, mills)| Apartment {
                id: id(n),
                identifier: format!("A{n}"),
                owner_name: None,
                tenant_name: None,
                participation_mills: mills,
                heating_mills: mills,
                elevator_mills: None,
                previous_balance: Decimal::ZERO,
            })
            .collect()
    }

    fn settings() -> ReserveFundSettings {
        ReserveFundSettings {
            goal: Some(dec!(1200)),
            duration_months: Some(12),
            start_date: Some(date(2026, 1, 1)),
            target_date: Some(date(2026, 12, 31)),
        }
    }

    fn accrual() -> ReserveFundAccrual {
        ReserveFundAccrual::new(AllocationEngine::new(2))
    }

    #[test]
    fn test_inside_window() {
        let period = Period::for_month(2026, 6).unwrap();
        let result = accrual().accrue(&settings(), &period, &apartments());
        assert_eq!(result.monthly_target, dec!(100));
        assert_eq!(result.per_apartment[&id(1)], dec!(60));
        assert_eq!(result.per_apartment[&id(2)], dec!(40));
    }

    #[test]
    fn test_before_start_and_after_target() {
        let before = Period::for_month(2025, 12).unwrap();
        let after = Period::for_month(2027, 1).unwrap();
        assert_eq!(accrual().monthly_target(&settings(), &before), dec!(0));
        assert_eq!(accrual().monthly_target(&settings(), &after), dec!(0));

        let result = accrual().accrue(&settings(), &after, &apartments());
        assert_eq!(result.per_apartment[&id(1)], dec!(0));
    }

    #[test]
    fn test_window_edges_are_inclusive() {
        let first = Period::for_month(2026, 1).unwrap();
        let last = Period::for_month(2026, 12).unwrap();
        assert_eq!(accrual().monthly_target(&settings(), &first), dec!(100));
        assert_eq!(accrual().monthly_target(&settings(), &last), dec!(100));
    }

    #[test]
    fn test_missing_goal_or_duration() {
        let period = Period::for_month(2026, 6).unwrap();
        let mut no_goal = settings();
        no_goal.goal = None;
        assert_eq!(accrual().monthly_target(&no_goal, &period), dec!(0));

        let mut zero_duration = settings();
        zero_duration.duration_months = Some(0);
        assert_eq!(accrual().monthly_target(&zero_duration, &period), dec!(0));
    }

    #[test]
    fn test_open_window() {
        let period = Period::for_month(2030, 6).unwrap();
        let open = ReserveFundSettings {
            goal: Some(dec!(1000)),
            duration_months: Some(3),
            start_date: None,
            target_date: None,
        };
        assert_eq!(accrual().monthly_target(&open, &period), dec!(333.33));
    }

    #[test]
    fn test_external_nonzero_wins() {
        let derived = BTreeMap::from([(id(1), dec!(60)), (id(2), dec!(40))]);
        let external = BTreeMap::from([(id(1), dec!(75)), (id(2), dec!(40.005))]);

        let (resolved, overrides) =
            ReserveFundAccrual::resolve_with_external(&derived, &external, dec!(0.01));

        assert_eq!(resolved[&id(1)], dec!(75));
        assert_eq!(resolved[&id(2)], dec!(40.005));
        assert_eq!(
            overrides,
            vec![ReserveOverride {
                apartment_id: id(1),
                derived: dec!(60),
                external: dec!(75),
            }]
        );
    }

    #[test]
    fn test_external_zero_never_overrides() {
        let derived = BTreeMap::from([(id(1), dec!(60))]);
        let external = BTreeMap::from([(id(1), dec!(0))]);
        let (resolved, overrides) =
            ReserveFundAccrual::resolve_with_external(&derived, &external, dec!(0.01));
        assert_eq!(resolved[&id(1)], dec!(60));
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_external_applies_over_derived_zero_without_report() {
        let derived = BTreeMap::from([(id(1), dec!(0))]);
        let external = BTreeMap::from([(id(1), dec!(25))]);
        let (resolved, overrides) =
            ReserveFundAccrual::resolve_with_external(&derived, &external, dec!(0.01));
        assert_eq!(resolved[&id(1)], dec!(25));
        assert!(overrides.is_empty());
    }
}
