//! Property-based tests for reconciliation.
//!
//! - A pipeline result always validates without errors
//! - Drifting the components beyond tolerance always blocks
//! - External mismatches never block

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::types::ReconciliationStatus;
use super::validator::ReconciliationValidator;
use crate::billing::fixtures::{apartment, march, two_apartment_inputs};
use crate::billing::{CalculationPipeline, ExternalSummary};

/// Strategy to generate amounts from 0.01 to 100,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate signed balances.
fn balance() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Pipeline output reconciles for any amount, fee and balances.
    #[test]
    fn prop_pipeline_output_is_valid(
        amount in positive_amount(),
        fee in 0i64..5_000,
        balances in prop::collection::vec(balance(), 3),
        mills in prop::collection::vec(0u32..1_000, 3),
    ) {
        let mut inputs = two_apartment_inputs();
        inputs.apartments = mills
            .iter()
            .zip(&balances)
            .enumerate()
            .map(|(i, (m, b))| {
                let mut a = apartment(i as u128 + 1, Decimal::from(*m));
                a.previous_balance = *b;
                a
            })
            .collect();
        inputs.expenses[0].amount = amount;
        inputs.building.management_fee_per_apartment = Decimal::new(fee, 2);

        let calculation = CalculationPipeline::default().compute(&inputs, &march());
        let result = ReconciliationValidator::default().validate(&calculation);

        prop_assert!(result.is_valid, "{}", result.summary);
        prop_assert!(result.errors.is_empty());
        prop_assert_eq!(result.component_total, result.share_total);
    }

    /// Components drifting by more than the tolerance always block.
    #[test]
    fn prop_drift_beyond_tolerance_blocks(
        amount in positive_amount(),
        drift_cents in 51i64..100_000,
        negative in any::<bool>(),
    ) {
        let mut inputs = two_apartment_inputs();
        inputs.expenses[0].amount = amount;
        let mut calculation = CalculationPipeline::default().compute(&inputs, &march());
        let drift = Decimal::new(if negative { -drift_cents } else { drift_cents }, 2);
        calculation.totals.previous_balance_total += drift;

        let result = ReconciliationValidator::default().validate(&calculation);
        prop_assert!(!result.is_valid);
        prop_assert_eq!(result.status, ReconciliationStatus::Error);
    }

    /// Any external figures only ever produce warnings.
    #[test]
    fn prop_external_mismatch_never_blocks(
        amount in positive_amount(),
        grand_total in proptest::option::of(positive_amount()),
        fee_total in proptest::option::of(positive_amount()),
        reserve_total in proptest::option::of(positive_amount()),
    ) {
        let mut inputs = two_apartment_inputs();
        inputs.expenses[0].amount = amount;
        inputs.external_summary = Some(ExternalSummary {
            grand_total,
            management_fee_total: fee_total,
            reserve_fund_total: reserve_total,
        });

        let calculation = CalculationPipeline::default().compute(&inputs, &march());
        let result = ReconciliationValidator::default().validate(&calculation);

        prop_assert!(result.is_valid);
        prop_assert_ne!(result.status, ReconciliationStatus::Error);
    }
}
