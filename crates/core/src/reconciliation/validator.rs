//! Cross-checks the totals of a calculation.
//!
//! The grand total is computed from the components (categories, fees,
//! reserve, previous balances) and from the shares, and compared with an
//! external summary when one is supplied. Disagreement between the two
//! internal totals, or a share inconsistent with its own breakdown, blocks
//! issuance. Everything involving external figures is informational.

use commonfee_shared::EngineConfig;
use commonfee_shared::types::within_tolerance;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::types::{
    ReconciliationCheck, ReconciliationIssue, ReconciliationResult, ReconciliationStatus,
};
use crate::billing::{Calculation, ExternalSummary};

/// Validates a calculation's totals.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationValidator {
    tolerance: Decimal,
    mills_denominator: Decimal,
}

impl Default for ReconciliationValidator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ReconciliationValidator {
    /// Creates a validator accepting differences up to `tolerance`.
    #[must_use]
    pub const fn new(tolerance: Decimal, mills_denominator: Decimal) -> Self {
        Self {
            tolerance,
            mills_denominator,
        }
    }

    /// Creates a validator from the engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.reconciliation_tolerance, config.mills_denominator)
    }

    /// Accepted difference between two totals.
    #[must_use]
    pub const fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Runs every check against `calculation`.
    #[must_use]
    pub fn validate(&self, calculation: &Calculation) -> ReconciliationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let component_total = calculation.totals.component_total();
        let share_total = calculation.share_total();

        if !within_tolerance(component_total, share_total, self.tolerance) {
            errors.push(ReconciliationIssue::mismatch(
                ReconciliationCheck::ComponentsVsShares,
                component_total,
                share_total,
                format!(
                    "Sum of shares {share_total} differs from components total {component_total}"
                ),
            ));
        }

        Self::check_shares(calculation, &mut errors);

        let external_total = calculation
            .external_summary
            .as_ref()
            .and_then(|summary| summary.grand_total);
        if let Some(external) = &calculation.external_summary {
            self.check_external(calculation, external, &mut warnings);
        }

        for reserve_override in &calculation.reserve_overrides {
            warnings.push(
                ReconciliationIssue::mismatch(
                    ReconciliationCheck::ReserveOverride,
                    reserve_override.derived,
                    reserve_override.external,
                    format!(
                        "External reserve contribution {} replaced derived {}",
                        reserve_override.external, reserve_override.derived
                    ),
                )
                .for_apartment(reserve_override.apartment_id),
            );
        }

        let denominator = if calculation.mills_denominator > Decimal::ZERO {
            calculation.mills_denominator
        } else {
            self.mills_denominator
        };
        let mills_total = calculation.totals.participation_mills_total;
        if !calculation.shares.is_empty() && mills_total != denominator {
            warnings.push(ReconciliationIssue::mismatch(
                ReconciliationCheck::MillsDenominator,
                denominator,
                mills_total,
                format!("Participation mills sum to {mills_total}, expected {denominator}"),
            ));
        }

        warnings.extend(calculation.edge_cases.iter().map(|record| {
            ReconciliationIssue::note(ReconciliationCheck::AllocationFallback, record.to_string())
        }));

        let status = if !errors.is_empty() {
            ReconciliationStatus::Error
        } else if !warnings.is_empty() {
            ReconciliationStatus::Warning
        } else {
            ReconciliationStatus::Valid
        };
        let summary = summarize(status, &errors, &warnings, component_total, share_total);

        if errors.is_empty() {
            debug!(
                %status,
                warnings = warnings.len(),
                %component_total,
                %share_total,
                "Reconciliation completed"
            );
        } else {
            warn!(
                %status,
                errors = errors.len(),
                %component_total,
                %share_total,
                "Reconciliation failed"
            );
        }

        ReconciliationResult {
            status,
            is_valid: errors.is_empty(),
            errors,
            warnings,
            summary,
            component_total,
            share_total,
            external_total,
        }
    }

    /// Each share must agree with its own breakdown.
    fn check_shares(calculation: &Calculation, errors: &mut Vec<ReconciliationIssue>) {
        for share in &calculation.shares {
            let expected = share.expected_total_due();
            if share.total_due != expected {
                errors.push(
                    ReconciliationIssue::mismatch(
                        ReconciliationCheck::ShareIntegrity,
                        expected,
                        share.total_due,
                        format!(
                            "{}: total due {} does not match its breakdown {expected}",
                            share.identifier, share.total_due
                        ),
                    )
                    .for_apartment(share.apartment_id),
                );
            }

            let partition = share.breakdown.resident_total + share.breakdown.owner_total;
            let charges = share.new_charges();
            if partition != charges {
                errors.push(
                    ReconciliationIssue::mismatch(
                        ReconciliationCheck::PayerPartition,
                        charges,
                        partition,
                        format!(
                            "{}: resident and owner totals {partition} \
                             do not cover charges {charges}",
                            share.identifier
                        ),
                    )
                    .for_apartment(share.apartment_id),
                );
            }
        }
    }

    /// Compares internal totals with the external summary.
    fn check_external(
        &self,
        calculation: &Calculation,
        external: &ExternalSummary,
        warnings: &mut Vec<ReconciliationIssue>,
    ) {
        let component_total = calculation.totals.component_total();
        let share_total = calculation.share_total();

        let pairs = [
            (
                ReconciliationCheck::ExternalGrandTotal,
                external.grand_total,
                component_total,
                "Components total",
            ),
            (
                ReconciliationCheck::SharesVsExternal,
                external.grand_total,
                share_total,
                "Sum of shares",
            ),
            (
                ReconciliationCheck::ExternalManagementFee,
                external.management_fee_total,
                calculation.totals.management_fee_total,
                "Management fee total",
            ),
            (
                ReconciliationCheck::ExternalReserveFund,
                external.reserve_fund_total,
                calculation.totals.reserve_fund_total,
                "Reserve fund total",
            ),
        ];

        for (check, expected, actual, label) in pairs {
            let Some(expected) = expected else {
                continue;
            };
            if !within_tolerance(expected, actual, self.tolerance) {
                warnings.push(ReconciliationIssue::mismatch(
                    check,
                    expected,
                    actual,
                    format!("{label} {actual} differs from external figure {expected}"),
                ));
            }
        }
    }
}

fn summarize(
    status: ReconciliationStatus,
    errors: &[ReconciliationIssue],
    warnings: &[ReconciliationIssue],
    component_total: Decimal,
    share_total: Decimal,
) -> String {
    match status {
        ReconciliationStatus::Valid => {
            format!("All totals agree: {share_total}")
        }
        ReconciliationStatus::Warning => format!(
            "Totals agree ({share_total}) with {} warning(s)",
            warnings.len()
        ),
        ReconciliationStatus::Error => format!(
            "Reconciliation failed with {} error(s) and {} warning(s): \
             components {component_total}, shares {share_total}",
            errors.len(),
            warnings.len()
        ),
        ReconciliationStatus::Unvalidated => "Not validated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocationEdgeCase, EdgeCaseRecord, ReserveOverride};
    use crate::billing::CalculationPipeline;
    use crate::billing::fixtures::{apartment, id, march, two_apartment_inputs};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn calculation() -> Calculation {
        CalculationPipeline::default().compute(&two_apartment_inputs(), &march())
    }

    fn validator() -> ReconciliationValidator {
        ReconciliationValidator::default()
    }

    #[test]
    fn test_clean_calculation_is_valid() {
        let result = validator().validate(&calculation());
        assert!(result.is_valid);
        assert_eq!(result.status, ReconciliationStatus::Valid);
        assert_eq!(result.component_total, dec!(100));
        assert_eq!(result.share_total, dec!(100));
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_internal_disagreement_is_error() {
        let mut calculation = calculation();
        calculation.totals.buckets.general += dec!(0.51);

        let result = validator().validate(&calculation);
        assert!(!result.is_valid);
        assert_eq!(result.status, ReconciliationStatus::Error);
        assert_eq!(result.errors[0].check, ReconciliationCheck::ComponentsVsShares);
        assert_eq!(result.errors[0].difference, dec!(-0.51));
    }

    #[test]
    fn test_internal_difference_within_tolerance_passes() {
        let mut calculation = calculation();
        calculation.totals.buckets.general += dec!(0.50);
        assert!(validator().validate(&calculation).is_valid);
    }

    #[test]
    fn test_inconsistent_share_is_error() {
        let mut calculation = calculation();
        calculation.shares[0].total_due += dec!(0.01);
        calculation.shares[1].total_due -= dec!(0.01);

        let result = validator().validate(&calculation);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert!(
            result
                .errors
                .iter()
                .all(|e| e.check == ReconciliationCheck::ShareIntegrity)
        );
        assert_eq!(result.errors[0].apartment_id, Some(id(1)));
    }

    #[test]
    fn test_broken_partition_is_error() {
        let mut calculation = calculation();
        calculation.shares[0].breakdown.owner_total += dec!(1);

        let result = validator().validate(&calculation);
        assert_eq!(result.errors[0].check, ReconciliationCheck::PayerPartition);
    }

    #[rstest]
    #[case(Some(dec!(100)), None, None, 0)]
    #[case(Some(dec!(100.40)), None, None, 0)]
    #[case(Some(dec!(101)), None, None, 2)]
    #[case(None, Some(dec!(10)), None, 1)]
    #[case(None, None, Some(dec!(0.49)), 0)]
    #[case(Some(dec!(90)), Some(dec!(5)), Some(dec!(5)), 4)]
    fn test_external_mismatches_are_warnings(
        #[case] grand_total: Option<Decimal>,
        #[case] management_fee_total: Option<Decimal>,
        #[case] reserve_fund_total: Option<Decimal>,
        #[case] expected_warnings: usize,
    ) {
        let mut calculation = calculation();
        calculation.external_summary = Some(ExternalSummary {
            grand_total,
            management_fee_total,
            reserve_fund_total,
        });

        let result = validator().validate(&calculation);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), expected_warnings);
        assert_eq!(result.external_total, grand_total);
        if expected_warnings > 0 {
            assert_eq!(result.status, ReconciliationStatus::Warning);
        }
    }

    #[test]
    fn test_reserve_override_is_warning() {
        let mut calculation = calculation();
        calculation.reserve_overrides.push(ReserveOverride {
            apartment_id: id(2),
            derived: dec!(40),
            external: dec!(45),
        });

        let result = validator().validate(&calculation);
        assert!(result.is_valid);
        assert_eq!(result.warnings[0].check, ReconciliationCheck::ReserveOverride);
        assert_eq!(result.warnings[0].apartment_id, Some(id(2)));
        assert_eq!(result.warnings[0].difference, dec!(5));
    }

    #[test]
    fn test_mills_denominator_mismatch_is_warning() {
        let mut inputs = two_apartment_inputs();
        inputs.apartments.push(apartment(3, dec!(50)));
        let calculation = CalculationPipeline::default().compute(&inputs, &march());

        let result = validator().validate(&calculation);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].check, ReconciliationCheck::MillsDenominator);
        assert_eq!(result.warnings[0].actual, Some(dec!(1050)));
    }

    #[test]
    fn test_edge_cases_surface_as_warnings() {
        let mut calculation = calculation();
        calculation
            .edge_cases
            .push(EdgeCaseRecord::building_level(AllocationEdgeCase::NoConsumptionData {
                amount: dec!(140),
            }));

        let result = validator().validate(&calculation);
        assert_eq!(result.status, ReconciliationStatus::Warning);
        assert_eq!(result.warnings[0].check, ReconciliationCheck::AllocationFallback);
        assert!(result.warnings[0].message.contains("140"));
    }

    #[test]
    fn test_unallocated_amount_blocks() {
        let mut inputs = two_apartment_inputs();
        inputs.expenses[0].distribution = crate::expense::DistributionType::SpecificApartments {
            apartments: [id(42)].into_iter().collect(),
        };
        let calculation = CalculationPipeline::default().compute(&inputs, &march());

        let result = validator().validate(&calculation);
        assert!(!result.is_valid);
        assert_eq!(result.component_total, dec!(100));
        assert_eq!(result.share_total, dec!(0));
    }
}
