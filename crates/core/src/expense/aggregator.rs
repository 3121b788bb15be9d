//! Expense aggregation by charge bucket.
//!
//! Groups the period's expense records into the buckets the share breakdown
//! reports (general, elevator, heating, equal share, individual) and totals
//! them. Targeted expenses are withheld from the general pool and only
//! surface in the individual bucket.

use commonfee_shared::types::{ExpenseId, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::category::{CategoryKind, CategoryMap};
use super::types::{DistributionType, Expense, PayerResponsibility};
use crate::allocation::{AllocationEdgeCase, EdgeCaseRecord};

/// Breakdown bucket an expense lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeBucket {
    /// Common expenses.
    General,
    /// Elevator expenses.
    Elevator,
    /// Heating expenses.
    Heating,
    /// Expenses split equally.
    EqualShare,
    /// Expenses charged to specific apartments.
    Individual,
}

/// Which payers to include when aggregating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayerFilter {
    /// Every expense.
    #[default]
    All,
    /// Only expenses with this responsibility.
    Only(PayerResponsibility),
}

impl PayerFilter {
    fn accepts(self, payer: PayerResponsibility) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == payer,
        }
    }
}

/// One expense routed to its bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeLine {
    /// Source expense.
    pub expense_id: ExpenseId,
    /// Bucket it contributes to.
    pub bucket: ChargeBucket,
    /// Amount, rounded to currency precision.
    pub amount: Decimal,
    /// Distribution rule of the source expense.
    pub distribution: DistributionType,
    /// Who is liable.
    pub payer: PayerResponsibility,
}

/// Totals per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    /// General pool.
    pub general: Decimal,
    /// Elevator pool.
    pub elevator: Decimal,
    /// Heating pool.
    pub heating: Decimal,
    /// Equal-share pool.
    pub equal_share: Decimal,
    /// Targeted expenses.
    pub individual: Decimal,
}

impl BucketTotals {
    fn add(&mut self, bucket: ChargeBucket, amount: Decimal) {
        match bucket {
            ChargeBucket::General => self.general += amount,
            ChargeBucket::Elevator => self.elevator += amount,
            ChargeBucket::Heating => self.heating += amount,
            ChargeBucket::EqualShare => self.equal_share += amount,
            ChargeBucket::Individual => self.individual += amount,
        }
    }

    /// Sum over all buckets.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.general + self.elevator + self.heating + self.equal_share + self.individual
    }
}

/// Result of aggregating the period's expenses.
#[derive(Debug, Clone, Default)]
pub struct AggregatedExpenses {
    /// Expenses in input order, routed to their buckets.
    pub lines: Vec<ChargeLine>,
    /// Totals per bucket.
    pub totals: BucketTotals,
    /// Totals per category name, for display.
    pub category_totals: BTreeMap<String, Decimal>,
    /// Conditions met while aggregating.
    pub edge_cases: Vec<EdgeCaseRecord>,
}

/// Groups expenses into charge buckets.
pub struct ExpenseAggregator {
    decimal_places: u32,
}

impl ExpenseAggregator {
    /// Creates an aggregator rounding amounts to `decimal_places`.
    #[must_use]
    pub const fn new(decimal_places: u32) -> Self {
        Self { decimal_places }
    }

    /// Routes each expense to its bucket and totals the buckets.
    ///
    /// Unknown categories are treated as [`CategoryKind::Other`] and
    /// recorded as `MissingCategoryData`; non-positive amounts are skipped
    /// and recorded as `NonPositiveAmount`.
    #[must_use]
    pub fn aggregate(
        &self,
        expenses: &[Expense],
        categories: &CategoryMap,
        filter: PayerFilter,
    ) -> AggregatedExpenses {
        let mut result = AggregatedExpenses::default();

        for expense in expenses.iter().filter(|e| filter.accepts(e.payer)) {
            let amount = round_money(expense.amount, self.decimal_places);
            if amount <= Decimal::ZERO {
                result.edge_cases.push(EdgeCaseRecord::for_expense(
                    expense.id,
                    AllocationEdgeCase::NonPositiveAmount { amount },
                ));
                continue;
            }

            let kind = categories.resolve(&expense.category).unwrap_or_else(|| {
                result.edge_cases.push(EdgeCaseRecord::for_expense(
                    expense.id,
                    AllocationEdgeCase::MissingCategoryData {
                        category: expense.category.clone(),
                    },
                ));
                CategoryKind::Other
            });

            let bucket = Self::bucket_for(kind, &expense.distribution);
            result.totals.add(bucket, amount);
            *result
                .category_totals
                .entry(expense.category.clone())
                .or_insert(Decimal::ZERO) += amount;
            result.lines.push(ChargeLine {
                expense_id: expense.id,
                bucket,
                amount,
                distribution: expense.distribution.clone(),
                payer: expense.payer,
            });
        }

        debug!(
            general = %result.totals.general,
            elevator = %result.totals.elevator,
            heating = %result.totals.heating,
            equal_share = %result.totals.equal_share,
            individual = %result.totals.individual,
            "Aggregated expenses"
        );

        result
    }

    /// Bucket for a category kind and distribution rule.
    ///
    /// The distribution rule wins for targeted and equal-share expenses;
    /// otherwise the category decides.
    #[must_use]
    pub fn bucket_for(kind: CategoryKind, distribution: &DistributionType) -> ChargeBucket {
        match (distribution, kind) {
            (DistributionType::SpecificApartments { .. }, _) => ChargeBucket::Individual,
            (DistributionType::EqualShare, _) => ChargeBucket::EqualShare,
            (_, CategoryKind::Heating) => ChargeBucket::Heating,
            (_, CategoryKind::Elevator) => ChargeBucket::Elevator,
            (_, CategoryKind::General | CategoryKind::Other) => ChargeBucket::General,
        }
    }
}
