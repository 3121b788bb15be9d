//! Non-fatal allocation conditions.
//!
//! Edge cases are attached to the calculation and surfaced as warnings.
//! They are never returned as errors.

use commonfee_shared::types::{ApartmentId, ExpenseId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::building::MillsBasis;

/// A rule could not be applied as written and a substitute was used.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationEdgeCase {
    /// Total consumption was zero; the amount was split equally instead.
    #[error("No consumption data for {amount}; split equally instead")]
    NoConsumptionData {
        /// Amount that was re-routed.
        amount: Decimal,
    },

    /// Every apartment has zero mills in the column; the amount was split equally.
    #[error("Total {basis} mills are zero for {amount}; split equally instead")]
    ZeroTotalMills {
        /// The mills column that summed to zero.
        basis: MillsBasis,
        /// Amount that was re-routed.
        amount: Decimal,
    },

    /// The targeted apartments have zero combined mills; split equally among them.
    #[error("Targeted apartments have zero mills for {amount}; split equally among them")]
    ZeroSubsetMills {
        /// Amount that was re-routed.
        amount: Decimal,
    },

    /// There was nobody to charge; the amount stays unallocated.
    #[error("No apartments to charge {amount}")]
    NoRecipients {
        /// Amount left unallocated.
        amount: Decimal,
    },

    /// A targeted apartment is not in the registry and was skipped.
    #[error("Targeted apartment {apartment_id} is not in the registry")]
    UnknownTargetApartment {
        /// The unknown apartment.
        apartment_id: ApartmentId,
    },

    /// A category has no mapping; it was treated as "other".
    #[error("Category '{category}' has no mapping; treated as other")]
    MissingCategoryData {
        /// The unmapped category name.
        category: String,
    },

    /// An expense amount was zero or negative and was skipped.
    #[error("Expense amount {amount} is not positive; skipped")]
    NonPositiveAmount {
        /// The offending amount.
        amount: Decimal,
    },
}

impl AllocationEdgeCase {
    /// Returns the warning code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoConsumptionData { .. } => "NO_CONSUMPTION_DATA",
            Self::ZeroTotalMills { .. } => "ZERO_TOTAL_MILLS",
            Self::ZeroSubsetMills { .. } => "ZERO_SUBSET_MILLS",
            Self::NoRecipients { .. } => "NO_RECIPIENTS",
            Self::UnknownTargetApartment { .. } => "UNKNOWN_TARGET_APARTMENT",
            Self::MissingCategoryData { .. } => "MISSING_CATEGORY_DATA",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
        }
    }
}

/// An edge case together with the expense that triggered it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCaseRecord {
    /// Expense the rule was applied to. `None` for building-level charges
    /// such as the heating split or the reserve fund.
    pub expense_id: Option<ExpenseId>,
    /// What happened.
    pub edge_case: AllocationEdgeCase,
}

impl EdgeCaseRecord {
    /// Attaches an edge case to an expense.
    #[must_use]
    pub fn for_expense(expense_id: ExpenseId, edge_case: AllocationEdgeCase) -> Self {
        Self {
            expense_id: Some(expense_id),
            edge_case,
        }
    }

    /// Records an edge case not tied to a single expense.
    #[must_use]
    pub fn building_level(edge_case: AllocationEdgeCase) -> Self {
        Self {
            expense_id: None,
            edge_case,
        }
    }
}

impl std::fmt::Display for EdgeCaseRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.expense_id {
            Some(id) => write!(f, "expense {id}: {}", self.edge_case),
            None => write!(f, "{}", self.edge_case),
        }
    }
}
