//! Reconciliation result types.

use commonfee_shared::types::ApartmentId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Outcome of the last validation run.
///
/// ```text
/// Unvalidated ──validate──► Valid | Warning | Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// No validation has run on the current result.
    #[default]
    Unvalidated,
    /// Every check passed.
    Valid,
    /// Only non-blocking mismatches were found.
    Warning,
    /// At least one blocking mismatch was found.
    Error,
}

impl ReconciliationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvalidated => "unvalidated",
            Self::Valid => "valid",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which comparison produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationCheck {
    /// Components total against the sum of shares.
    ComponentsVsShares,
    /// A share's total_due against its own breakdown.
    ShareIntegrity,
    /// A share's resident/owner partition against its charges.
    PayerPartition,
    /// Components total against the external grand total.
    ExternalGrandTotal,
    /// Sum of shares against the external grand total.
    SharesVsExternal,
    /// Management fees against the external figure.
    ExternalManagementFee,
    /// Reserve contributions against the external figure.
    ExternalReserveFund,
    /// An external reserve contribution replaced a disagreeing derived one.
    ReserveOverride,
    /// Participation mills do not add up to the building's denominator.
    MillsDenominator,
    /// An allocation rule fell back to a substitute.
    AllocationFallback,
}

impl ReconciliationCheck {
    /// Returns the issue code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ComponentsVsShares => "COMPONENTS_VS_SHARES",
            Self::ShareIntegrity => "SHARE_INTEGRITY",
            Self::PayerPartition => "PAYER_PARTITION",
            Self::ExternalGrandTotal => "EXTERNAL_GRAND_TOTAL",
            Self::SharesVsExternal => "SHARES_VS_EXTERNAL",
            Self::ExternalManagementFee => "EXTERNAL_MANAGEMENT_FEE",
            Self::ExternalReserveFund => "EXTERNAL_RESERVE_FUND",
            Self::ReserveOverride => "RESERVE_OVERRIDE",
            Self::MillsDenominator => "MILLS_DENOMINATOR",
            Self::AllocationFallback => "ALLOCATION_FALLBACK",
        }
    }
}

/// One mismatch between two ways of computing the same figure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ReconciliationIssue {
    /// Comparison that failed.
    pub check: ReconciliationCheck,
    /// Apartment concerned, for per-share checks.
    pub apartment_id: Option<ApartmentId>,
    /// Reference value.
    pub expected: Option<Decimal>,
    /// Value found.
    pub actual: Option<Decimal>,
    /// `actual - expected`, zero when not applicable.
    pub difference: Decimal,
    /// Human-readable description.
    pub message: String,
}

impl ReconciliationIssue {
    /// Issue comparing two figures.
    #[must_use]
    pub fn mismatch(
        check: ReconciliationCheck,
        expected: Decimal,
        actual: Decimal,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check,
            apartment_id: None,
            expected: Some(expected),
            actual: Some(actual),
            difference: actual - expected,
            message: message.into(),
        }
    }

    /// Issue without figures to compare.
    #[must_use]
    pub fn note(check: ReconciliationCheck, message: impl Into<String>) -> Self {
        Self {
            check,
            apartment_id: None,
            expected: None,
            actual: None,
            difference: Decimal::ZERO,
            message: message.into(),
        }
    }

    /// Attaches the apartment the issue is about.
    #[must_use]
    pub fn for_apartment(mut self, apartment_id: ApartmentId) -> Self {
        self.apartment_id = Some(apartment_id);
        self
    }
}

/// Verdict of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Overall status.
    pub status: ReconciliationStatus,
    /// True when no blocking issue was found.
    pub is_valid: bool,
    /// Blocking issues.
    pub errors: Vec<ReconciliationIssue>,
    /// Informational issues.
    pub warnings: Vec<ReconciliationIssue>,
    /// Human-readable summary.
    pub summary: String,
    /// Grand total summed from components.
    pub component_total: Decimal,
    /// Grand total summed over shares.
    pub share_total: Decimal,
    /// Externally supplied grand total, if any.
    pub external_total: Option<Decimal>,
}

impl ReconciliationResult {
    /// Result before any validation has run. Not valid.
    #[must_use]
    pub fn unvalidated() -> Self {
        Self {
            status: ReconciliationStatus::Unvalidated,
            is_valid: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            summary: "Not validated".to_string(),
            component_total: Decimal::ZERO,
            share_total: Decimal::ZERO,
            external_total: None,
        }
    }
}

impl Default for ReconciliationResult {
    fn default() -> Self {
        Self::unvalidated()
    }
}
