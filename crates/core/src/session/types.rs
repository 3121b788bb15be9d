//! Session domain types.

use chrono::{DateTime, Utc};
use commonfee_shared::types::{BuildingId, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::billing::{Calculation, Share};
use crate::building::Period;
use crate::reconciliation::{ReconciliationResult, ReconciliationStatus};

/// Session status in the issuance lifecycle.
///
/// The valid transitions are:
/// - Draft → Validated (a result was applied, or validation was requested)
/// - Validated → Draft (recalculation requested)
/// - Validated → Issued (issue, only when reconciliation is valid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// A recalculation is pending or no result has been validated yet.
    Draft,
    /// The current result has been reconciled.
    Validated,
    /// The result has been frozen (immutable).
    Issued,
}

impl SessionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Validated => "validated",
            Self::Issued => "issued",
        }
    }

    /// Returns true if the session no longer accepts recalculation.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Issued)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies the (building, period) a session computes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    /// Building.
    pub building_id: BuildingId,
    /// Period month key (`YYYY-MM`).
    pub month_key: String,
}

impl SessionKey {
    /// Key for a building and period.
    #[must_use]
    pub fn new(building_id: BuildingId, period: &Period) -> Self {
        Self {
            building_id,
            month_key: period.month_key.clone(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.building_id, self.month_key)
    }
}

/// Monotonically increasing tag of a recalculation request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct RequestId(pub u64);

impl RequestId {
    /// The identifier issued after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened to a fetched response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The response was the latest and replaced the visible result.
    Applied {
        /// Request the response belonged to.
        request: RequestId,
        /// Reconciliation verdict of the new result.
        reconciliation: ReconciliationStatus,
    },
    /// A newer request exists; the response was discarded.
    Superseded {
        /// Request the response belonged to.
        request: RequestId,
        /// Latest request issued.
        latest: RequestId,
    },
}

impl ApplyOutcome {
    /// Returns true if the response was applied.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Frozen result of an issued session.
///
/// Handed to downstream consumers (rendering, notification) as an opaque
/// record; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedSnapshot {
    /// Session that produced the snapshot.
    pub session_id: SessionId,
    /// Building and period.
    pub key: SessionKey,
    /// Issuance version, starting at 1.
    pub version: u32,
    /// Computed shares and totals.
    pub calculation: Calculation,
    /// Reconciliation verdict at issuance.
    pub reconciliation: ReconciliationResult,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
}

impl IssuedSnapshot {
    /// Shares frozen in the snapshot.
    #[must_use]
    pub fn shares(&self) -> &[Share] {
        &self.calculation.shares
    }

    /// Serializes the snapshot for export.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
