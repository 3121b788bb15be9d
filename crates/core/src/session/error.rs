//! Session error types.
//!
//! Only missing inputs and invalid issuance abort an operation. Allocation
//! fallbacks and reconciliation mismatches are attached to the result.

use commonfee_shared::AppError;
use commonfee_shared::types::BuildingId;
use thiserror::Error;

use super::types::{RequestId, SessionStatus};

/// A required input could not be fetched; nothing is computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingInputError {
    /// Building settings fetch failed.
    #[error("Building settings unavailable: {reason}")]
    BuildingSettings {
        /// Collaborator's failure message.
        reason: String,
    },

    /// Apartment registry fetch failed.
    #[error("Apartment registry unavailable: {reason}")]
    ApartmentRegistry {
        /// Collaborator's failure message.
        reason: String,
    },

    /// The registry returned no apartments.
    #[error("Apartment registry is empty")]
    EmptyApartmentRegistry,

    /// Expense records fetch failed.
    #[error("Expenses unavailable: {reason}")]
    Expenses {
        /// Collaborator's failure message.
        reason: String,
    },

    /// Meter readings fetch failed.
    #[error("Meter readings unavailable: {reason}")]
    MeterReadings {
        /// Collaborator's failure message.
        reason: String,
    },

    /// The fetch stopped before returning (panicked or was cancelled).
    #[error("Input fetch aborted: {reason}")]
    FetchAborted {
        /// Why the fetch stopped.
        reason: String,
    },
}

impl MissingInputError {
    /// Name of the missing input.
    #[must_use]
    pub fn input(&self) -> &'static str {
        match self {
            Self::BuildingSettings { .. } => "building_settings",
            Self::ApartmentRegistry { .. } | Self::EmptyApartmentRegistry => "apartment_registry",
            Self::Expenses { .. } => "expenses",
            Self::MeterReadings { .. } => "meter_readings",
            Self::FetchAborted { .. } => "inputs",
        }
    }
}

/// Issuance was attempted in a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuanceStateError {
    /// The session has not been validated since its last change.
    #[error("Session is {status}, not validated")]
    NotValidated {
        /// Current status.
        status: SessionStatus,
    },

    /// Reconciliation found blocking errors.
    #[error("Reconciliation failed with {errors} error(s)")]
    ReconciliationFailed {
        /// Number of blocking issues.
        errors: usize,
    },

    /// The session was already issued.
    #[error("Session version {version} is already issued")]
    AlreadyIssued {
        /// Issued version.
        version: u32,
    },

    /// A successor can only follow an issued session.
    #[error("Session is {status}; only an issued session has a successor")]
    NotIssued {
        /// Current status.
        status: SessionStatus,
    },
}

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// An input was missing; the previous result is kept.
    #[error(transparent)]
    MissingInput(#[from] MissingInputError),

    /// Issuance precondition failed.
    #[error(transparent)]
    Issuance(#[from] IssuanceStateError),

    /// A response arrived for a request that was never issued.
    #[error("Request {request} was never issued (latest is {latest})")]
    UnknownRequest {
        /// Request of the response.
        request: RequestId,
        /// Latest request issued.
        latest: RequestId,
    },

    /// Validation was requested before any result was applied.
    #[error("No calculation to validate")]
    NothingToValidate,

    /// The inputs belong to a different building.
    #[error("Inputs are for building {found}, session is for {expected}")]
    BuildingMismatch {
        /// Building of the session.
        expected: BuildingId,
        /// Building of the inputs.
        found: BuildingId,
    },
}

impl SessionError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingInput(_) => 424,
            Self::Issuance(IssuanceStateError::AlreadyIssued { .. }) => 409,
            Self::Issuance(_) | Self::NothingToValidate => 422,
            Self::UnknownRequest { .. } | Self::BuildingMismatch { .. } => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::Issuance(IssuanceStateError::NotValidated { .. }) => "NOT_VALIDATED",
            Self::Issuance(IssuanceStateError::ReconciliationFailed { .. }) => {
                "RECONCILIATION_FAILED"
            }
            Self::Issuance(IssuanceStateError::AlreadyIssued { .. }) => "ALREADY_ISSUED",
            Self::Issuance(IssuanceStateError::NotIssued { .. }) => "NOT_ISSUED",
            Self::UnknownRequest { .. } => "UNKNOWN_REQUEST",
            Self::NothingToValidate => "NOTHING_TO_VALIDATE",
            Self::BuildingMismatch { .. } => "BUILDING_MISMATCH",
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingInput(e) => Self::MissingInput(e.to_string()),
            SessionError::Issuance(e @ IssuanceStateError::AlreadyIssued { .. }) => {
                Self::Conflict(e.to_string())
            }
            SessionError::Issuance(e) => Self::BusinessRule(e.to_string()),
            e @ SessionError::NothingToValidate => Self::BusinessRule(e.to_string()),
            e @ (SessionError::UnknownRequest { .. } | SessionError::BuildingMismatch { .. }) => {
                Self::Validation(e.to_string())
            }
        }
    }
}
