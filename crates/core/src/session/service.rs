//! Calculation session for one (building, period).
//!
//! The session owns its share set and reconciliation result. Every
//! recalculation request gets a new [`RequestId`]; only the response to the
//! latest request is applied, and responses to older requests are dropped
//! whether they succeeded or failed. Issuance freezes the current result
//! into an [`IssuedSnapshot`] and is a one-way transition.

use chrono::Utc;
use commonfee_shared::EngineConfig;
use commonfee_shared::types::{BuildingId, SessionId};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{IssuanceStateError, MissingInputError, SessionError};
use super::types::{ApplyOutcome, IssuedSnapshot, RequestId, SessionKey, SessionStatus};
use crate::billing::{Calculation, CalculationInputs, CalculationPipeline, Share};
use crate::building::Period;
use crate::expense::CategoryMap;
use crate::reconciliation::{ReconciliationResult, ReconciliationValidator};

/// Drives the Draft → Validated → Issued lifecycle of one period.
#[derive(Debug, Clone)]
pub struct CalculationSession {
    id: SessionId,
    key: SessionKey,
    period: Period,
    version: u32,
    status: SessionStatus,
    pipeline: CalculationPipeline,
    validator: ReconciliationValidator,
    latest_request: RequestId,
    applied_request: Option<RequestId>,
    calculation: Option<Calculation>,
    reconciliation: ReconciliationResult,
    last_error: Option<MissingInputError>,
    snapshot: Option<Arc<IssuedSnapshot>>,
}

impl CalculationSession {
    /// Opens a Draft session with no result.
    #[must_use]
    pub fn new(building_id: BuildingId, period: Period, config: &EngineConfig) -> Self {
        Self {
            id: SessionId::new(),
            key: SessionKey::new(building_id, &period),
            period,
            version: 1,
            status: SessionStatus::Draft,
            pipeline: CalculationPipeline::new(config),
            validator: ReconciliationValidator::from_config(config),
            latest_request: RequestId::default(),
            applied_request: None,
            calculation: None,
            reconciliation: ReconciliationResult::unvalidated(),
            last_error: None,
            snapshot: None,
        }
    }

    /// Replaces the category mapping table used by the pipeline.
    #[must_use]
    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.pipeline = self.pipeline.with_categories(categories);
        self
    }

    /// Starts a recalculation and returns the tag its response must carry.
    ///
    /// The session returns to Draft; the previous result stays readable
    /// until the response is applied.
    pub fn request_recalculation(&mut self) -> Result<RequestId, SessionError> {
        self.ensure_not_issued()?;

        self.latest_request = self.latest_request.next();
        self.status = SessionStatus::Draft;
        info!(session = %self.key, request = %self.latest_request, "Recalculation requested");
        Ok(self.latest_request)
    }

    /// Applies the fetched inputs of `request`.
    ///
    /// A response to anything but the latest request is discarded. A failed
    /// latest response keeps the previous result and is returned as an
    /// error. A successful one is computed, validated and made visible.
    pub fn apply(
        &mut self,
        request: RequestId,
        inputs: Result<CalculationInputs, MissingInputError>,
    ) -> Result<ApplyOutcome, SessionError> {
        if request > self.latest_request || request == RequestId::default() {
            return Err(SessionError::UnknownRequest {
                request,
                latest: self.latest_request,
            });
        }
        if request < self.latest_request
            || self.applied_request == Some(request)
            || self.status.is_immutable()
        {
            info!(
                session = %self.key,
                %request,
                latest = %self.latest_request,
                "Discarding superseded response"
            );
            return Ok(ApplyOutcome::Superseded {
                request,
                latest: self.latest_request,
            });
        }

        let inputs = match inputs.and_then(Self::check_inputs) {
            Ok(inputs) => inputs,
            Err(err) => {
                warn!(
                    session = %self.key,
                    %request,
                    input = err.input(),
                    error = %err,
                    "Recalculation failed"
                );
                self.last_error = Some(err.clone());
                return Err(err.into());
            }
        };
        if inputs.building.id != self.key.building_id {
            return Err(SessionError::BuildingMismatch {
                expected: self.key.building_id,
                found: inputs.building.id,
            });
        }

        self.calculation = Some(self.pipeline.compute(&inputs, &self.period));
        self.applied_request = Some(request);
        self.last_error = None;
        info!(session = %self.key, %request, "Recalculation applied");

        let reconciliation = self.validate()?.status;
        Ok(ApplyOutcome::Applied {
            request,
            reconciliation,
        })
    }

    /// Requests and applies a recalculation in one step.
    pub fn recalculate_now(
        &mut self,
        inputs: Result<CalculationInputs, MissingInputError>,
    ) -> Result<ApplyOutcome, SessionError> {
        let request = self.request_recalculation()?;
        self.apply(request, inputs)
    }

    /// Re-runs reconciliation on the current result.
    ///
    /// The session becomes Validated whatever the verdict; issuance checks
    /// the verdict separately. An issued session keeps its frozen result.
    pub fn validate(&mut self) -> Result<&ReconciliationResult, SessionError> {
        if self.status.is_immutable() {
            return Ok(&self.reconciliation);
        }
        let calculation = self
            .calculation
            .as_ref()
            .ok_or(SessionError::NothingToValidate)?;

        self.reconciliation = self.validator.validate(calculation);
        if self.applied_request == Some(self.latest_request) {
            self.status = SessionStatus::Validated;
        }
        info!(
            session = %self.key,
            status = %self.status,
            reconciliation = %self.reconciliation.status,
            "Session validated"
        );
        Ok(&self.reconciliation)
    }

    /// Freezes the current result.
    ///
    /// Requires a Validated session with a valid reconciliation. On failure
    /// the session is left unchanged.
    pub fn issue(&mut self) -> Result<Arc<IssuedSnapshot>, SessionError> {
        match self.status {
            SessionStatus::Issued => {
                return Err(IssuanceStateError::AlreadyIssued {
                    version: self.version,
                }
                .into());
            }
            SessionStatus::Draft => {
                return Err(IssuanceStateError::NotValidated {
                    status: self.status,
                }
                .into());
            }
            SessionStatus::Validated => {}
        }
        if !self.reconciliation.is_valid {
            warn!(
                session = %self.key,
                errors = self.reconciliation.errors.len(),
                "Issuance refused"
            );
            return Err(IssuanceStateError::ReconciliationFailed {
                errors: self.reconciliation.errors.len(),
            }
            .into());
        }
        let calculation = self
            .calculation
            .clone()
            .ok_or(SessionError::NothingToValidate)?;

        let snapshot = Arc::new(IssuedSnapshot {
            session_id: self.id,
            key: self.key.clone(),
            version: self.version,
            calculation,
            reconciliation: self.reconciliation.clone(),
            issued_at: Utc::now(),
        });
        self.snapshot = Some(Arc::clone(&snapshot));
        self.status = SessionStatus::Issued;
        info!(session = %self.key, version = self.version, "Session issued");
        Ok(snapshot)
    }

    /// Opens the next version of an issued session, in Draft.
    ///
    /// The issued session and its snapshot are left untouched.
    pub fn successor(&self) -> Result<Self, SessionError> {
        if !self.status.is_immutable() {
            return Err(IssuanceStateError::NotIssued {
                status: self.status,
            }
            .into());
        }

        let next = Self {
            id: SessionId::new(),
            key: self.key.clone(),
            period: self.period.clone(),
            version: self.version + 1,
            status: SessionStatus::Draft,
            pipeline: self.pipeline.clone(),
            validator: self.validator,
            latest_request: RequestId::default(),
            applied_request: None,
            calculation: self.calculation.clone(),
            reconciliation: ReconciliationResult::unvalidated(),
            last_error: None,
            snapshot: None,
        };
        info!(session = %self.key, version = next.version, "Successor session opened");
        Ok(next)
    }

    fn ensure_not_issued(&self) -> Result<(), SessionError> {
        if self.status.is_immutable() {
            return Err(IssuanceStateError::AlreadyIssued {
                version: self.version,
            }
            .into());
        }
        Ok(())
    }

    fn check_inputs(inputs: CalculationInputs) -> Result<CalculationInputs, MissingInputError> {
        if inputs.apartments.is_empty() {
            return Err(MissingInputError::EmptyApartmentRegistry);
        }
        Ok(inputs)
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Building and period.
    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Period computed.
    #[must_use]
    pub fn period(&self) -> &Period {
        &self.period
    }

    /// Issuance version, starting at 1.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Latest request issued.
    #[must_use]
    pub fn latest_request(&self) -> RequestId {
        self.latest_request
    }

    /// Request whose response is currently visible.
    #[must_use]
    pub fn applied_request(&self) -> Option<RequestId> {
        self.applied_request
    }

    /// True while the latest request has no applied response.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.latest_request != RequestId::default()
            && self.applied_request != Some(self.latest_request)
    }

    /// Visible calculation, if any.
    #[must_use]
    pub fn calculation(&self) -> Option<&Calculation> {
        self.calculation.as_ref()
    }

    /// Visible shares; empty before the first applied response.
    #[must_use]
    pub fn shares(&self) -> &[Share] {
        self.calculation.as_ref().map_or(&[], |c| c.shares.as_slice())
    }

    /// Last reconciliation verdict.
    #[must_use]
    pub fn reconciliation(&self) -> &ReconciliationResult {
        &self.reconciliation
    }

    /// Failure of the latest request, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&MissingInputError> {
        self.last_error.as_ref()
    }

    /// Snapshot taken at issuance.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<IssuedSnapshot>> {
        self.snapshot.clone()
    }
}
