//! Asynchronous recalculation on top of a [`CalculationSession`].
//!
//! Each recalculation spawns a fetch on the Tokio runtime and aborts the
//! fetches it supersedes. Finished fetches are collected from a `JoinSet`
//! and handed to the session, which applies the latest and discards the
//! rest. A fetch that panics or is cancelled still yields a response for
//! its request. The caller keeps reading the previous result while fetches
//! are in flight.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, warn};

use super::error::{MissingInputError, SessionError};
use super::service::CalculationSession;
use super::types::{ApplyOutcome, RequestId, SessionKey};
use crate::billing::CalculationInputs;
use crate::building::Period;

type Response = (RequestId, Result<CalculationInputs, MissingInputError>);

/// Collaborator that fetches the inputs of one (building, period).
///
/// Retries and timeouts belong to the implementation; the session only
/// sees the final outcome.
#[async_trait::async_trait]
pub trait InputSource: Send + Sync {
    /// Fetches the inputs for `key` and `period`.
    ///
    /// # Errors
    ///
    /// Returns the input that could not be fetched.
    async fn fetch(
        &self,
        request: RequestId,
        key: &SessionKey,
        period: &Period,
    ) -> Result<CalculationInputs, MissingInputError>;
}

/// Runs fetches for a session and applies their responses.
pub struct SessionDriver<S> {
    session: CalculationSession,
    source: Arc<S>,
    fetches: JoinSet<Response>,
    requests: HashMap<task::Id, RequestId>,
}

impl<S: InputSource + 'static> SessionDriver<S> {
    /// Wraps a session and the source its inputs come from.
    #[must_use]
    pub fn new(session: CalculationSession, source: Arc<S>) -> Self {
        Self {
            session,
            source,
            fetches: JoinSet::new(),
            requests: HashMap::new(),
        }
    }

    /// Requests a recalculation and starts fetching its inputs.
    ///
    /// Returns immediately. Fetches still running for earlier requests are
    /// aborted; their responses are reported as superseded.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn recalculate(&mut self) -> Result<RequestId, SessionError> {
        let request = self.session.request_recalculation()?;
        self.fetches.abort_all();

        let source = Arc::clone(&self.source);
        let key = self.session.key().clone();
        let period = self.session.period().clone();
        let handle = self.fetches.spawn(async move {
            let response = source.fetch(request, &key, &period).await;
            (request, response)
        });
        self.requests.insert(handle.id(), request);

        debug!(
            session = %self.session.key(),
            %request,
            in_flight = self.fetches.len(),
            "Fetch started"
        );
        Ok(request)
    }

    /// Applies every fetch that has already finished, without waiting.
    pub fn poll(&mut self) -> Vec<Result<ApplyOutcome, SessionError>> {
        let mut outcomes = Vec::new();
        while let Some(joined) = self.fetches.try_join_next_with_id() {
            outcomes.push(self.receive(joined));
        }
        outcomes
    }

    /// Waits for every outstanding fetch and applies the responses in
    /// completion order.
    pub async fn settle(&mut self) -> Vec<Result<ApplyOutcome, SessionError>> {
        let mut outcomes = Vec::new();
        while let Some(joined) = self.fetches.join_next_with_id().await {
            outcomes.push(self.receive(joined));
        }
        outcomes
    }

    fn receive(
        &mut self,
        joined: Result<(task::Id, Response), JoinError>,
    ) -> Result<ApplyOutcome, SessionError> {
        let (request, response) = match joined {
            Ok((id, response)) => {
                self.requests.remove(&id);
                response
            }
            Err(err) => {
                // An untracked task maps to request #0, which the session rejects.
                let request = self.requests.remove(&err.id()).unwrap_or_default();
                let reason = if err.is_cancelled() {
                    "superseded fetch was cancelled"
                } else {
                    "fetch task panicked"
                };
                if err.is_panic() {
                    warn!(session = %self.session.key(), %request, reason, "Fetch aborted");
                }
                let aborted = MissingInputError::FetchAborted {
                    reason: reason.to_string(),
                };
                (request, Err(aborted))
            }
        };
        self.session.apply(request, response)
    }

    /// Number of fetches not yet collected.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.fetches.len()
    }

    /// The driven session.
    #[must_use]
    pub fn session(&self) -> &CalculationSession {
        &self.session
    }

    /// The driven session, for validation and issuance.
    pub fn session_mut(&mut self) -> &mut CalculationSession {
        &mut self.session
    }

    /// Stops driving and returns the session. Outstanding fetches are
    /// aborted.
    #[must_use]
    pub fn into_session(self) -> CalculationSession {
        self.session
    }
}
