//! Property-based tests for CalculationSession.
//!
//! - Only the latest request's response is ever visible
//! - Issuance never succeeds on an invalid result and never twice

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::{MissingInputError, SessionError};
use super::service::CalculationSession;
use super::types::{RequestId, SessionStatus};
use crate::billing::CalculationInputs;
use crate::billing::fixtures::{building_id, march, two_apartment_inputs};
use crate::expense::DistributionType;
use commonfee_shared::EngineConfig;
use commonfee_shared::types::ApartmentId;
use std::collections::BTreeSet;

fn session() -> CalculationSession {
    CalculationSession::new(building_id(), march(), &EngineConfig::default())
}

/// Inputs billing `n × 10`.
fn inputs_for(request: RequestId) -> CalculationInputs {
    let mut inputs = two_apartment_inputs();
    inputs.expenses[0].amount = Decimal::from(request.0 * 10);
    inputs
}

/// Strategy for a request count and an arrival order of their responses.
fn arrival_order() -> impl Strategy<Value = Vec<u64>> {
    (1u64..8).prop_flat_map(|n| Just((1..=n).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Whatever the arrival order, the visible result is the latest request's.
    #[test]
    fn prop_latest_request_wins(order in arrival_order()) {
        let mut session = session();
        let mut issued = Vec::new();
        for _ in 0..order.len() {
            issued.push(session.request_recalculation().unwrap());
        }
        let latest = *issued.last().unwrap();

        for n in &order {
            let request = RequestId(*n);
            let outcome = session.apply(request, Ok(inputs_for(request))).unwrap();
            prop_assert_eq!(outcome.is_applied(), request == latest);
        }

        prop_assert_eq!(session.applied_request(), Some(latest));
        prop_assert_eq!(session.status(), SessionStatus::Validated);
        prop_assert_eq!(
            session.calculation().unwrap().share_total(),
            Decimal::from(latest.0 * 10)
        );
    }

    /// A failed latest response is never masked by a stale success.
    #[test]
    fn prop_failed_latest_not_masked(order in arrival_order()) {
        let mut session = session();
        for _ in 0..order.len() {
            session.request_recalculation().unwrap();
        }
        let latest = session.latest_request();

        for n in &order {
            let request = RequestId(*n);
            let response = if request == latest {
                Err(MissingInputError::ApartmentRegistry { reason: "down".to_string() })
            } else {
                Ok(inputs_for(request))
            };
            let _ = session.apply(request, response);
        }

        prop_assert!(session.calculation().is_none());
        prop_assert_eq!(session.status(), SessionStatus::Draft);
        prop_assert!(session.last_error().is_some());
    }

    /// Issuance requires a valid result and happens at most once.
    #[test]
    fn prop_issuance_at_most_once(
        amount_cents in 100i64..10_000_000,
        unallocatable in any::<bool>(),
        attempts in 1usize..5,
    ) {
        let mut session = session();
        let mut inputs = two_apartment_inputs();
        inputs.expenses[0].amount = Decimal::new(amount_cents, 2);
        if unallocatable {
            inputs.expenses[0].distribution = DistributionType::SpecificApartments {
                apartments: BTreeSet::from([ApartmentId::from_u128(99)]),
            };
        }
        session.recalculate_now(Ok(inputs)).unwrap();

        let mut successes = 0;
        for _ in 0..attempts {
            match session.issue() {
                Ok(_) => successes += 1,
                Err(SessionError::Issuance(_)) => {}
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }

        if unallocatable {
            prop_assert_eq!(successes, 0);
            prop_assert_eq!(session.status(), SessionStatus::Validated);
        } else {
            prop_assert_eq!(successes, 1);
            prop_assert_eq!(session.status(), SessionStatus::Issued);
        }
    }
}
