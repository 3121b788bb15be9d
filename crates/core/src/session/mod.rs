//! Calculation session lifecycle.
//!
//! # Modules
//!
//! - `types` - Status, request ids and issued snapshots
//! - `error` - Missing-input and issuance errors
//! - `service` - Supersession and Draft → Validated → Issued transitions
//! - `driver` - Async fetch-and-apply loop

pub mod driver;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use driver::{InputSource, SessionDriver};
pub use error::{IssuanceStateError, MissingInputError, SessionError};
pub use service::CalculationSession;
pub use types::{ApplyOutcome, IssuedSnapshot, RequestId, SessionKey, SessionStatus};
