//! Reconciliation of independently computed totals.
//!
//! # Modules
//!
//! - `types` - Status, issues and result
//! - `validator` - Cross-checks a calculation

pub mod types;
pub mod validator;

#[cfg(test)]
mod validator_props;

pub use types::{
    ReconciliationCheck, ReconciliationIssue, ReconciliationResult, ReconciliationStatus,
};
pub use validator::ReconciliationValidator;
