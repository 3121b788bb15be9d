//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{Currency, MAX_DECIMAL_PLACES, minor_unit, round_money, within_tolerance};
