//! Building, apartment and billing-period inputs.

pub mod period;
pub mod types;

pub use period::Period;
pub use types::{Apartment, Building, HeatingSystem, MillsBasis, ReserveFundSettings};
