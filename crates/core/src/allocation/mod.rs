//! Allocation of category totals, heating, reserve fund and fees across apartments.
//!
//! # Modules
//!
//! - `util` - Largest Remainder Method primitives
//! - `engine` - One amount under one distribution rule
//! - `heating` - Fixed/variable heating split
//! - `reserve` - Reserve-fund accrual and external precedence
//! - `fees` - Flat management fee and balance carry-forward
//! - `edge_case` - Non-fatal fallbacks recorded alongside results

pub mod edge_case;
pub mod engine;
pub mod fees;
pub mod heating;
pub mod reserve;
pub mod util;

#[cfg(test)]
mod props;

pub use edge_case::{AllocationEdgeCase, EdgeCaseRecord};
pub use engine::{AllocationEngine, AllocationOutcome, AllocationRule};
pub use fees::{BalanceCarryForward, FeeAllocation, FeeApplier};
pub use heating::{HeatingShare, HeatingSplit, HeatingSplitter};
pub use reserve::{ReserveAccrual, ReserveFundAccrual, ReserveOverride};
pub use util::{Allocation, AllocationUtil};
