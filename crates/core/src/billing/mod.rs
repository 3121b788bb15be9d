//! Per-apartment share calculation.
//!
//! # Modules
//!
//! - `types` - Inputs, share breakdown and calculation result
//! - `pipeline` - Runs aggregation and allocation for one period

pub mod pipeline;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use pipeline::CalculationPipeline;
pub use types::{
    Breakdown, Calculation, CalculationInputs, CalculationTotals, ExternalSummary, Share,
};
