//! Expense records, meter readings and their aggregation into charge buckets.

pub mod aggregator;
pub mod category;
pub mod types;

pub use aggregator::{
    AggregatedExpenses, BucketTotals, ChargeBucket, ChargeLine, ExpenseAggregator, PayerFilter,
};
pub use category::{CategoryKind, CategoryMap};
pub use types::{DistributionType, Expense, MeterReading, MeterReadings, PayerResponsibility};
