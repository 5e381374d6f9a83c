//! Analysis modules.
//!
//! The aggregator drives the lookups for each mode; `units` holds the
//! integer arithmetic used to turn smallest-unit amounts into decimals.

pub mod aggregator;
pub mod units;

pub use aggregator::{Aggregator, AggregatorConfig};
