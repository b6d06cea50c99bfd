//! Performance analytics derived from raw engine history.

mod aggregator;

pub use aggregator::{AnalyticsAggregator, AnalyticsReport, SumRecord};
