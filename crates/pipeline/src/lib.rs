//! Report aggregation over a capture store.
//!
//! [`ReportAggregator`] fans a session out into one task per catalog view,
//! bounded by a semaphore, and gathers the per-view results back into
//! catalog order.

pub mod aggregator;

pub use aggregator::{default_concurrency, load_analysis_config, ReportAggregator};
