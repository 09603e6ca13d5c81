//! Performance reporting: per-request metrics collection and the
//! dashboard that visualizes them.

mod collector;
mod dashboard;

pub use collector::{
    BucketCount, Collector, DataPoint, LogEntry, LogLevel, Report, RequestMetric,
};
pub use dashboard::DASHBOARD_HTML;
