//! # Utility Modules
//!
//! Supporting utilities for logging and observability.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup driven by [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: Thread-safe dispatch counters owned by each dispatch table

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{DispatchMetrics, DispatchMetricsSnapshot};
