//! Dispatch Metrics
//!
//! Counters for inbound messages, local publishes, and subscriber delivery.
//! Each [`DispatchTable`](crate::protocol::dispatcher::DispatchTable) owns one
//! instance; there is no process-wide collector.
//!
//! Uses atomic counters for thread-safe metrics collection.

use crate::protocol::subscribers::DeliveryReport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for one dispatch table
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Messages handed to `dispatch_incoming`
    pub messages_received: AtomicU64,
    /// Bytes handed to `dispatch_incoming`
    pub bytes_received: AtomicU64,
    /// Values delivered through `publish`
    pub messages_published: AtomicU64,
    /// Successful subscriber invocations
    pub deliveries: AtomicU64,
    /// Subscriber invocations that returned an error or panicked
    pub subscriber_failures: AtomicU64,
    /// Messages dropped for an unregistered group identifier
    pub unknown_groups: AtomicU64,
    /// Messages dropped for an unregistered variant kind
    pub unknown_variants: AtomicU64,
    /// Messages dropped because their fields failed to decode
    pub decode_errors: AtomicU64,
    start_time: Instant,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            messages_published: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            subscriber_failures: AtomicU64::new(0),
            unknown_groups: AtomicU64::new(0),
            unknown_variants: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an inbound message
    pub fn message_received(&self, byte_count: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    /// Record a local publish
    pub fn message_published(&self) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one delivery pass
    pub fn delivery(&self, report: &DeliveryReport) {
        self.deliveries
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.subscriber_failures
            .fetch_add(report.failed as u64, Ordering::Relaxed);
    }

    pub fn unknown_group(&self) {
        self.unknown_groups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unknown_variant(&self) {
        self.unknown_variants.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            subscriber_failures: self.subscriber_failures.load(Ordering::Relaxed),
            unknown_groups: self.unknown_groups.load(Ordering::Relaxed),
            unknown_variants: self.unknown_variants.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            messages_received = snapshot.messages_received,
            bytes_received = snapshot.bytes_received,
            messages_published = snapshot.messages_published,
            deliveries = snapshot.deliveries,
            subscriber_failures = snapshot.subscriber_failures,
            unknown_groups = snapshot.unknown_groups,
            unknown_variants = snapshot.unknown_variants,
            decode_errors = snapshot.decode_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Dispatch metrics snapshot"
        );
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchMetricsSnapshot {
    pub messages_received: u64,
    pub bytes_received: u64,
    pub messages_published: u64,
    pub deliveries: u64,
    pub subscriber_failures: u64,
    pub unknown_groups: u64,
    pub unknown_variants: u64,
    pub decode_errors: u64,
    pub uptime_seconds: u64,
}

impl DispatchMetricsSnapshot {
    /// Inbound messages that were dropped before reaching any subscriber.
    pub fn dropped(&self) -> u64 {
        self.unknown_groups + self.unknown_variants + self.decode_errors
    }
}
