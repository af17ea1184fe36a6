//! Metrics definitions for the pagination engine.
//!
//! Metrics are collected using the `metrics` crate. Without an installed
//! recorder every call is a no-op, so library users opt in by installing
//! one (e.g. a Prometheus exporter) in their binary.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "pages_served_total",
        "Total number of pages returned by the pagination engine"
    );
    describe_counter!(
        "cursor_not_found_total",
        "Total number of requests whose cursor no longer resolved"
    );
    describe_histogram!(
        "page_fetch_duration_seconds",
        "Time taken to resolve, query and count one page in seconds"
    );
}

/// Record a page handed back to a caller.
///
/// # Arguments
/// * `collection` - The collection paged through
/// * `travel` - `"first"`, `"forward"` or `"backward"`
pub fn record_page_served(collection: &'static str, travel: &'static str) {
    counter!("pages_served_total", "collection" => collection, "travel" => travel).increment(1);
}

/// Record a cursor that did not resolve to a record.
pub fn record_cursor_not_found(collection: &'static str) {
    counter!("cursor_not_found_total", "collection" => collection).increment(1);
}

/// A timer that records the page fetch duration when dropped.
pub struct PageTimer {
    collection: &'static str,
    start: Instant,
}

impl PageTimer {
    /// Start a new page timer.
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            start: Instant::now(),
        }
    }
}

impl Drop for PageTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        histogram!("page_fetch_duration_seconds", "collection" => self.collection).record(duration);
    }
}
