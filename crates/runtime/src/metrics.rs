//! Metrics instrumentation for the planning loop and decision client.

use std::time::Instant;

/// Record decision function latency.
pub fn record_decision_latency(duration_ms: f64) {
    metrics::histogram!("decision_latency", duration_ms);
}

/// Record how many decisions one turn needed.
pub fn record_turn_iterations(iterations: usize) {
    metrics::histogram!("turn_iterations", iterations as f64);
}

/// Increment the tool cache hit counter.
pub fn increment_cache_hits() {
    metrics::counter!("tool_cache_hits", 1);
}

/// RAII timer; hands the elapsed milliseconds to `record` on drop.
pub struct MetricTimer {
    start: Instant,
    record: fn(f64),
}

impl MetricTimer {
    pub fn new(record: fn(f64)) -> Self {
        Self {
            start: Instant::now(),
            record,
        }
    }
}

impl Drop for MetricTimer {
    fn drop(&mut self) {
        (self.record)(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}
