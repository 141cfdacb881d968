//! Request metrics: how each question was resolved and how long it took.

use std::collections::VecDeque;
use std::time::Duration;

use crate::pipeline::Outcome;

/// Number of most recent latencies kept for averages and percentiles.
pub const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Collects runtime metrics for the `/ask` endpoint.
///
/// Counters cover the whole process lifetime; latency figures cover the
/// last [`MAX_LATENCY_SAMPLES`] requests.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    ask_latencies_us: VecDeque<f64>,
    total_asks: u64,
    rejected: u64,
    out_of_scope: u64,
    no_match: u64,
    below_threshold: u64,
    answered: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed question with its outcome and duration.
    pub fn record_ask(&mut self, outcome: Outcome, duration: Duration) {
        self.total_asks += 1;
        if self.ask_latencies_us.len() == MAX_LATENCY_SAMPLES {
            self.ask_latencies_us.pop_front();
        }
        self.ask_latencies_us.push_back(duration.as_micros() as f64);
        match outcome {
            Outcome::OutOfScope => self.out_of_scope += 1,
            Outcome::NoMatch => self.no_match += 1,
            Outcome::BelowThreshold => self.below_threshold += 1,
            Outcome::Answered => self.answered += 1,
        }
    }

    /// Record a request refused before the pipeline ran (empty query).
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    pub fn total_asks(&self) -> u64 {
        self.total_asks
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn out_of_scope(&self) -> u64 {
        self.out_of_scope
    }

    pub fn no_match(&self) -> u64 {
        self.no_match
    }

    pub fn below_threshold(&self) -> u64 {
        self.below_threshold
    }

    pub fn answered(&self) -> u64 {
        self.answered
    }

    /// Number of latencies currently in the window.
    pub fn latency_samples(&self) -> usize {
        self.ask_latencies_us.len()
    }

    /// Average latency in microseconds.
    pub fn avg_latency_us(&self) -> f64 {
        if self.ask_latencies_us.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.ask_latencies_us.iter().sum();
        sum / self.ask_latencies_us.len() as f64
    }

    /// Latency percentile in microseconds (e.g. 50.0, 95.0, 99.0).
    pub fn percentile_latency_us(&self, percentile: f64) -> f64 {
        if self.ask_latencies_us.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.ask_latencies_us.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[index.min(sorted.len() - 1)]
    }
}
