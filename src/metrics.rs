//! Request metrics for the market data client
//!
//! Tracks latency percentiles and success rates per endpoint.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Maximum number of samples to keep per endpoint
const MAX_SAMPLES: usize = 100;

/// Market data endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Markets,
    CoinDetail,
    MarketChart,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Markets => "markets",
            Endpoint::CoinDetail => "coin_detail",
            Endpoint::MarketChart => "market_chart",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Summary for a single endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointMetrics {
    pub endpoint: Endpoint,
    /// 50th percentile latency of successful requests in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful requests in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    pub total_requests: u64,
    pub failed_requests: u64,
}

impl EndpointMetrics {
    /// Creates metrics with no data
    pub fn empty(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Samples {
    /// Rolling window of (latency ms, success)
    window: VecDeque<(f64, bool)>,
    total: u64,
    failed: u64,
}

/// Collects request outcomes
#[derive(Debug, Default)]
pub struct MetricsCollector {
    endpoints: Mutex<HashMap<Endpoint, Samples>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request with its duration and success status
    pub fn record(&self, endpoint: Endpoint, duration: Duration, success: bool) {
        let mut endpoints = self.endpoints.lock().unwrap_or_else(|e| e.into_inner());
        let samples = endpoints.entry(endpoint).or_default();

        samples.total += 1;
        if !success {
            samples.failed += 1;
        }
        if samples.window.len() >= MAX_SAMPLES {
            samples.window.pop_front();
        }
        samples
            .window
            .push_back((duration.as_secs_f64() * 1000.0, success));
    }

    /// Starts timing a request; the outcome is recorded on [`RequestTimer::finish`]
    pub fn start(&self, endpoint: Endpoint) -> RequestTimer<'_> {
        RequestTimer {
            collector: self,
            endpoint,
            start: Instant::now(),
        }
    }

    /// Computes current metrics for one endpoint
    pub fn get(&self, endpoint: Endpoint) -> EndpointMetrics {
        let endpoints = self.endpoints.lock().unwrap_or_else(|e| e.into_inner());
        let Some(samples) = endpoints.get(&endpoint) else {
            return EndpointMetrics::empty(endpoint);
        };

        let mut latencies: Vec<f64> = samples
            .window
            .iter()
            .filter(|(_, success)| *success)
            .map(|(ms, _)| *ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if samples.total > 0 {
            (samples.total - samples.failed) as f64 / samples.total as f64
        } else {
            1.0
        };

        EndpointMetrics {
            endpoint,
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: samples.total,
            failed_requests: samples.failed,
        }
    }

    /// Metrics for every endpoint, in a stable order
    pub fn all(&self) -> Vec<EndpointMetrics> {
        [Endpoint::Markets, Endpoint::CoinDetail, Endpoint::MarketChart]
            .into_iter()
            .map(|endpoint| self.get(endpoint))
            .collect()
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

/// Times one request
pub struct RequestTimer<'a> {
    collector: &'a MetricsCollector,
    endpoint: Endpoint,
    start: Instant,
}

impl RequestTimer<'_> {
    /// Records the elapsed time and outcome, returning the elapsed time
    pub fn finish(self, success: bool) -> Duration {
        let elapsed = self.start.elapsed();
        self.collector.record(self.endpoint, elapsed, success);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector() {
        let collector = MetricsCollector::new();

        collector.record(Endpoint::Markets, Duration::from_millis(100), true);
        collector.record(Endpoint::Markets, Duration::from_millis(200), true);
        collector.record(Endpoint::Markets, Duration::from_millis(150), false);

        let metrics = collector.get(Endpoint::Markets);
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.failed_requests, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
        assert_eq!(metrics.latency_p99_ms, 200.0);

        assert_eq!(
            collector.get(Endpoint::MarketChart),
            EndpointMetrics::empty(Endpoint::MarketChart)
        );
    }

    #[test]
    fn test_window_is_bounded() {
        let collector = MetricsCollector::new();
        for _ in 0..(MAX_SAMPLES + 20) {
            collector.record(Endpoint::CoinDetail, Duration::from_millis(5), true);
        }
        let endpoints = collector.endpoints.lock().unwrap();
        assert_eq!(endpoints[&Endpoint::CoinDetail].window.len(), MAX_SAMPLES);
        assert_eq!(endpoints[&Endpoint::CoinDetail].total, (MAX_SAMPLES + 20) as u64);
    }

    #[test]
    fn test_timer_records_outcome() {
        let collector = MetricsCollector::new();
        collector.start(Endpoint::MarketChart).finish(false);

        let metrics = collector.get(Endpoint::MarketChart);
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.success_rate, 0.0);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 9.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
