//! Request metrics and statistics tracking for the prediction API.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile estimates
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for served requests
pub struct ServiceMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Rejected or failed predictions
    pub predictions_failed: AtomicU64,
    /// Predictions by class label
    predictions_by_class: RwLock<BTreeMap<String, u64>>,
    /// Failures by error kind
    errors_by_kind: RwLock<BTreeMap<&'static str, u64>>,
    /// Pipeline latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Confidence distribution buckets
    confidence_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            predictions_by_class: RwLock::new(BTreeMap::new()),
            errors_by_kind: RwLock::new(BTreeMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            confidence_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, class: &str, confidence: f64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);

        if let Ok(mut by_class) = self.predictions_by_class.write() {
            *by_class.entry(class.to_string()).or_insert(0) += 1;
        }

        let bucket = (confidence.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.confidence_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a rejected or failed prediction
    pub fn record_failure(&self, latency: Duration, kind: &'static str) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);

        if let Ok(mut by_kind) = self.errors_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }
    }

    fn record_latency(&self, latency: Duration) {
        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_requests() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.predictions_served.load(Ordering::Relaxed)
            + self.predictions_failed.load(Ordering::Relaxed)
    }

    /// Get confidence distribution
    pub fn get_confidence_distribution(&self) -> [u64; 10] {
        self.confidence_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    /// Get predictions by class
    pub fn get_predictions_by_class(&self) -> BTreeMap<String, u64> {
        self.predictions_by_class
            .read()
            .map(|by_class| by_class.clone())
            .unwrap_or_default()
    }

    /// Get failures by error kind
    pub fn get_errors_by_kind(&self) -> BTreeMap<&'static str, u64> {
        self.errors_by_kind
            .read()
            .map(|by_kind| by_kind.clone())
            .unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.predictions_failed.load(Ordering::Relaxed);
        let total = served + failed;
        let failure_rate = if total > 0 {
            (failed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let latency = self.get_latency_stats();
        let throughput = self.get_throughput();

        info!("==================== PREDICTION API METRICS ====================");
        info!(
            "Requests: {:>8}  served: {:>8}  failed: {:>6} ({:.1}%)  rate: {:.2} req/s",
            total, served, failed, failure_rate, throughput
        );
        info!(
            "Latency (us): mean={} p50={} p95={} p99={} max={}",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us, latency.max_us
        );

        let by_class = self.get_predictions_by_class();
        if !by_class.is_empty() {
            info!("Predictions by class:");
            for (class, count) in &by_class {
                let pct = (*count as f64 / served.max(1) as f64) * 100.0;
                info!("  {:22} {:>8} ({:>5.1}%)", class, count, pct);
            }
        }

        let by_kind = self.get_errors_by_kind();
        if !by_kind.is_empty() {
            info!("Failures by kind:");
            for (kind, count) in &by_kind {
                info!("  {:22} {:>8}", kind, count);
            }
        }

        let dist = self.get_confidence_distribution();
        let dist_total: u64 = dist.iter().sum();
        if dist_total > 0 {
            info!("Confidence distribution:");
            for (i, &count) in dist.iter().enumerate() {
                let pct = (count as f64 / dist_total as f64) * 100.0;
                let bar = "#".repeat(((pct / 5.0) as usize).min(20));
                info!(
                    "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct,
                    bar
                );
            }
        }
        info!("================================================================");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if self.metrics.total_requests() > 0 {
                self.metrics.print_summary();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), "Normal_Weight", 0.91);
        metrics.record_prediction(Duration::from_micros(300), "Normal_Weight", 0.55);
        metrics.record_prediction(Duration::from_micros(200), "Obesity_Type_I", 1.0);
        metrics.record_failure(Duration::from_micros(50), "missing_field");

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.predictions_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_requests(), 4);
        assert_eq!(metrics.get_predictions_by_class()["Normal_Weight"], 2);
        assert_eq!(metrics.get_errors_by_kind()["missing_field"], 1);

        let dist = metrics.get_confidence_distribution();
        assert_eq!(dist[9], 2);
        assert_eq!(dist[5], 1);
    }

    #[test]
    fn test_latency_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_latency_stats(), LatencyStats::default());

        for us in 1..=100 {
            metrics.record_prediction(Duration::from_micros(us), "Normal_Weight", 0.5);
        }

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 100);
        assert_eq!(stats.max_us, 100);
        assert_eq!(stats.p50_us, 51);
        assert_eq!(stats.p99_us, 100);
    }
}
