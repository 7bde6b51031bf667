//! Submission metrics

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Counters and latency histogram for the submission pipeline
pub struct Metrics {
    registry: Registry,

    pub submissions_total: IntCounter,
    pub submissions_confirmed: IntCounter,
    pub submissions_failed: IntCounter,
    pub simulation_rejections: IntCounter,
    pub already_processed: IntCounter,
    pub lock_rejections: IntCounter,

    pub submission_latency: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions_total = IntCounter::with_opts(Opts::new(
            "fairmint_submissions_total",
            "Total number of submissions started",
        ))?;
        let submissions_confirmed = IntCounter::with_opts(Opts::new(
            "fairmint_submissions_confirmed",
            "Submissions confirmed on the ledger",
        ))?;
        let submissions_failed = IntCounter::with_opts(Opts::new(
            "fairmint_submissions_failed",
            "Submissions that ended in failure",
        ))?;
        let simulation_rejections = IntCounter::with_opts(Opts::new(
            "fairmint_simulation_rejections",
            "Transactions rejected during simulation",
        ))?;
        let already_processed = IntCounter::with_opts(Opts::new(
            "fairmint_already_processed",
            "Send errors reported as already processed",
        ))?;
        let lock_rejections = IntCounter::with_opts(Opts::new(
            "fairmint_lock_rejections",
            "Submissions refused while another was in flight",
        ))?;

        let submission_latency = Histogram::with_opts(
            HistogramOpts::new(
                "fairmint_submission_latency_seconds",
                "Time from simulation to final outcome",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(submissions_confirmed.clone()))?;
        registry.register(Box::new(submissions_failed.clone()))?;
        registry.register(Box::new(simulation_rejections.clone()))?;
        registry.register(Box::new(already_processed.clone()))?;
        registry.register(Box::new(lock_rejections.clone()))?;
        registry.register(Box::new(submission_latency.clone()))?;

        Ok(Self {
            registry,
            submissions_total,
            submissions_confirmed,
            submissions_failed,
            simulation_rejections,
            already_processed,
            lock_rejections,
            submission_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.submissions_total.inc();
        metrics.lock_rejections.inc();
        let text = metrics.render().unwrap();
        assert!(text.contains("fairmint_submissions_total 1"));
        assert!(text.contains("fairmint_lock_rejections 1"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.already_processed.inc();
        assert_eq!(a.already_processed.get(), 1);
        assert_eq!(b.already_processed.get(), 0);
    }
}
