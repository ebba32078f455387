//! Observability shell (spec §4.H): per-endpoint request/error counters and
//! a bounded duration-sample ring buffer, plus the health view body.
//!
//! Guarded the way spec §5 "Shared mutable state" prescribes: one entry per
//! endpoint label in a [`DashMap`], each entry's mutable fields (counters,
//! sample buffer) behind its own [`parking_lot::Mutex`] — no lock is ever
//! held across an `.await`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

/// Per-endpoint duration samples never grow past this (spec §4.H, §8
/// property #10).
const MAX_SAMPLES: usize = 1_000;

#[derive(Default)]
struct EndpointMetrics {
    requests: AtomicU64,
    errors: AtomicU64,
    /// Millisecond samples, oldest evicted first once the buffer is full.
    durations_ms: Mutex<Vec<u64>>,
}

impl EndpointMetrics {
    fn record(&self, duration: Duration, is_error: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        let mut samples = self.durations_ms.lock();
        if samples.len() >= MAX_SAMPLES {
            samples.remove(0);
        }
        samples.push(duration.as_millis() as u64);
    }

    fn snapshot(&self) -> EndpointSnapshot {
        let samples = self.durations_ms.lock();
        EndpointSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            sample_count: samples.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub sample_count: usize,
}

/// Process-wide metrics aggregator (spec §9 "Global mutable state"):
/// initialized once at startup, held by the observability shell, never
/// replaced.
#[derive(Default)]
pub struct MetricsRegistry {
    endpoints: DashMap<&'static str, EndpointMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, endpoint: &'static str, duration: Duration, status: u16) {
        let is_error = !(200..300).contains(&status);
        self.endpoints
            .entry(endpoint)
            .or_default()
            .record(duration, is_error);
    }

    pub fn snapshot(&self, endpoint: &'static str) -> Option<EndpointSnapshot> {
        self.endpoints.get(endpoint).map(|e| e.snapshot())
    }

    pub fn active_endpoints(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.endpoints.iter().map(|e| *e.key()).collect();
        names.sort_unstable();
        names
    }

    pub fn summary(&self) -> Vec<(&'static str, EndpointSnapshot)> {
        self.active_endpoints()
            .into_iter()
            .filter_map(|name| self.snapshot(name).map(|s| (name, s)))
            .collect()
    }
}

/// Health view body (spec §4.H): `{status, version, metrics summary, active
/// endpoints, security enabled}`.
#[derive(Debug, Serialize)]
pub struct HealthView {
    pub status: &'static str,
    pub version: &'static str,
    pub metrics: Vec<EndpointMetricsEntry>,
    pub active_endpoints: Vec<&'static str>,
    pub security_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct EndpointMetricsEntry {
    pub endpoint: &'static str,
    pub requests: u64,
    pub errors: u64,
    pub sample_count: usize,
}

impl HealthView {
    pub fn build(registry: &MetricsRegistry, security_enabled: bool) -> Self {
        let metrics = registry
            .summary()
            .into_iter()
            .map(|(endpoint, s)| EndpointMetricsEntry {
                endpoint,
                requests: s.requests,
                errors: s.errors,
                sample_count: s.sample_count,
            })
            .collect();
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            metrics,
            active_endpoints: registry.active_endpoints(),
            security_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_requests_and_errors_separately() {
        let registry = MetricsRegistry::new();
        registry.record("runQuery", Duration::from_millis(5), 200);
        registry.record("runQuery", Duration::from_millis(7), 500);
        let snap = registry.snapshot("runQuery").unwrap();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.sample_count, 2);
    }

    #[test]
    fn duration_buffer_never_exceeds_cap() {
        let registry = MetricsRegistry::new();
        for _ in 0..(MAX_SAMPLES + 50) {
            registry.record("runQuery", Duration::from_millis(1), 200);
        }
        let snap = registry.snapshot("runQuery").unwrap();
        assert_eq!(snap.sample_count, MAX_SAMPLES);
        assert_eq!(snap.requests, (MAX_SAMPLES + 50) as u64);
    }

    #[test]
    fn health_view_lists_active_endpoints() {
        let registry = MetricsRegistry::new();
        registry.record("runQuery", Duration::from_millis(1), 200);
        registry.record("createDocument", Duration::from_millis(1), 201);
        let health = HealthView::build(&registry, true);
        assert_eq!(health.status, "ok");
        assert_eq!(health.active_endpoints, vec!["createDocument", "runQuery"]);
        assert!(health.security_enabled);
    }
}
