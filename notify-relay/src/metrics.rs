//! Prometheus Metrics
//!
//! Counters and histograms for the relay, kept in a private registry so
//! that independent instances (one per test) do not collide.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use tracing::warn;

/// Relay metrics. Cheap to clone; clones share the same series.
#[derive(Clone)]
pub struct RelayMetrics {
    registry: Registry,
    /// Send requests received (after rate limiting).
    pub requests_total: IntCounter,
    /// Messages accepted by the provider.
    pub messages_sent: IntCounter,
    /// Requests rejected for missing fields.
    pub validation_failures: IntCounter,
    /// Messages rejected by the provider.
    pub provider_failures: IntCounter,
    /// Timeouts, transport errors and other internal failures.
    pub internal_failures: IntCounter,
    /// Requests refused by the rate limiter.
    pub rate_limited: IntCounter,
    /// Round-trip time of provider calls.
    pub provider_latency: Histogram,
}

impl RelayMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| {
            let c = IntCounter::new(name, help).expect("valid counter definition");
            registry
                .register(Box::new(c.clone()))
                .expect("counter registered once");
            c
        };

        let requests_total = counter("relay_requests_total", "Send requests received");
        let messages_sent = counter(
            "relay_messages_sent_total",
            "Messages accepted by the provider",
        );
        let validation_failures = counter(
            "relay_validation_failures_total",
            "Requests rejected for missing fields",
        );
        let provider_failures = counter(
            "relay_provider_failures_total",
            "Messages rejected by the provider",
        );
        let internal_failures = counter(
            "relay_internal_failures_total",
            "Requests failed with an internal error",
        );
        let rate_limited = counter(
            "relay_rate_limited_total",
            "Requests refused by the rate limiter",
        );

        let provider_latency = Histogram::with_opts(
            HistogramOpts::new(
                "relay_provider_latency_seconds",
                "Round-trip time of provider calls",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )
        .expect("valid histogram definition");
        registry
            .register(Box::new(provider_latency.clone()))
            .expect("histogram registered once");

        RelayMetrics {
            registry,
            requests_total,
            messages_sent,
            validation_failures,
            provider_failures,
            internal_failures,
            rate_limited,
            provider_latency,
        }
    }

    /// Renders all metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
