//! Observability for the scale-out agent
//!
//! Prometheus metrics behind a lightweight cloneable handle; structured
//! logging goes through `tracing` at the call sites.

use prometheus::{register_histogram, register_int_gauge, Histogram, IntGauge};
use std::sync::OnceLock;

/// Histogram buckets for rescaling ratios (a fraction of a window)
const RATIO_BUCKETS: &[f64] = &[0.0, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

/// Inner metrics structure holding the actual Prometheus metrics
struct AgentMetricsInner {
    current_scale_out: IntGauge,
    reports_sent: IntGauge,
    decision_failures: IntGauge,
    scale_requests: IntGauge,
    recommendations_throttled: IntGauge,
    rescaling_time_ratio: Histogram,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            current_scale_out: register_int_gauge!(
                "scaleout_agent_current_scale_out",
                "Worker count the agent currently tracks"
            )
            .expect("Failed to register current_scale_out"),

            reports_sent: register_int_gauge!(
                "scaleout_agent_reports_sent_total",
                "Total number of telemetry reports sent to the decision service"
            )
            .expect("Failed to register reports_sent"),

            decision_failures: register_int_gauge!(
                "scaleout_agent_decision_failures_total",
                "Total number of failed decision-service exchanges"
            )
            .expect("Failed to register decision_failures"),

            scale_requests: register_int_gauge!(
                "scaleout_agent_scale_requests_total",
                "Total number of worker-count requests issued to the host runtime"
            )
            .expect("Failed to register scale_requests"),

            recommendations_throttled: register_int_gauge!(
                "scaleout_agent_recommendations_throttled_total",
                "Total number of recommendations suppressed by the cooldown"
            )
            .expect("Failed to register recommendations_throttled"),

            rescaling_time_ratio: register_histogram!(
                "scaleout_agent_rescaling_time_ratio",
                "Observed rescaling time ratios per evaluated window",
                RATIO_BUCKETS.to_vec()
            )
            .expect("Failed to register rescaling_time_ratio"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Update the tracked worker count
    pub fn set_current_scale_out(&self, scale_out: i64) {
        self.inner().current_scale_out.set(scale_out);
    }

    /// Increment the sent-reports counter
    pub fn inc_reports_sent(&self) {
        self.inner().reports_sent.inc();
    }

    /// Increment the decision-failure counter
    pub fn inc_decision_failures(&self) {
        self.inner().decision_failures.inc();
    }

    /// Increment the issued-scale-request counter
    pub fn inc_scale_requests(&self) {
        self.inner().scale_requests.inc();
    }

    /// Increment the throttled-recommendation counter
    pub fn inc_recommendations_throttled(&self) {
        self.inner().recommendations_throttled.inc();
    }

    /// Record an observed rescaling time ratio
    pub fn observe_rescaling_ratio(&self, ratio: f64) {
        self.inner().rescaling_time_ratio.observe(ratio);
    }
}
