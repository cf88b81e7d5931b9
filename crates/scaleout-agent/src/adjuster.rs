//! Throttled scale adjustment
//!
//! Turns a recommended worker count into an actual request against the host
//! runtime, rate-limited by a cooldown so short-lived jobs cannot thrash the
//! cluster.

use crate::host::WorkerManager;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of applying a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Recommendation equals the current count; nothing to do.
    Unchanged,
    /// A differing recommendation arrived inside the cooldown window.
    Throttled { remaining: Duration },
    /// A request for `scale_out` total workers went out to the host runtime.
    Requested { scale_out: u32, acknowledged: bool },
}

/// Cooldown-throttled scale-adjustment state machine.
#[derive(Debug)]
pub struct ScaleAdjuster {
    cooldown: Duration,
    last_adjustment: Option<Instant>,
}

impl ScaleAdjuster {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_adjustment: None,
        }
    }

    /// Arm the cooldown as if an adjustment had just happened.
    ///
    /// Called once at application start so the initial worker request and an
    /// immediately following recommendation cannot double-fire.
    pub fn restart_cooldown(&mut self) {
        self.last_adjustment = Some(Instant::now());
    }

    /// Apply a recommendation against the current count.
    ///
    /// An equal count skips without touching the timer. Inside the cooldown
    /// the request is suppressed and the timer is deliberately *not* reset,
    /// so a burst of recommendations cannot push the next legitimate
    /// adjustment further and further out. Otherwise the request is sent and
    /// the timer restarts regardless of the acknowledgement outcome — the
    /// acknowledgement only confirms receipt, not completion.
    pub async fn apply(
        &mut self,
        recommended: u32,
        current: u32,
        manager: &dyn WorkerManager,
    ) -> ScaleDecision {
        if recommended == current {
            debug!(scale_out = current, "recommendation matches current scale-out");
            return ScaleDecision::Unchanged;
        }

        if let Some(last) = self.last_adjustment {
            let elapsed = last.elapsed();
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                info!(
                    recommended,
                    current,
                    remaining_ms = remaining.as_millis() as u64,
                    "suppressing scale request inside cooldown"
                );
                return ScaleDecision::Throttled { remaining };
            }
        }

        self.last_adjustment = Some(Instant::now());
        let acknowledged = match manager.request_total_workers(recommended).await {
            Ok(acknowledged) => acknowledged,
            Err(error) => {
                warn!(recommended, error = %error, "worker-count request failed");
                false
            }
        };
        if acknowledged {
            info!(recommended, current, "requested new total worker count");
        } else {
            warn!(recommended, "worker-count request was not acknowledged");
        }
        ScaleDecision::Requested {
            scale_out: recommended,
            acknowledged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingManager {
        requests: Mutex<Vec<u32>>,
        acknowledge: bool,
    }

    impl RecordingManager {
        fn acknowledging() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                acknowledge: true,
            }
        }

        fn requests(&self) -> Vec<u32> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WorkerManager for RecordingManager {
        async fn request_total_workers(&self, scale_out: u32) -> Result<bool> {
            self.requests.lock().unwrap().push(scale_out);
            Ok(self.acknowledge)
        }
    }

    #[tokio::test]
    async fn test_equal_count_never_requests() {
        let manager = RecordingManager::acknowledging();
        let mut adjuster = ScaleAdjuster::new(Duration::from_secs(10));
        adjuster.restart_cooldown();

        // Equal counts skip even while the cooldown is armed, and also when
        // it is not.
        assert_eq!(adjuster.apply(4, 4, &manager).await, ScaleDecision::Unchanged);
        adjuster.last_adjustment = None;
        assert_eq!(adjuster.apply(4, 4, &manager).await, ScaleDecision::Unchanged);
        assert!(manager.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_second_request() {
        let manager = RecordingManager::acknowledging();
        let mut adjuster = ScaleAdjuster::new(Duration::from_secs(10));

        let first = adjuster.apply(6, 4, &manager).await;
        assert!(matches!(
            first,
            ScaleDecision::Requested {
                scale_out: 6,
                acknowledged: true
            }
        ));

        let second = adjuster.apply(8, 6, &manager).await;
        assert!(matches!(second, ScaleDecision::Throttled { .. }));
        assert_eq!(manager.requests(), vec![6]);
    }

    #[tokio::test]
    async fn test_throttle_does_not_reset_timer() {
        let manager = RecordingManager::acknowledging();
        let mut adjuster = ScaleAdjuster::new(Duration::from_millis(50));
        adjuster.apply(6, 4, &manager).await;

        // Repeated throttled attempts must not push the window out.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(matches!(
            adjuster.apply(8, 6, &manager).await,
            ScaleDecision::Throttled { .. }
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(matches!(
            adjuster.apply(8, 6, &manager).await,
            ScaleDecision::Requested { scale_out: 8, .. }
        ));
        assert_eq!(manager.requests(), vec![6, 8]);
    }

    #[tokio::test]
    async fn test_request_after_cooldown_elapses() {
        let manager = RecordingManager::acknowledging();
        let mut adjuster = ScaleAdjuster::new(Duration::from_millis(20));
        adjuster.restart_cooldown();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let decision = adjuster.apply(6, 4, &manager).await;
        assert!(matches!(decision, ScaleDecision::Requested { scale_out: 6, .. }));
    }

    #[tokio::test]
    async fn test_unacknowledged_request_still_resets_timer() {
        let manager = RecordingManager::default(); // acknowledge = false
        let mut adjuster = ScaleAdjuster::new(Duration::from_secs(10));

        let decision = adjuster.apply(6, 4, &manager).await;
        assert_eq!(
            decision,
            ScaleDecision::Requested {
                scale_out: 6,
                acknowledged: false
            }
        );
        // Timer reset regardless of the acknowledgement outcome.
        assert!(matches!(
            adjuster.apply(8, 6, &manager).await,
            ScaleDecision::Throttled { .. }
        ));
    }
}
