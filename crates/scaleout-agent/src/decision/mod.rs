//! Decision-service exchange
//!
//! The agent reports lifecycle telemetry to an external decision service and
//! receives recommended worker counts in return. The orchestrator talks to
//! the [`DecisionChannel`] trait; [`GrpcDecisionChannel`] is the production
//! implementation. Reports go out one at a time on the lifecycle-event path,
//! which preserves their order on the wire.

pub mod client;
pub mod proto;

pub use client::{ClientConfig, GrpcDecisionChannel};
pub use proto::{
    AppEndRequest, AppStartRequest, AppStartResponse, JobEndRequest, JobStartRequest,
    RecommendationResponse, StageMetrics,
};

use crate::error::DecisionError;
use crate::models::StageRecord;
use async_trait::async_trait;

/// Request/reply contract with the decision service.
#[async_trait]
pub trait DecisionChannel: Send + Sync {
    /// Report application start; the reply assigns the session's event id
    /// and the initial recommended scale-out.
    async fn report_app_start(
        &self,
        request: AppStartRequest,
    ) -> Result<AppStartResponse, DecisionError>;

    /// Report job start and obtain a recommendation.
    async fn report_job_start(
        &self,
        request: JobStartRequest,
    ) -> Result<RecommendationResponse, DecisionError>;

    /// Report job end, including per-stage telemetry, and obtain a
    /// recommendation.
    async fn report_job_end(
        &self,
        request: JobEndRequest,
    ) -> Result<RecommendationResponse, DecisionError>;

    /// Report application end; acknowledgement only.
    async fn report_app_end(&self, request: AppEndRequest) -> Result<(), DecisionError>;

    /// Release the channel. In-flight requests are not cancelled, only
    /// allowed to fail naturally.
    async fn close(&self);
}

impl From<&StageRecord> for StageMetrics {
    fn from(record: &StageRecord) -> Self {
        Self {
            submission_time: record.submission_time_ms,
            completion_time: record.completion_time_ms.unwrap_or_default(),
            scale_out_at_submit: record.scale_out_at_submit,
            rescaling_time_ratio: record.rescaling_time_ratio.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_metrics_from_record() {
        let record = StageRecord {
            stage_id: 10,
            job_id: 1,
            submission_time_ms: Some(1_000),
            completion_time_ms: Some(2_000),
            scale_out_at_submit: 4,
            rescaling_time_ratio: Some(0.5),
        };
        let metrics = StageMetrics::from(&record);
        assert_eq!(metrics.submission_time, Some(1_000));
        assert_eq!(metrics.completion_time, 2_000);
        assert_eq!(metrics.scale_out_at_submit, 4);
        assert_eq!(metrics.rescaling_time_ratio, 0.5);
    }

    #[test]
    fn test_degenerate_record_maps_to_defaults() {
        let record = StageRecord::unsubmitted(10, 1, 3);
        let metrics = StageMetrics::from(&record);
        assert_eq!(metrics.submission_time, None);
        assert_eq!(metrics.completion_time, 0);
        assert_eq!(metrics.rescaling_time_ratio, 0.0);
    }
}
