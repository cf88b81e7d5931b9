//! Core data models for the scale-out agent

use serde::{Deserialize, Serialize};

/// A worker-count transition observed at a point in time.
///
/// A sample is valid from its own timestamp until the timestamp of the next
/// sample; the most recent sample is open-ended ("still current").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCountSample {
    /// Worker count after the transition
    pub scale_out: u32,
    /// Wall-clock timestamp of the transition in milliseconds
    pub timestamp_ms: i64,
}

/// Per-stage bookkeeping, created at stage submit and finalized at completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage_id: i64,
    pub job_id: i64,
    /// Unknown when the completion event arrived without a prior submit event
    pub submission_time_ms: Option<i64>,
    pub completion_time_ms: Option<i64>,
    pub scale_out_at_submit: u32,
    pub rescaling_time_ratio: Option<f64>,
}

impl StageRecord {
    /// Create a record at stage submission time.
    pub fn submitted(stage_id: i64, job_id: i64, submission_time_ms: i64, scale_out: u32) -> Self {
        Self {
            stage_id,
            job_id,
            submission_time_ms: Some(submission_time_ms),
            completion_time_ms: None,
            scale_out_at_submit: scale_out,
            rescaling_time_ratio: None,
        }
    }

    /// Create a degenerate record for a completion without a known submission.
    pub fn unsubmitted(stage_id: i64, job_id: i64, scale_out: u32) -> Self {
        Self {
            stage_id,
            job_id,
            submission_time_ms: None,
            completion_time_ms: None,
            scale_out_at_submit: scale_out,
            rescaling_time_ratio: None,
        }
    }
}

/// Application-start lifecycle event as delivered by the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStart {
    pub application_id: String,
    pub app_name: String,
    pub time_ms: i64,
}

/// Job-start lifecycle event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobStart {
    pub job_id: i64,
    pub time_ms: i64,
}

/// Stage-submitted lifecycle event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StageSubmitted {
    pub stage_id: i64,
    pub job_id: i64,
    pub time_ms: i64,
}

/// Stage-completed lifecycle event.
///
/// The host's stage info carries both boundary timestamps; the submission
/// time may be absent when the stage never ran.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StageCompleted {
    pub stage_id: i64,
    pub job_id: i64,
    pub submission_time_ms: Option<i64>,
    pub completion_time_ms: i64,
}

/// Job-end lifecycle event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobEnd {
    pub job_id: i64,
    pub time_ms: i64,
}

/// Application-end lifecycle event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApplicationEnd {
    pub time_ms: i64,
}
