//! Per-job stage bookkeeping
//!
//! Records stage submit/completion timing together with the scale-out and
//! rescaling ratio observed at each boundary. Host events are trusted to be
//! well-formed but not to be complete or ordered: duplicates overwrite and a
//! completion without a submission produces a degenerate record instead of
//! an error.

use crate::models::StageRecord;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Registry of stage records, keyed by job and stage id.
#[derive(Debug, Default)]
pub struct StageRegistry {
    jobs: DashMap<i64, HashMap<i64, StageRecord>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. A duplicate id overwrites the previous entry; the
    /// host does not emit duplicates in practice, so this is non-fatal.
    pub fn add_job(&self, job_id: i64) {
        if self.jobs.insert(job_id, HashMap::new()).is_some() {
            debug!(job_id, "job registered twice, dropping previous stages");
        }
    }

    /// Record a stage submission at the given scale-out.
    pub fn add_stage_submit(
        &self,
        scale_out: u32,
        stage_id: i64,
        job_id: i64,
        submission_time_ms: i64,
    ) {
        self.jobs.entry(job_id).or_default().insert(
            stage_id,
            StageRecord::submitted(stage_id, job_id, submission_time_ms, scale_out),
        );
    }

    /// Finalize a stage record with its completion time and rescaling ratio.
    ///
    /// A completion for a stage that was never submitted creates a degenerate
    /// record with an unknown submission time, tolerating missing or
    /// out-of-order host events.
    pub fn add_stage_complete(
        &self,
        scale_out: u32,
        rescaling_time_ratio: f64,
        stage_id: i64,
        job_id: i64,
        completion_time_ms: i64,
    ) {
        let mut stages = self.jobs.entry(job_id).or_default();
        let record = stages.entry(stage_id).or_insert_with(|| {
            warn!(job_id, stage_id, "stage completed without a submit event");
            StageRecord::unsubmitted(stage_id, job_id, scale_out)
        });
        record.completion_time_ms = Some(completion_time_ms);
        record.rescaling_time_ratio = Some(rescaling_time_ratio);
    }

    /// Submission time of a stage, when known.
    pub fn submission_time(&self, job_id: i64, stage_id: i64) -> Option<i64> {
        self.jobs
            .get(&job_id)?
            .get(&stage_id)?
            .submission_time_ms
    }

    /// Snapshot of a job's stage records.
    pub fn stages(&self, job_id: i64) -> HashMap<i64, StageRecord> {
        self.jobs
            .get(&job_id)
            .map(|stages| stages.value().clone())
            .unwrap_or_default()
    }

    /// Remove a job and return its stage records, if any.
    pub fn drain_job(&self, job_id: i64) -> Option<HashMap<i64, StageRecord>> {
        self.jobs.remove(&job_id).map(|(_, stages)| stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_then_complete() {
        let registry = StageRegistry::new();
        registry.add_job(1);
        registry.add_stage_submit(4, 10, 1, 1_000);
        registry.add_stage_complete(5, 0.25, 10, 1, 2_000);

        let stages = registry.stages(1);
        let record = &stages[&10];
        assert_eq!(record.submission_time_ms, Some(1_000));
        assert_eq!(record.completion_time_ms, Some(2_000));
        assert_eq!(record.scale_out_at_submit, 4);
        assert_eq!(record.rescaling_time_ratio, Some(0.25));
    }

    #[test]
    fn test_complete_without_submit_creates_degenerate_record() {
        let registry = StageRegistry::new();
        registry.add_stage_complete(3, 0.0, 10, 1, 2_000);

        let stages = registry.stages(1);
        let record = &stages[&10];
        assert_eq!(record.submission_time_ms, None);
        assert_eq!(record.completion_time_ms, Some(2_000));
        assert_eq!(record.scale_out_at_submit, 3);
    }

    #[test]
    fn test_duplicate_job_overwrites() {
        let registry = StageRegistry::new();
        registry.add_job(1);
        registry.add_stage_submit(4, 10, 1, 1_000);
        registry.add_job(1);
        assert!(registry.stages(1).is_empty());
    }

    #[test]
    fn test_drain_job_removes_records() {
        let registry = StageRegistry::new();
        registry.add_job(1);
        registry.add_stage_submit(4, 10, 1, 1_000);

        let drained = registry.drain_job(1).unwrap();
        assert_eq!(drained.len(), 1);
        assert!(registry.drain_job(1).is_none());
        assert!(registry.stages(1).is_empty());
    }

    #[test]
    fn test_submission_time_lookup() {
        let registry = StageRegistry::new();
        registry.add_stage_submit(4, 10, 1, 1_000);
        assert_eq!(registry.submission_time(1, 10), Some(1_000));
        assert_eq!(registry.submission_time(1, 11), None);
        assert_eq!(registry.submission_time(2, 10), None);
    }
}
