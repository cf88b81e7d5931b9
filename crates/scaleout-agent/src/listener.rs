//! Lifecycle orchestration
//!
//! The listener sequences the host's application/job/stage/worker events,
//! drives the tracker, registry and adjuster, and exchanges telemetry with
//! the decision service. Most events arrive on the host's single dispatch
//! thread; worker add/remove may race from elsewhere and only touch the
//! tracker, which synchronizes internally.

use crate::adjuster::{ScaleAdjuster, ScaleDecision};
use crate::config::AgentConfig;
use crate::decision::{
    AppEndRequest, AppStartRequest, DecisionChannel, JobEndRequest, JobStartRequest, StageMetrics,
};
use crate::error::{AgentError, DecisionError};
use crate::host::{WorkerDirectory, WorkerManager};
use crate::models::{
    ApplicationEnd, ApplicationStart, JobEnd, JobStart, StageCompleted, StageSubmitted,
};
use crate::observability::AgentMetrics;
use crate::ratio::rescaling_time_ratio;
use crate::registry::StageRegistry;
use crate::tracker::WorkerCountTracker;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Lifecycle state of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Uninitialized,
    AwaitingWorkers,
    Running,
    Terminated,
}

/// Session established with the decision service at application start.
#[derive(Debug, Clone)]
struct Session {
    app_event_id: String,
    app_start_time_ms: i64,
}

/// The autoscaling lifecycle listener.
///
/// One instance per application run; the host owns it and feeds it events.
/// Worker add/remove events arriving off the dispatch thread can be wired
/// directly to the tracker handle returned by [`tracker`].
///
/// [`tracker`]: LifecycleListener::tracker
pub struct LifecycleListener {
    config: AgentConfig,
    tracker: Arc<WorkerCountTracker>,
    registry: StageRegistry,
    adjuster: ScaleAdjuster,
    channel: Arc<dyn DecisionChannel>,
    directory: Arc<dyn WorkerDirectory>,
    manager: Arc<dyn WorkerManager>,
    metrics: AgentMetrics,
    state: AgentState,
    session: Option<Session>,
}

impl LifecycleListener {
    pub fn new(
        config: AgentConfig,
        channel: Arc<dyn DecisionChannel>,
        directory: Arc<dyn WorkerDirectory>,
        manager: Arc<dyn WorkerManager>,
    ) -> Self {
        let adjuster = ScaleAdjuster::new(config.scale_cooldown());
        Self {
            config,
            tracker: Arc::new(WorkerCountTracker::new()),
            registry: StageRegistry::new(),
            adjuster,
            channel,
            directory,
            manager,
            metrics: AgentMetrics::new(),
            state: AgentState::Uninitialized,
            session: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Shared tracker handle for wiring worker events from other threads.
    pub fn tracker(&self) -> Arc<WorkerCountTracker> {
        Arc::clone(&self.tracker)
    }

    /// Whether events should be processed at all.
    fn operational(&self) -> bool {
        self.config.adaptive && self.state != AgentState::Terminated && self.session.is_some()
    }

    /// Handle application start.
    ///
    /// Validates configuration (missing descriptors are fatal), establishes
    /// the session with the decision service, requests the recommended
    /// initial worker count and arms the cooldown.
    pub async fn on_application_start(&mut self, event: ApplicationStart) -> Result<(), AgentError> {
        if !self.config.adaptive {
            debug!("autoscaling disabled, ignoring application start");
            return Ok(());
        }
        if self.state != AgentState::Uninitialized {
            warn!(state = ?self.state, "duplicate application start ignored");
            return Ok(());
        }

        self.config.validate()?;
        self.tracker.mark_context_established();
        self.tracker.activate();

        let request = AppStartRequest {
            application_id: event.application_id.clone(),
            app_name: event.app_name.clone(),
            app_time: event.time_ms,
            is_adaptive: true,
            app_specs: self.config.app_specs.clone().unwrap_or_default(),
            driver_specs: self.config.driver_specs.clone().unwrap_or_default(),
            executor_specs: self.config.executor_specs.clone().unwrap_or_default(),
            environment_specs: self.config.environment_specs.clone().unwrap_or_default(),
        };
        // Without the session id from this reply no later report can be
        // attributed, so initialization failures propagate.
        let response = self.channel.report_app_start(request).await?;
        self.metrics.inc_reports_sent();

        info!(
            application_id = %event.application_id,
            app_event_id = %response.app_event_id,
            recommended_scale_out = response.recommended_scale_out,
            "application session established"
        );
        self.session = Some(Session {
            app_event_id: response.app_event_id,
            app_start_time_ms: event.time_ms,
        });

        match self
            .manager
            .request_total_workers(response.recommended_scale_out)
            .await
        {
            Ok(acknowledged) => {
                self.metrics.inc_scale_requests();
                if !acknowledged {
                    warn!(
                        scale_out = response.recommended_scale_out,
                        "initial worker request was not acknowledged"
                    );
                }
            }
            Err(e) => warn!(error = %e, "initial worker request failed"),
        }
        self.adjuster.restart_cooldown();
        self.state = AgentState::AwaitingWorkers;
        Ok(())
    }

    /// Handle job start.
    ///
    /// The first job of the application additionally waits for the tracked
    /// worker count to become non-zero, measuring the actually-provisioned
    /// count from the host directory each poll. The wait is bounded; hitting
    /// the bound fails the job-start path explicitly.
    pub async fn on_job_start(&mut self, event: JobStart) -> Result<(), AgentError> {
        if !self.operational() {
            return Ok(());
        }
        let Some(session) = self.session.clone() else {
            return Ok(());
        };

        if event.job_id == 0 && self.state == AgentState::AwaitingWorkers {
            self.await_initial_workers().await?;
        }
        self.state = AgentState::Running;
        self.registry.add_job(event.job_id);

        let request = JobStartRequest {
            app_event_id: session.app_event_id,
            app_time: event.time_ms,
            job_id: event.job_id,
            num_executors: self.tracker.current(),
        };
        match self.channel.report_job_start(request).await {
            Ok(response) => {
                self.metrics.inc_reports_sent();
                self.apply_recommendation(response.recommended_scale_out)
                    .await;
            }
            Err(e) => self.record_decision_failure("job_start", &e),
        }
        Ok(())
    }

    /// Handle stage submission: snapshot the current worker count.
    pub fn on_stage_submitted(&mut self, event: StageSubmitted) {
        if !self.operational() {
            return;
        }
        self.registry.add_stage_submit(
            self.tracker.current(),
            event.stage_id,
            event.job_id,
            event.time_ms,
        );
    }

    /// Handle stage completion: compute the rescaling ratio over the stage
    /// window and finalize the record.
    pub fn on_stage_completed(&mut self, event: StageCompleted) {
        if !self.operational() {
            return;
        }
        let submission = event
            .submission_time_ms
            .or_else(|| self.registry.submission_time(event.job_id, event.stage_id));
        let ratio = match submission {
            Some(start) => rescaling_time_ratio(
                &self.tracker.snapshot_history(),
                start,
                event.completion_time_ms,
            ),
            None => 0.0,
        };
        self.metrics.observe_rescaling_ratio(ratio);
        self.registry.add_stage_complete(
            self.tracker.current(),
            ratio,
            event.stage_id,
            event.job_id,
            event.completion_time_ms,
        );
        debug!(
            job_id = event.job_id,
            stage_id = event.stage_id,
            rescaling_time_ratio = ratio,
            "stage completed"
        );
    }

    /// Handle job end: report the job window's rescaling ratio together with
    /// the drained stage map and apply the returned recommendation.
    pub async fn on_job_end(&mut self, event: JobEnd) -> Result<(), AgentError> {
        if !self.operational() {
            return Ok(());
        }
        let Some(session) = self.session.clone() else {
            return Ok(());
        };

        // The job window starts at application start, not job start: time a
        // job spent queued behind rescaling counts against it as well.
        let ratio = rescaling_time_ratio(
            &self.tracker.snapshot_history(),
            session.app_start_time_ms,
            event.time_ms,
        );
        self.metrics.observe_rescaling_ratio(ratio);

        let stages: HashMap<i64, StageMetrics> = self
            .registry
            .drain_job(event.job_id)
            .unwrap_or_default()
            .iter()
            .map(|(id, record)| (*id, StageMetrics::from(record)))
            .collect();

        let request = JobEndRequest {
            app_event_id: session.app_event_id,
            app_time: event.time_ms,
            job_id: event.job_id,
            num_executors: self.tracker.current(),
            rescaling_time_ratio: ratio,
            stages,
        };
        match self.channel.report_job_end(request).await {
            Ok(response) => {
                self.metrics.inc_reports_sent();
                self.apply_recommendation(response.recommended_scale_out)
                    .await;
            }
            Err(e) => self.record_decision_failure("job_end", &e),
        }
        Ok(())
    }

    /// Handle a worker joining the cluster.
    pub fn on_worker_added(&self, time_ms: i64) {
        if !self.config.adaptive {
            return;
        }
        if self.tracker.adjust(1, time_ms) {
            self.metrics
                .set_current_scale_out(self.tracker.current() as i64);
        }
    }

    /// Handle a worker leaving the cluster.
    pub fn on_worker_removed(&self, time_ms: i64) {
        if !self.config.adaptive {
            return;
        }
        if self.tracker.adjust(-1, time_ms) {
            self.metrics
                .set_current_scale_out(self.tracker.current() as i64);
        }
    }

    /// Handle application end: final report, channel release, terminal state.
    pub async fn on_application_end(&mut self, event: ApplicationEnd) -> Result<(), AgentError> {
        if !self.config.adaptive || self.state == AgentState::Terminated {
            return Ok(());
        }

        if let Some(session) = self.session.clone() {
            let request = AppEndRequest {
                app_event_id: session.app_event_id,
                app_time: event.time_ms,
                num_executors: self.tracker.current(),
            };
            match self.channel.report_app_end(request).await {
                Ok(()) => self.metrics.inc_reports_sent(),
                Err(e) => self.record_decision_failure("application_end", &e),
            }
        }

        self.channel.close().await;
        self.tracker.deactivate();
        self.state = AgentState::Terminated;
        info!("application lifecycle terminated");
        Ok(())
    }

    /// Bounded poll for the first provisioned workers.
    async fn await_initial_workers(&self) -> Result<(), AgentError> {
        let started = Instant::now();
        let timeout = self.config.worker_wait_timeout();
        info!(
            timeout_ms = timeout.as_millis() as u64,
            "waiting for initial workers"
        );

        loop {
            if self.tracker.current() > 0 {
                break;
            }
            match self
                .tracker
                .measure_actual(self.directory.as_ref(), &self.config.coordinator_address)
                .await
            {
                Ok(measured) if measured > 0 => break,
                Ok(_) => {}
                Err(e) => warn!(error = %e, "worker directory query failed while waiting"),
            }
            if started.elapsed() >= timeout {
                return Err(AgentError::WorkerWaitTimeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                    observed: self.tracker.current(),
                });
            }
            tokio::time::sleep(self.config.worker_poll_interval()).await;
        }

        info!(
            scale_out = self.tracker.current(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "initial workers available"
        );
        Ok(())
    }

    /// Hand a recommendation to the adjuster and account for the outcome.
    async fn apply_recommendation(&mut self, recommended: u32) {
        let current = self.tracker.current();
        match self
            .adjuster
            .apply(recommended, current, self.manager.as_ref())
            .await
        {
            ScaleDecision::Unchanged => {}
            ScaleDecision::Throttled { .. } => self.metrics.inc_recommendations_throttled(),
            ScaleDecision::Requested { .. } => self.metrics.inc_scale_requests(),
        }
        self.metrics
            .set_current_scale_out(self.tracker.current() as i64);
    }

    fn record_decision_failure(&self, report: &str, failure: &DecisionError) {
        self.metrics.inc_decision_failures();
        match failure {
            DecisionError::Transport(_) => warn!(
                report,
                error = %failure,
                "decision exchange failed, keeping current scale-out"
            ),
            DecisionError::Protocol(_) => error!(
                report,
                error = %failure,
                "decision exchange rejected, report lost"
            ),
        }
    }
}
