//! Agent configuration

use crate::error::AgentError;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

/// Scale-out agent configuration.
///
/// Loaded from `SCALEOUT_`-prefixed environment variables; every field has a
/// default so a non-adaptive host can embed the agent without any setup. The
/// spec descriptors are JSON documents handed through to the decision
/// service and are mandatory when the adaptive flag is set.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Whether autoscaling is active; when false every event is a no-op
    #[serde(default)]
    pub adaptive: bool,

    /// Decision-service endpoint
    #[serde(default = "default_decision_endpoint")]
    pub decision_endpoint: String,

    /// Address of the coordinator process, excluded from worker counts
    #[serde(default)]
    pub coordinator_address: String,

    /// Minimum milliseconds between outbound worker-count requests
    #[serde(default = "default_scale_cooldown_ms")]
    pub scale_cooldown_ms: u64,

    /// Upper bound on the first-job wait for provisioned workers
    #[serde(default = "default_worker_wait_timeout_ms")]
    pub worker_wait_timeout_ms: u64,

    /// Poll interval while waiting for the first workers
    #[serde(default = "default_worker_poll_interval_ms")]
    pub worker_poll_interval_ms: u64,

    /// Application resource descriptor (JSON), reported at app start
    #[serde(default)]
    pub app_specs: Option<String>,

    /// Driver resource descriptor (JSON)
    #[serde(default)]
    pub driver_specs: Option<String>,

    /// Executor resource descriptor (JSON)
    #[serde(default)]
    pub executor_specs: Option<String>,

    /// Environment descriptor (JSON)
    #[serde(default)]
    pub environment_specs: Option<String>,
}

fn default_decision_endpoint() -> String {
    "http://decision-service:9090".to_string()
}

fn default_scale_cooldown_ms() -> u64 {
    10_000
}

fn default_worker_wait_timeout_ms() -> u64 {
    120_000
}

fn default_worker_poll_interval_ms() -> u64 {
    500
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            adaptive: false,
            decision_endpoint: default_decision_endpoint(),
            coordinator_address: String::new(),
            scale_cooldown_ms: default_scale_cooldown_ms(),
            worker_wait_timeout_ms: default_worker_wait_timeout_ms(),
            worker_poll_interval_ms: default_worker_poll_interval_ms(),
            app_specs: None,
            driver_specs: None,
            executor_specs: None,
            environment_specs: None,
        }
    }
}

impl AgentConfig {
    /// Load configuration from `SCALEOUT_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCALEOUT"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Validate the configuration for adaptive operation.
    ///
    /// Every spec descriptor must be present and be well-formed JSON; a
    /// missing descriptor is fatal at application start.
    pub fn validate(&self) -> Result<(), AgentError> {
        if !self.adaptive {
            return Ok(());
        }

        let descriptors = [
            ("app_specs", &self.app_specs),
            ("driver_specs", &self.driver_specs),
            ("executor_specs", &self.executor_specs),
            ("environment_specs", &self.environment_specs),
        ];

        let missing: Vec<&str> = descriptors
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AgentError::InvalidConfig(format!(
                "missing required spec descriptors: {}",
                missing.join(", ")
            )));
        }

        for (name, value) in descriptors {
            let raw = value.as_deref().unwrap_or_default();
            if serde_json::from_str::<serde_json::Value>(raw).is_err() {
                return Err(AgentError::InvalidConfig(format!(
                    "{name} is not valid JSON"
                )));
            }
        }

        Ok(())
    }

    pub fn scale_cooldown(&self) -> Duration {
        Duration::from_millis(self.scale_cooldown_ms)
    }

    pub fn worker_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_wait_timeout_ms)
    }

    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adaptive_config() -> AgentConfig {
        AgentConfig {
            adaptive: true,
            app_specs: Some(r#"{"cores": 8}"#.to_string()),
            driver_specs: Some(r#"{"memory_gb": 4}"#.to_string()),
            executor_specs: Some(r#"{"memory_gb": 16}"#.to_string()),
            environment_specs: Some(r#"{"machine": "c2-standard-8"}"#.to_string()),
            ..AgentConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert!(!config.adaptive);
        assert_eq!(config.scale_cooldown_ms, 10_000);
        assert_eq!(config.scale_cooldown(), Duration::from_secs(10));
    }

    #[test]
    fn test_non_adaptive_needs_no_descriptors() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_adaptive_validation_passes_with_descriptors() {
        assert!(adaptive_config().validate().is_ok());
    }

    #[test]
    fn test_missing_descriptor_is_fatal() {
        let mut config = adaptive_config();
        config.executor_specs = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("executor_specs"));
    }

    #[test]
    fn test_malformed_descriptor_is_fatal() {
        let mut config = adaptive_config();
        config.app_specs = Some("not-json".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("app_specs"));
    }
}
