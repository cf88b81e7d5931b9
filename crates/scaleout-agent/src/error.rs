//! Typed errors surfaced by the agent

use thiserror::Error;

/// Errors returned by lifecycle handlers.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Required configuration is missing or malformed; fatal at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A decision-service exchange failed.
    #[error(transparent)]
    Decision(#[from] DecisionError),

    /// The first-job wait for provisioned workers hit its bound.
    #[error("timed out after {waited_ms} ms waiting for workers (observed {observed})")]
    WorkerWaitTimeout { waited_ms: u64, observed: u32 },
}

/// Decision-service failure classes.
///
/// Transport failures are retryable: the caller keeps the previous worker
/// count and continues. Protocol failures lose that single report but the
/// agent keeps operating.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("decision service transport failure: {0}")]
    Transport(String),

    #[error("decision service protocol failure: {0}")]
    Protocol(String),
}

impl DecisionError {
    /// Whether the failed exchange could be retried against the same service.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DecisionError::Transport(_))
    }
}
