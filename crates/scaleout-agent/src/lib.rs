//! In-process autoscaling agent for a distributed batch runtime
//!
//! This crate provides the core functionality for:
//! - Tracking the live worker count and its transition history
//! - Computing the rescaling time ratio over stage and job windows
//! - Exchanging telemetry with an external decision service
//! - Requesting recommended worker counts, throttled by a cooldown
//! - Sequencing all of it around the host's lifecycle events

pub mod adjuster;
pub mod config;
pub mod decision;
pub mod error;
pub mod host;
pub mod listener;
pub mod models;
pub mod observability;
pub mod ratio;
pub mod registry;
pub mod tracker;

pub use adjuster::{ScaleAdjuster, ScaleDecision};
pub use config::AgentConfig;
pub use decision::{DecisionChannel, GrpcDecisionChannel};
pub use error::{AgentError, DecisionError};
pub use host::{WorkerDirectory, WorkerManager};
pub use listener::{AgentState, LifecycleListener};
pub use models::*;
pub use observability::AgentMetrics;
pub use ratio::{rescaling_time_ratio, safe_div};
pub use registry::StageRegistry;
pub use tracker::WorkerCountTracker;
