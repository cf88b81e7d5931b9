//! Seams to the host runtime's worker facilities
//!
//! The embedding application implements these traits; the agent never talks
//! to cluster infrastructure directly.

use anyhow::Result;
use async_trait::async_trait;

/// Directory of live worker addresses, coordinator included.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    /// Addresses of all live processes known to the host runtime.
    async fn live_worker_addresses(&self) -> Result<Vec<String>>;
}

/// Worker-count request facility of the host runtime.
#[async_trait]
pub trait WorkerManager: Send + Sync {
    /// Ask the runtime for `scale_out` total workers.
    ///
    /// The returned flag only confirms that the runtime accepted the request,
    /// not that the workers were provisioned.
    async fn request_total_workers(&self, scale_out: u32) -> Result<bool>;
}
