//! gRPC client for the decision service
//!
//! Provides a client that:
//! - Caches the underlying channel and reconnects lazily
//! - Tracks reconnection attempts with exponential backoff state
//! - Classifies failures as retryable transport or fatal protocol errors
//!
//! Transport security is the deployment's concern; the agent talks plain
//! HTTP/2 to the service address it is configured with.

use super::proto::{
    AppEndRequest, AppStartRequest, AppStartResponse, DecisionServiceClient, JobEndRequest,
    JobStartRequest, RecommendationResponse,
};
use super::DecisionChannel;
use crate::error::DecisionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tonic::transport::Channel;
use tonic::Code;
use tracing::{debug, info, warn};

/// Configuration for the gRPC client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Decision-service endpoint URL (e.g. "http://decision-service:9090")
    pub endpoint: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Keepalive interval
    pub keepalive_interval: Duration,
    /// Keepalive timeout
    pub keepalive_timeout: Duration,
    /// Initial backoff for reconnection
    pub initial_backoff: Duration,
    /// Maximum backoff for reconnection
    pub max_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://decision-service:9090".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(30),
            keepalive_timeout: Duration::from_secs(10),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Connection state for tracking reconnection attempts
#[derive(Debug, Clone)]
struct ConnectionState {
    connected: bool,
    last_error: Option<String>,
    last_connected_at: Option<DateTime<Utc>>,
    reconnect_attempts: u32,
    current_backoff: Duration,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            connected: false,
            last_error: None,
            last_connected_at: None,
            reconnect_attempts: 0,
            current_backoff: Duration::from_secs(1),
        }
    }
}

/// gRPC implementation of [`DecisionChannel`].
pub struct GrpcDecisionChannel {
    config: ClientConfig,
    channel: Arc<RwLock<Option<Channel>>>,
    connection_state: Arc<RwLock<ConnectionState>>,
}

impl GrpcDecisionChannel {
    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            channel: Arc::new(RwLock::new(None)),
            connection_state: Arc::new(RwLock::new(ConnectionState::default())),
        }
    }

    /// Create a client for the given endpoint with default timeouts.
    pub fn with_defaults(endpoint: impl Into<String>) -> Self {
        let config = ClientConfig {
            endpoint: endpoint.into(),
            ..ClientConfig::default()
        };
        Self::new(config)
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Check if the client is currently connected
    pub async fn is_connected(&self) -> bool {
        self.connection_state.read().await.connected
    }

    /// Get connection statistics
    pub async fn connection_stats(&self) -> (bool, u32, Option<String>) {
        let state = self.connection_state.read().await;
        (
            state.connected,
            state.reconnect_attempts,
            state.last_error.clone(),
        )
    }

    /// Get the current backoff duration for reconnection
    pub async fn reconnect_backoff(&self) -> Duration {
        self.connection_state.read().await.current_backoff
    }

    /// When the client last connected successfully, if ever
    pub async fn last_connected_at(&self) -> Option<DateTime<Utc>> {
        self.connection_state.read().await.last_connected_at
    }

    /// Create a new channel to the decision service.
    async fn create_channel(&self) -> Result<Channel, DecisionError> {
        let channel = Channel::from_shared(self.config.endpoint.clone())
            .map_err(|e| {
                DecisionError::Transport(format!("invalid endpoint {}: {e}", self.config.endpoint))
            })?
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .http2_keep_alive_interval(self.config.keepalive_interval)
            .keep_alive_timeout(self.config.keepalive_timeout)
            .keep_alive_while_idle(true)
            .connect()
            .await
            .map_err(|e| {
                DecisionError::Transport(format!(
                    "failed to connect to {}: {e}",
                    self.config.endpoint
                ))
            })?;

        Ok(channel)
    }

    /// Get or create a connected channel.
    async fn get_channel(&self) -> Result<Channel, DecisionError> {
        {
            let channel = self.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                return Ok(ch.clone());
            }
        }

        let new_channel = match self.create_channel().await {
            Ok(ch) => ch,
            Err(e) => {
                self.handle_connection_failure(&e.to_string()).await;
                return Err(e);
            }
        };

        let mut channel = self.channel.write().await;
        *channel = Some(new_channel.clone());

        let mut state = self.connection_state.write().await;
        state.connected = true;
        state.last_connected_at = Some(Utc::now());
        state.reconnect_attempts = 0;
        state.current_backoff = self.config.initial_backoff;
        state.last_error = None;

        info!(endpoint = %self.config.endpoint, "Connected to decision service");

        Ok(new_channel)
    }

    /// Record a connection failure with exponential backoff bookkeeping.
    async fn handle_connection_failure(&self, error: &str) {
        let mut state = self.connection_state.write().await;
        state.connected = false;
        state.last_error = Some(error.to_string());
        state.reconnect_attempts += 1;

        let next_backoff = std::cmp::min(state.current_backoff * 2, self.config.max_backoff);
        state.current_backoff = next_backoff;

        let mut channel = self.channel.write().await;
        *channel = None;

        warn!(
            error = %error,
            attempts = state.reconnect_attempts,
            next_backoff_secs = next_backoff.as_secs(),
            "Connection to decision service failed"
        );
    }

    /// Record a failed exchange; transport failures tear the channel down so
    /// the next report reconnects.
    async fn handle_status(&self, status: tonic::Status) -> DecisionError {
        let error = classify_status(&status);
        if error.is_retryable() {
            self.handle_connection_failure(&status.to_string()).await;
        }
        error
    }
}

/// Map a gRPC status to the agent's failure classes.
fn classify_status(status: &tonic::Status) -> DecisionError {
    match status.code() {
        Code::Unavailable
        | Code::DeadlineExceeded
        | Code::Cancelled
        | Code::ResourceExhausted
        | Code::Aborted
        | Code::Unknown => DecisionError::Transport(status.to_string()),
        _ => DecisionError::Protocol(status.to_string()),
    }
}

#[async_trait]
impl DecisionChannel for GrpcDecisionChannel {
    async fn report_app_start(
        &self,
        request: AppStartRequest,
    ) -> Result<AppStartResponse, DecisionError> {
        let channel = self.get_channel().await?;
        let mut client = DecisionServiceClient::new(channel);

        match client.report_app_start(request).await {
            Ok(response) => {
                let response = response.into_inner();
                debug!(
                    app_event_id = %response.app_event_id,
                    recommended_scale_out = response.recommended_scale_out,
                    "Application start reported"
                );
                Ok(response)
            }
            Err(status) => Err(self.handle_status(status).await),
        }
    }

    async fn report_job_start(
        &self,
        request: JobStartRequest,
    ) -> Result<RecommendationResponse, DecisionError> {
        let channel = self.get_channel().await?;
        let mut client = DecisionServiceClient::new(channel);

        let job_id = request.job_id;
        match client.report_job_start(request).await {
            Ok(response) => {
                let response = response.into_inner();
                debug!(
                    job_id,
                    recommended_scale_out = response.recommended_scale_out,
                    "Job start reported"
                );
                Ok(response)
            }
            Err(status) => Err(self.handle_status(status).await),
        }
    }

    async fn report_job_end(
        &self,
        request: JobEndRequest,
    ) -> Result<RecommendationResponse, DecisionError> {
        let channel = self.get_channel().await?;
        let mut client = DecisionServiceClient::new(channel);

        let job_id = request.job_id;
        match client.report_job_end(request).await {
            Ok(response) => {
                let response = response.into_inner();
                debug!(
                    job_id,
                    recommended_scale_out = response.recommended_scale_out,
                    "Job end reported"
                );
                Ok(response)
            }
            Err(status) => Err(self.handle_status(status).await),
        }
    }

    async fn report_app_end(&self, request: AppEndRequest) -> Result<(), DecisionError> {
        let channel = self.get_channel().await?;
        let mut client = DecisionServiceClient::new(channel);

        match client.report_app_end(request).await {
            Ok(response) => {
                debug!(
                    acknowledged = response.into_inner().acknowledged,
                    "Application end reported"
                );
                Ok(())
            }
            Err(status) => Err(self.handle_status(status).await),
        }
    }

    async fn close(&self) {
        let mut channel = self.channel.write().await;
        *channel = None;

        let mut state = self.connection_state.write().await;
        state.connected = false;

        info!("Decision-service channel released");
    }
}
