use async_trait::async_trait;
use cleanflow_model::{CleaningProtocol, CleaningRun, DashboardStats};
use thiserror::Error;

/// Result type for remote store operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures reported by the remote document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Not authenticated with the remote store")]
    Unauthenticated,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence and query contract for the hosted backend.
///
/// Implementations own the wire format and authentication; the core only
/// relies on these four calls.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Aggregate figures for the dashboard header
    async fn fetch_dashboard_stats(&self) -> GatewayResult<DashboardStats>;

    /// Runs started today, newest first
    async fn fetch_cleaning_runs_today(&self) -> GatewayResult<Vec<CleaningRun>>;

    /// Protocol catalog available to the signed-in user
    async fn fetch_protocols(&self) -> GatewayResult<Vec<CleaningProtocol>>;

    /// Create or overwrite a run document keyed by its id
    async fn save_cleaning_run(&self, run: CleaningRun) -> GatewayResult<()>;
}
