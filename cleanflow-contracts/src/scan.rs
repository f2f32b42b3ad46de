use async_trait::async_trait;
use cleanflow_model::ScanSource;
use thiserror::Error;

/// Hardware or permission failure while reading a tag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("{0} scanning is not available on this device")]
    NotAvailable(ScanSource),

    #[error("Permission to use the {0} reader was denied")]
    PermissionDenied(ScanSource),

    #[error("The tag did not contain a readable payload")]
    InvalidPayload,

    #[error("Scan failed: {0}")]
    Unknown(String),
}

/// Capability provider wrapping a camera QR session or an NFC reader
/// session. Yields the raw decoded string of one tag.
#[async_trait]
pub trait ScanProvider: Send + Sync {
    fn source(&self) -> ScanSource;

    async fn read_tag(&self) -> Result<String, ScanError>;
}
