use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{AreaID, ProtocolID};

/// Hardware channel a tag was read through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScanSource {
    Qr,
    Nfc,
}

impl std::fmt::Display for ScanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanSource::Qr => f.write_str("QR"),
            ScanSource::Nfc => f.write_str("NFC"),
        }
    }
}

/// Second field carried by a tag next to the area id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value"))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TagPayload {
    /// QR codes name the protocol to run
    Protocol(ProtocolID),
    /// NFC tags name the asset type they are mounted on
    Asset(String),
}

impl TagPayload {
    pub fn as_str(&self) -> &str {
        match self {
            TagPayload::Protocol(id) => id.as_str(),
            TagPayload::Asset(asset) => asset.as_str(),
        }
    }
}

/// Structured, timestamped result of a successful tag decode
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanRecord {
    pub area_id: AreaID,
    pub payload: TagPayload,
    pub source: ScanSource,
    pub scanned_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn protocol_id(&self) -> Option<&ProtocolID> {
        match &self.payload {
            TagPayload::Protocol(id) => Some(id),
            TagPayload::Asset(_) => None,
        }
    }
}
