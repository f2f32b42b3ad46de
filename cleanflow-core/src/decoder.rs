//! Tag decoding for printed QR codes and mounted NFC tags.
//!
//! Malformed payloads are an expected outcome of pointing a camera at the
//! wrong sticker, so decoding never fails with an error: it returns
//! [`TagDecode::Invalid`] with the reason instead.

use chrono::Utc;
use cleanflow_contracts::{ScanError, ScanProvider};
use cleanflow_model::{AreaID, ProtocolID, ScanRecord, ScanSource, TagPayload};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

static QR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^CF-AREA-(.+?)-PROTOCOL-(.+?)$")
        .expect("qr tag regex should compile")
});

const NFC_SEPARATOR: char = ':';

/// Scanners in keyboard-wedge mode append a line terminator; nothing else
/// around the payload is discarded.
fn strip_line_terminator(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Why a raw payload was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTag {
    #[error("Empty tag payload")]
    Empty,

    #[error("Invalid QR code format")]
    QrPatternMismatch,

    #[error("Invalid NFC tag format: expected at least 2 fields, found {found}")]
    MissingNfcFields { found: usize },
}

/// Outcome of decoding one raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagDecode {
    Valid(ScanRecord),
    Invalid(InvalidTag),
}

impl TagDecode {
    pub fn is_valid(&self) -> bool {
        matches!(self, TagDecode::Valid(_))
    }

    pub fn record(&self) -> Option<&ScanRecord> {
        match self {
            TagDecode::Valid(record) => Some(record),
            TagDecode::Invalid(_) => None,
        }
    }

    pub fn into_record(self) -> Result<ScanRecord, InvalidTag> {
        match self {
            TagDecode::Valid(record) => Ok(record),
            TagDecode::Invalid(reason) => Err(reason),
        }
    }
}

/// Decode `CF-AREA-<areaId>-PROTOCOL-<protocolId>`.
pub fn decode_qr(raw: &str) -> TagDecode {
    let payload = strip_line_terminator(raw);
    if payload.is_empty() {
        return TagDecode::Invalid(InvalidTag::Empty);
    }

    let Some(captures) = QR_PATTERN.captures(payload) else {
        debug!(payload, "qr payload does not match tag pattern");
        return TagDecode::Invalid(InvalidTag::QrPatternMismatch);
    };

    TagDecode::Valid(ScanRecord {
        area_id: AreaID::from(&captures[1]),
        payload: TagPayload::Protocol(ProtocolID::from(&captures[2])),
        source: ScanSource::Qr,
        scanned_at: Utc::now(),
    })
}

/// Decode `<areaId>:<assetType>[:<extra>...]`. Fields after the second
/// are ignored.
pub fn decode_nfc(raw: &str) -> TagDecode {
    let payload = strip_line_terminator(raw);
    if payload.is_empty() {
        return TagDecode::Invalid(InvalidTag::Empty);
    }

    let mut fields = payload.split(NFC_SEPARATOR);
    match (fields.next(), fields.next()) {
        (Some(area), Some(asset)) => TagDecode::Valid(ScanRecord {
            area_id: AreaID::from(area),
            payload: TagPayload::Asset(asset.to_string()),
            source: ScanSource::Nfc,
            scanned_at: Utc::now(),
        }),
        _ => {
            debug!(payload, "nfc payload is missing the asset field");
            TagDecode::Invalid(InvalidTag::MissingNfcFields { found: 1 })
        }
    }
}

pub fn decode(source: ScanSource, raw: &str) -> TagDecode {
    match source {
        ScanSource::Qr => decode_qr(raw),
        ScanSource::Nfc => decode_nfc(raw),
    }
}

/// Run one hardware read and decode the payload it yields.
///
/// Hardware and permission failures come back as `Err`; a readable but
/// malformed payload is `Ok(TagDecode::Invalid(..))`.
pub async fn read_and_decode<P>(provider: &P) -> Result<TagDecode, ScanError>
where
    P: ScanProvider + ?Sized,
{
    let raw = provider.read_tag().await?;
    Ok(decode(provider.source(), &raw))
}
