//! JSON frame types for the relay's event/acknowledgement protocol.
//!
//! Requests go out as `{"id", "event", "data"}` text frames; the relay
//! answers each with exactly one `{"id", "status", "message", "data"}` frame
//! echoing the request id. Framing stays here so the transport layer can
//! remain a dumb byte pipe.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One outbound request: a correlation id, the operation's fixed event name,
/// and its structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: String,
    pub event: String,
    pub data: Value,
}

impl RequestFrame {
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// One inbound acknowledgement: the echoed correlation id plus the peer's
/// response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckFrame {
    pub id: String,
    #[serde(flatten)]
    pub envelope: ResponseEnvelope,
}

impl AckFrame {
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// The peer's verdict on one request. A success status implies `data` is
/// present and valid for the operation; anything else is a rejection whose
/// reason lives in `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}
