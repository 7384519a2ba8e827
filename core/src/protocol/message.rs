//! Message envelopes exchanged with the sequencing authority
//!
//! Revisions count committed operations. A `delta` carries the revision
//! its operation produced, so it applies on top of `revision - 1`.

use super::wire::WireOp;
use crate::error::Result;
use crate::ot::UserId;
use crate::presence::PresenceUpdate;
use serde::{Deserialize, Serialize};

/// Server → client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full document at `revision`, as insert-only ops
    #[serde(rename_all = "camelCase")]
    Document { revision: u64, ops: Vec<WireOp> },
    /// Another client's committed operation
    #[serde(rename_all = "camelCase")]
    Delta {
        revision: u64,
        #[serde(default)]
        user_id: UserId,
        ops: Vec<WireOp>,
    },
    /// Our outstanding operation was committed as `revision`
    Ack { revision: u64 },
    /// Our outstanding operation was rejected; the session must resync
    DeltaDropped { revision: u64 },
    Presence(PresenceUpdate),
}

/// Client → server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Local operation based on `revision`
    Delta { revision: u64, ops: Vec<WireOp> },
    /// Ask for the full document at `revision` (or the latest if newer)
    RevisionRequest { revision: u64 },
    Presence(PresenceUpdate),
}

impl ServerMessage {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ClientMessage {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
