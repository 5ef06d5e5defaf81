use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::LiveMessage;
use super::participant::{LiveParticipant, StatusUpdate};

/// `UPDATE_STATUS` payload: which record to patch and the fields to patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    pub id: String,
    pub updates: StatusUpdate,
}

/// Protocol envelope broadcast over the signal bus. The wire shape is
/// `{ "type": <kind>, "payload": <kind-specific object> }`, stable across
/// implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Signal {
    /// Arrival announcement carrying the full initial participant record.
    #[serde(rename = "JOIN")]
    Join(LiveParticipant),
    /// Explicit backfill request carrying the requester id.
    #[serde(rename = "SYNC_REQ")]
    SyncReq(String),
    /// Reply to a JOIN or SYNC_REQ with the sender's own current record.
    #[serde(rename = "SYNC_RES")]
    SyncRes(LiveParticipant),
    #[serde(rename = "UPDATE_STATUS")]
    UpdateStatus(StatusPatch),
    #[serde(rename = "CHAT")]
    Chat(LiveMessage),
    /// Departing participant id.
    #[serde(rename = "LEAVE")]
    Leave(String),
    /// Host-only termination broadcast. Empty payload.
    #[serde(rename = "END_SESSION")]
    EndSession {},
}

impl Signal {
    /// Decode a wire frame. Frames that do not parse (including envelopes
    /// with a message type this version does not know) are dropped, not
    /// surfaced as errors; the protocol favors availability over strict
    /// validation.
    pub fn decode(frame: &str) -> Option<Signal> {
        match serde_json::from_str::<Signal>(frame) {
            Ok(signal) => Some(signal),
            Err(e) => {
                debug!("Dropping undecodable signal frame: {}", e);
                None
            }
        }
    }

    pub fn encode(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Failed to encode signal frame: {}", e);
                None
            }
        }
    }
}
