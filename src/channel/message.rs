//! Server → client push messages.
//!
//! Every message is a JSON object `{"type": .., "data": ..}`:
//!
//! ```text
//! {"type":"id","data":"<identity>"}
//! {"type":"result","data":{"request_id":"<job-id>","result":"<string>"}}
//! {"type":"error","data":{"request_id":"<job-id>","reason":"<string>"}}
//! ```

use axum::extract::ws::Utf8Bytes;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PushMessage<'a> {
    /// Handshake notification carrying the channel's own identity.
    Id(Uuid),
    /// A finished job's output.
    Result { request_id: Uuid, result: &'a str },
    /// A job that ended without a result.
    Error { request_id: Uuid, reason: &'a str },
}

impl PushMessage<'_> {
    /// Serialize into an immutable text frame payload.
    pub fn encode(&self) -> Utf8Bytes {
        serde_json::to_string(self)
            .expect("push messages contain only strings and uuids")
            .into()
    }
}
