use std::borrow::Cow;
use std::sync::Arc;

use chrono::Local;

use crate::client::ClientId;
use crate::identity::Identity;

/// Wire format of the server-assigned timestamp, e.g. `2024-05-01 13:37:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One chat message as it travels through the hub.
///
/// Created by a client actor's read loop the moment a frame or line arrives,
/// then fanned out as an `Arc<Message>` and never mutated.
///
/// # Fields
///
/// - `timestamp` - local send time, formatted with [`TIMESTAMP_FORMAT`].
/// - `sender` - identity of the actor that read the message.
/// - `origin` - connection it was read from, used for self-echo decisions.
/// - `body` - raw message bytes as received.
#[derive(Debug, Clone)]
pub struct Message {
    pub timestamp: String,
    pub sender: Arc<Identity>,
    pub origin: ClientId,
    pub body: Vec<u8>,
}

impl Message {
    /// Stamps `body` with the current local time.
    pub fn new(sender: Arc<Identity>, origin: ClientId, body: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            sender,
            origin,
            body: body.into(),
        }
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Duplex wire form: `timestamp|body`.
    pub fn to_frame(&self) -> String {
        format!("{}|{}", self.timestamp, self.body_text())
    }

    /// Line-stream wire form, without the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{} - User {} says: {}",
            self.timestamp,
            self.sender.name(),
            self.body_text()
        )
    }
}
