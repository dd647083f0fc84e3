//! The `error` module defines the error types used within `chathub`.
//!
//! Nothing in here is allowed to take the hub down: callers convert every
//! variant into "drop this one connection" at the edge where it occurs.

use std::io;

use thiserror::Error;
use tungstenite::error::ProtocolError;

/// Errors surfaced by the hub, the client actors and the listeners.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub control loop has stopped and its mailboxes are closed.
    #[error("hub is no longer running")]
    HubClosed,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid users file: {0}")]
    UsersFile(#[from] serde_json::Error),

    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
}

/// Failures of the line-stream login handshake. Each one ends only the
/// connection attempt it happened on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("connection closed during handshake")]
    Aborted,

    #[error("empty name")]
    EmptyName,

    #[error("incorrect password for {0}")]
    IncorrectPassword(String),

    #[error("handshake timed out")]
    TimedOut,
}

/// Whether a websocket error means the peer simply went away.
///
/// Those end a read loop quietly; anything else is logged as abnormal but
/// still only terminates the one actor.
pub fn is_normal_closure(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        tungstenite::Error::Io(e) => matches!(
            e.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}
