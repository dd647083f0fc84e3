//! The `client` module defines the client actors of the hub.
//!
//! - `connection`: `ClientId`, `TransportKind`, the idempotent `CloseSignal`
//!   and the `ClientHandle` the hub keeps per registered actor.
//! - `duplex`: WebSocket actor with independent read and write loops.
//! - `line`: raw TCP actor with a login handshake and a line-based read loop.

pub mod connection;
pub mod duplex;
pub mod line;

pub use connection::{ClientHandle, ClientId, CloseSignal, TransportKind};
pub use duplex::spawn_duplex_client;
pub use line::serve_line_client;
