//! The `transport` module is responsible for accepting network connections
//! and turning them into registered client actors.
//!
//! `websocket` performs the HTTP upgrade and resolves the caller's session;
//! `line` accepts raw TCP connections for the line-stream protocol.

pub mod line;
pub mod websocket;

pub use line::start_line_server;
pub use websocket::start_websocket_server;
