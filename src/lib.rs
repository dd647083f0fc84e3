//! # chathub
//!
//! `chathub` is a real-time chat fan-out hub built with Rust. It serves two
//! client populations at once over one shared message bus: WebSocket
//! clients (full-duplex) and raw TCP clients speaking newline-delimited text.
//!
//! ## Core Modules
//!
//! - `hub`: The single owner of client membership; registers, unregisters
//!   and fans messages out, disconnecting consumers that fall behind.
//! - `client`: The duplex and line-stream client actors.
//! - `transport`: The WebSocket and TCP listeners that bootstrap actors.
//! - `identity`: Identity lookup/verification and session resolution.
//! - `server`: Wires listeners and hub together with explicit shutdown.
//! - `config`: Handles loading and managing server configuration.
//! - `utils`: Error types and logging setup.

pub mod client;
pub mod config;
pub mod hub;
pub mod identity;
pub mod server;
pub mod transport;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
