//! hub
//!
//! The hub is the single owner of client membership and the only place a
//! message is fanned out. It runs as one task (`Hub::run`); actors and
//! listeners reach it through a cloneable `HubHandle`.
//!
//! Public types:
//! - `Hub`: the control loop and its two registries.
//! - `HubHandle`: `register`, `unregister`, `broadcast`, plus `membership`
//!   and `shutdown`.
//! - `Message`: an immutable, timestamped chat message.

pub mod engine;
pub mod handle;
pub mod message;
pub mod registry;

pub use engine::Hub;
pub use handle::{HubHandle, Membership};
pub use message::Message;
