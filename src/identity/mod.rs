//! The `identity` module holds the collaborators that tell the hub who is on
//! the other end of a connection.
//!
//! - `store`: the `IdentityStore` contract (`lookup` + `verify`) and an
//!   in-memory implementation that can be seeded from a users file.
//! - `session`: resolves the `session` cookie of a WebSocket upgrade request
//!   to an identity that was authenticated elsewhere.

pub mod session;
pub mod store;

pub use session::SessionStore;
pub use store::{Credential, Identity, IdentityStore, MemoryIdentityStore};
