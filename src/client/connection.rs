//! Client representation
//!
//! `ClientHandle` is what the hub keeps for each registered actor: the
//! sending side of the actor's bounded delivery queue plus the close latch
//! shared by the actor's read and write loops.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::hub::message::Message;
use crate::identity::Identity;

/// Per-connection actor address; registries are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Duplex,
    Line,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Duplex => f.write_str("duplex"),
            TransportKind::Line => f.write_str("line"),
        }
    }
}

#[derive(Debug)]
struct CloseState {
    closed: AtomicBool,
    notify: watch::Sender<bool>,
}

/// Idempotent close latch shared by an actor's loops and the hub.
///
/// Only the first `close` wins; every later call is a silent no-op.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    state: Arc<CloseState>,
}

impl CloseSignal {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            state: Arc::new(CloseState {
                closed: AtomicBool::new(false),
                notify,
            }),
        }
    }

    /// Fires the latch. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        if self.state.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.state.notify.send_replace(true);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Resolves once the latch has fired, immediately if it already has.
    pub async fn closed(&self) {
        let mut rx = self.state.notify.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// The hub-side record of one connected actor.
///
/// Not `Clone`: the hub holds the only sender of the delivery queue, so
/// dropping the handle is what closes the queue.
#[derive(Debug)]
pub struct ClientHandle {
    pub id: ClientId,
    pub kind: TransportKind,
    pub identity: Arc<Identity>,
    pub outbox: mpsc::Sender<Arc<Message>>,
    pub close: CloseSignal,
}

impl ClientHandle {
    /// Creates a handle with an empty, open delivery queue of `capacity`
    /// slots and returns the queue's receiving end for the actor's writer.
    pub fn new(
        kind: TransportKind,
        identity: Arc<Identity>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Arc<Message>>) {
        let (outbox, inbox) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ClientId::new(),
            kind,
            identity,
            outbox,
            close: CloseSignal::new(),
        };
        (handle, inbox)
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }
}
