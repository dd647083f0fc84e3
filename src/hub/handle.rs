use tokio::sync::{mpsc, oneshot};

use crate::client::{ClientHandle, ClientId, TransportKind};
use crate::hub::message::Message;
use crate::utils::error::HubError;

/// Registration traffic for line-stream actors, which share one mailbox.
#[derive(Debug)]
pub enum LineEvent {
    Register(ClientHandle),
    Unregister(ClientId),
}

#[derive(Debug)]
pub enum Control {
    Shutdown,
    Membership(oneshot::Sender<Membership>),
}

/// Point-in-time copy of both registries, as seen by the hub loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    pub duplex: Vec<ClientId>,
    pub line: Vec<ClientId>,
}

impl Membership {
    pub fn contains(&self, id: &ClientId) -> bool {
        self.duplex.contains(id) || self.line.contains(id)
    }

    pub fn total(&self) -> usize {
        self.duplex.len() + self.line.len()
    }
}

/// The hub's public surface: mailboxes into the control loop.
///
/// Cheap to clone; every actor and listener holds one. Sends wait for
/// mailbox capacity, which is bounded by one loop iteration of the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    pub(crate) duplex_register: mpsc::Sender<ClientHandle>,
    pub(crate) duplex_unregister: mpsc::Sender<ClientId>,
    pub(crate) line: mpsc::Sender<LineEvent>,
    pub(crate) broadcast: mpsc::Sender<Message>,
    pub(crate) control: mpsc::Sender<Control>,
}

impl HubHandle {
    /// Hands an actor to the registry matching its transport kind.
    pub async fn register(&self, handle: ClientHandle) -> Result<(), HubError> {
        match handle.kind {
            TransportKind::Duplex => self
                .duplex_register
                .send(handle)
                .await
                .map_err(|_| HubError::HubClosed),
            TransportKind::Line => self
                .line
                .send(LineEvent::Register(handle))
                .await
                .map_err(|_| HubError::HubClosed),
        }
    }

    pub async fn unregister(&self, kind: TransportKind, id: ClientId) -> Result<(), HubError> {
        match kind {
            TransportKind::Duplex => self
                .duplex_unregister
                .send(id)
                .await
                .map_err(|_| HubError::HubClosed),
            TransportKind::Line => self
                .line
                .send(LineEvent::Unregister(id))
                .await
                .map_err(|_| HubError::HubClosed),
        }
    }

    pub async fn broadcast(&self, message: Message) -> Result<(), HubError> {
        self.broadcast
            .send(message)
            .await
            .map_err(|_| HubError::HubClosed)
    }

    pub async fn membership(&self) -> Result<Membership, HubError> {
        let (reply, rx) = oneshot::channel();
        self.control
            .send(Control::Membership(reply))
            .await
            .map_err(|_| HubError::HubClosed)?;
        rx.await.map_err(|_| HubError::HubClosed)
    }

    /// Asks the hub to close every actor and stop. Harmless if it already has.
    pub async fn shutdown(&self) {
        let _ = self.control.send(Control::Shutdown).await;
    }
}
