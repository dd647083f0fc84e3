//! Hub engine
//!
//! This module contains the hub control loop responsible for:
//! - owning the duplex and line registries
//! - registering and unregistering client actors
//! - fanning every broadcast out to the registered actors
//! - disconnecting actors whose delivery queue is full
//!
//! Concurrency and usage notes:
//! - `Hub::run` is the only code that ever touches a registry. Everything
//!   else talks to it through a `HubHandle`, so no lock guards membership.
//! - Events are handled one at a time to completion. Fan-out only uses
//!   `try_send`, so a broadcast can never wait on a client and never
//!   interleaves with the next registration.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::client::{ClientHandle, ClientId, TransportKind};
use crate::config::{EchoPolicy, HubSettings};
use crate::hub::handle::{Control, HubHandle, LineEvent, Membership};
use crate::hub::message::Message;
use crate::hub::registry::Registry;

impl EchoPolicy {
    /// Whether a member of `kind` receives the messages it sent itself.
    pub fn delivers_to_sender(self, kind: TransportKind) -> bool {
        match self {
            EchoPolicy::Native => kind == TransportKind::Duplex,
            EchoPolicy::Never => false,
            EchoPolicy::Always => true,
        }
    }
}

/// Duplex members are matched by connection, line members by identity
/// name, so a line user never receives their own words on any session.
fn is_own_message(member: &ClientHandle, message: &Message) -> bool {
    match member.kind {
        TransportKind::Duplex => member.id == message.origin,
        TransportKind::Line => member.name() == message.sender.name(),
    }
}

#[derive(Debug)]
pub struct Hub {
    duplex: Registry,
    line: Registry,
    echo: EchoPolicy,
    duplex_register_rx: mpsc::Receiver<ClientHandle>,
    duplex_unregister_rx: mpsc::Receiver<ClientId>,
    line_rx: mpsc::Receiver<LineEvent>,
    broadcast_rx: mpsc::Receiver<Message>,
    control_rx: mpsc::Receiver<Control>,
}

impl Hub {
    /// Builds a hub with empty registries and the handle used to reach it.
    pub fn new(settings: &HubSettings) -> (Self, HubHandle) {
        let capacity = settings.channel_capacity.max(1);
        let (duplex_register, duplex_register_rx) = mpsc::channel(capacity);
        let (duplex_unregister, duplex_unregister_rx) = mpsc::channel(capacity);
        let (line, line_rx) = mpsc::channel(capacity);
        let (broadcast, broadcast_rx) = mpsc::channel(capacity);
        let (control, control_rx) = mpsc::channel(capacity);

        let hub = Self {
            duplex: Registry::new(),
            line: Registry::new(),
            echo: settings.echo_policy,
            duplex_register_rx,
            duplex_unregister_rx,
            line_rx,
            broadcast_rx,
            control_rx,
        };
        let handle = HubHandle {
            duplex_register,
            duplex_unregister,
            line,
            broadcast,
            control,
        };
        (hub, handle)
    }

    /// Runs the control loop until shutdown is requested or every handle
    /// has been dropped, then closes all remaining actors.
    pub async fn run(mut self) {
        info!(echo = ?self.echo, "Hub started");

        loop {
            tokio::select! {
                Some(handle) = self.duplex_register_rx.recv() => self.register(handle),
                Some(id) = self.duplex_unregister_rx.recv() => {
                    self.unregister(TransportKind::Duplex, &id);
                }
                Some(event) = self.line_rx.recv() => match event {
                    LineEvent::Register(handle) => self.register(handle),
                    LineEvent::Unregister(id) => {
                        self.unregister(TransportKind::Line, &id);
                    }
                },
                Some(message) = self.broadcast_rx.recv() => {
                    self.broadcast(message);
                }
                Some(control) = self.control_rx.recv() => match control {
                    Control::Shutdown => break,
                    Control::Membership(reply) => {
                        let _ = reply.send(self.membership());
                    }
                },
                else => break,
            }
        }

        self.shutdown();
    }

    fn registry_mut(&mut self, kind: TransportKind) -> &mut Registry {
        match kind {
            TransportKind::Duplex => &mut self.duplex,
            TransportKind::Line => &mut self.line,
        }
    }

    pub(crate) fn register(&mut self, handle: ClientHandle) {
        let (id, kind) = (handle.id, handle.kind);
        let name = handle.name().to_string();
        if self.registry_mut(kind).insert(handle) {
            info!(client = %id, %kind, %name, "User has logged in");
        } else {
            debug!(client = %id, %kind, "Ignoring duplicate registration");
        }
    }

    /// Removes the member and releases it. Returns `false` if it was not
    /// registered, which happens when a client's own cleanup races a
    /// hub-initiated disconnect.
    pub(crate) fn unregister(&mut self, kind: TransportKind, id: &ClientId) -> bool {
        match self.registry_mut(kind).remove(id) {
            Some(handle) => {
                handle.close.close();
                info!(client = %id, %kind, name = handle.name(), "User has logged out");
                true
            }
            None => false,
        }
    }

    /// Delivers `message` to every registered member the echo policy allows.
    /// Returns how many members it was queued for.
    pub(crate) fn broadcast(&mut self, message: Message) -> usize {
        let message = Arc::new(message);
        let mut delivered = 0;
        let mut dropped = Vec::new();

        for registry in [&self.duplex, &self.line] {
            for member in registry.iter() {
                if is_own_message(member, &message) && !self.echo.delivers_to_sender(member.kind) {
                    continue;
                }
                match member.outbox.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(client = %member.id, name = member.name(), "Delivery queue full, disconnecting slow consumer");
                        dropped.push((member.kind, member.id));
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(client = %member.id, "Delivery queue closed");
                        dropped.push((member.kind, member.id));
                    }
                }
            }
        }

        for (kind, id) in dropped {
            self.unregister(kind, &id);
        }
        delivered
    }

    pub(crate) fn membership(&self) -> Membership {
        Membership {
            duplex: self.duplex.ids(),
            line: self.line.ids(),
        }
    }

    fn shutdown(&mut self) {
        let members: Vec<ClientHandle> = self
            .duplex
            .drain()
            .into_iter()
            .chain(self.line.drain())
            .collect();
        for handle in &members {
            handle.close.close();
        }
        info!(closed = members.len(), "Hub stopped");
    }
}
