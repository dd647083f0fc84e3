//! WebSocket transport
//!
//! Accepts TCP connections, performs the HTTP upgrade and hands each
//! upgraded stream to a duplex client actor. Responsibilities:
//! - Reject upgrades for any path other than the configured one (404)
//! - Resolve the caller's identity from the `session` cookie
//! - Admit callers without a session as guests, or reject them (401) when
//!   guests are disabled
//!
//! A failed upgrade only drops that one connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tracing::{debug, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use uuid::Uuid;

use crate::client::{ClientId, spawn_duplex_client};
use crate::config::Settings;
use crate::hub::HubHandle;
use crate::identity::{Identity, SessionStore};
use crate::utils::error::{HandshakeError, HubError};

pub async fn start_websocket_server(
    listener: TcpListener,
    hub: HubHandle,
    sessions: Arc<SessionStore>,
    settings: Arc<Settings>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept WebSocket connection");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let hub = hub.clone();
        let sessions = sessions.clone();
        let settings = settings.clone();

        tokio::spawn(async move {
            match accept_duplex(stream, peer, hub, &sessions, &settings).await {
                Ok(id) => debug!(client = %id, %peer, "WebSocket client started"),
                Err(HubError::WebSocket(e)) => info!(%peer, error = %e, "WebSocket handshake error"),
                Err(e) => warn!(%peer, error = %e, "Failed to start WebSocket client"),
            }
        });
    }
}

async fn accept_duplex(
    stream: TcpStream,
    peer: SocketAddr,
    hub: HubHandle,
    sessions: &SessionStore,
    settings: &Settings,
) -> Result<ClientId, HubError> {
    let mut resolved = None;

    let ws = accept_hdr_async(stream, |request: &Request, response: Response| {
        if request.uri().path() != settings.server.ws_path {
            return Err(reject(StatusCode::NOT_FOUND, "unknown path"));
        }
        match sessions.resolve_request(request) {
            Some(identity) => resolved = Some(identity),
            None if settings.server.allow_guests => {
                resolved = Some(Arc::new(Identity::guest(guest_name())));
            }
            None => return Err(reject(StatusCode::UNAUTHORIZED, "no valid session")),
        }
        Ok(response)
    })
    .await?;

    let identity = resolved.ok_or(HandshakeError::Aborted)?;
    info!(%peer, name = identity.name(), "WebSocket upgrade accepted");

    spawn_duplex_client(ws, identity, hub, settings.hub.client_queue_capacity).await
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = status;
    response
}

fn guest_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("guest-{}", &id[..8])
}
