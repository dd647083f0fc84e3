//! Process wiring: binds both listeners, owns the hub, and runs everything
//! until a shutdown future resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Settings;
use crate::hub::{Hub, HubHandle};
use crate::identity::{IdentityStore, SessionStore};
use crate::transport::{start_line_server, start_websocket_server};
use crate::utils::error::HubError;

pub struct Server {
    settings: Arc<Settings>,
    ws_listener: TcpListener,
    line_listener: TcpListener,
    hub: Hub,
    handle: HubHandle,
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<SessionStore>,
}

impl Server {
    /// Binds the WebSocket and line listeners and builds the hub. Port 0
    /// picks a free port; see `ws_addr` / `line_addr`.
    pub async fn bind(
        settings: Settings,
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<SessionStore>,
    ) -> Result<Self, HubError> {
        let host = settings.server.host.as_str();
        let ws_listener = TcpListener::bind((host, settings.server.ws_port)).await?;
        let line_listener = TcpListener::bind((host, settings.server.line_port)).await?;
        let (hub, handle) = Hub::new(&settings.hub);

        Ok(Self {
            settings: Arc::new(settings),
            ws_listener,
            line_listener,
            hub,
            handle,
            identities,
            sessions,
        })
    }

    pub fn ws_addr(&self) -> Result<SocketAddr, HubError> {
        Ok(self.ws_listener.local_addr()?)
    }

    pub fn line_addr(&self) -> Result<SocketAddr, HubError> {
        Ok(self.line_listener.local_addr()?)
    }

    pub fn hub(&self) -> HubHandle {
        self.handle.clone()
    }

    /// Serves both transports until `shutdown` resolves, then shuts the hub
    /// down, which closes every connected client.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Server {
            settings,
            ws_listener,
            line_listener,
            hub,
            handle,
            identities,
            sessions,
        } = self;

        if let (Ok(ws), Ok(line)) = (ws_listener.local_addr(), line_listener.local_addr()) {
            info!(
                "Listening on ws://{}{} and line://{}",
                ws, settings.server.ws_path, line
            );
        }

        let hub_task = tokio::spawn(hub.run());

        tokio::select! {
            _ = start_websocket_server(ws_listener, handle.clone(), sessions, settings.clone()) => {
                error!("WebSocket listener exited unexpectedly.");
            }
            _ = start_line_server(line_listener, handle.clone(), identities, settings) => {
                error!("Line listener exited unexpectedly.");
            }
            _ = shutdown => {
                info!("Shutdown signal received. Exiting gracefully.");
            }
        }

        handle.shutdown().await;
        if let Err(e) = hub_task.await {
            error!(error = %e, "Hub task failed");
        }
    }
}
