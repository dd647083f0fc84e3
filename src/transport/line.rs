use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::client::serve_line_client;
use crate::config::Settings;
use crate::hub::HubHandle;
use crate::identity::IdentityStore;
use crate::utils::error::HubError;

/// Accepts raw TCP connections and runs the line-stream protocol on each.
pub async fn start_line_server(
    listener: TcpListener,
    hub: HubHandle,
    identities: Arc<dyn IdentityStore>,
    settings: Arc<Settings>,
) {
    let handshake_timeout = Duration::from_secs(settings.server.handshake_timeout_secs);
    let queue_capacity = settings.hub.client_queue_capacity;

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept line connection");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let hub = hub.clone();
        let identities = identities.clone();

        tokio::spawn(async move {
            match serve_line_client(stream, hub, identities, queue_capacity, handshake_timeout).await
            {
                Ok(()) => {}
                Err(HubError::Handshake(e)) => info!(%peer, error = %e, "Line handshake failed"),
                Err(e) => warn!(%peer, error = %e, "Line connection failed"),
            }
        });
    }
}
