//! Duplex (WebSocket) client actor.
//!
//! Each connection runs two tasks sharing one socket: a read loop that turns
//! inbound frames into hub broadcasts, and a write loop that drains the
//! actor's delivery queue onto the socket as `timestamp|body` text frames.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;
use tungstenite::protocol::frame::coding::CloseCode;

use crate::client::connection::{ClientHandle, ClientId, CloseSignal, TransportKind};
use crate::hub::{HubHandle, Message};
use crate::identity::Identity;
use crate::utils::error::{HubError, is_normal_closure};

/// How long a closing handshake may take once the write loop has stopped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Registers a freshly upgraded connection with the hub, then starts its
/// write loop and read loop as separate tasks.
pub async fn spawn_duplex_client<S>(
    ws: WebSocketStream<S>,
    identity: Arc<Identity>,
    hub: HubHandle,
    queue_capacity: usize,
) -> Result<ClientId, HubError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (handle, inbox) = ClientHandle::new(TransportKind::Duplex, identity.clone(), queue_capacity);
    let id = handle.id;
    let close = handle.close.clone();

    hub.register(handle).await?;

    let (sink, stream) = ws.split();
    tokio::spawn(write_loop(id, sink, inbox, close.clone()));
    tokio::spawn(read_loop(id, identity, stream, hub, close));
    Ok(id)
}

async fn write_loop<S>(
    id: ClientId,
    mut sink: SplitSink<WebSocketStream<S>, WsMessage>,
    mut inbox: mpsc::Receiver<Arc<Message>>,
    close: CloseSignal,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let message = tokio::select! {
            biased;
            _ = close.closed() => break,
            next = inbox.recv() => match next {
                Some(message) => message,
                None => break,
            },
        };

        // A peer that stopped reading parks the send; closing must still win.
        let sent = tokio::select! {
            biased;
            _ = close.closed() => break,
            sent = sink.send(WsMessage::text(message.to_frame())) => sent,
        };
        if let Err(e) = sent {
            if is_normal_closure(&e) {
                debug!(client = %id, "Peer gone while writing");
            } else {
                warn!(client = %id, error = %e, "Failed to send message");
            }
            break;
        }
    }

    close.close();
    // Starts the closing handshake; gives up on a peer that is not reading.
    if timeout(CLOSE_TIMEOUT, sink.close()).await.is_err() {
        debug!(client = %id, "Closing handshake timed out");
    }
    debug!(client = %id, "Send loop closed");
}

async fn read_loop<S>(
    id: ClientId,
    identity: Arc<Identity>,
    mut stream: SplitStream<WebSocketStream<S>>,
    hub: HubHandle,
    close: CloseSignal,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = close.closed() => break,
            frame = stream.next() => frame,
        };

        let body = match frame {
            Some(Ok(WsMessage::Text(text))) => text.as_bytes().to_vec(),
            Some(Ok(WsMessage::Binary(data))) => data.to_vec(),
            Some(Ok(WsMessage::Close(frame))) => {
                match frame.as_ref().map(|f| f.code) {
                    None | Some(CloseCode::Normal) | Some(CloseCode::Away) => {
                        debug!(client = %id, "Close frame received");
                    }
                    Some(code) => info!(client = %id, %code, "Closed with unusual code"),
                }
                break;
            }
            // Ping/pong are answered by the protocol layer.
            Some(Ok(_)) => continue,
            Some(Err(e)) if is_normal_closure(&e) => {
                debug!(client = %id, error = %e, "Connection closed");
                break;
            }
            Some(Err(e)) => {
                warn!(client = %id, error = %e, "Read failed");
                break;
            }
            None => break,
        };

        if hub
            .broadcast(Message::new(identity.clone(), id, body))
            .await
            .is_err()
        {
            break;
        }
    }

    if hub.unregister(TransportKind::Duplex, id).await.is_err() {
        debug!(client = %id, "Hub already stopped");
    }
    close.close();
    info!(client = %id, name = identity.name(), "Disconnected");
}
