//! Line-stream (raw TCP) client actor.
//!
//! After a short textual login, every newline-terminated line the client
//! sends becomes a broadcast. Outbound lines go through the same bounded
//! queue and dedicated writer task as duplex clients.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::client::connection::{ClientHandle, ClientId, CloseSignal, TransportKind};
use crate::hub::{HubHandle, Message};
use crate::identity::{Identity, IdentityStore};
use crate::utils::error::{HandshakeError, HubError};

pub const NAME_PROMPT: &str = "Please identify yourself: ";
pub const PASSWORD_PROMPT: &str = "Please enter your password: ";
pub const INCORRECT_PASSWORD: &str = "\nIncorrect password.\n";
pub const EMPTY_NAME: &str = "\nName must not be empty.\n";
pub const HANDSHAKE_TIMED_OUT: &str = "\nHandshake timed out.\n";

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs one line-stream connection from handshake to disconnect.
///
/// Returns an error only when the handshake fails or the hub has stopped;
/// in both cases the actor was never (or is no longer) registered.
pub async fn serve_line_client<S>(
    stream: S,
    hub: HubHandle,
    identities: Arc<dyn IdentityStore>,
    queue_capacity: usize,
    handshake_timeout: Duration,
) -> Result<(), HubError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    let outcome = timeout(
        handshake_timeout,
        handshake(&mut lines, &mut writer, identities.as_ref()),
    )
    .await;
    let identity = match outcome {
        Ok(Ok(identity)) => identity,
        Ok(Err(e)) => {
            let _ = writer.shutdown().await;
            return Err(e);
        }
        Err(_) => {
            let _ = writer.write_all(HANDSHAKE_TIMED_OUT.as_bytes()).await;
            let _ = writer.shutdown().await;
            return Err(HandshakeError::TimedOut.into());
        }
    };

    let (handle, inbox) = ClientHandle::new(TransportKind::Line, identity.clone(), queue_capacity);
    let id = handle.id;
    let close = handle.close.clone();

    hub.register(handle).await?;
    tokio::spawn(write_loop(id, writer, inbox, close.clone()));

    loop {
        let line = tokio::select! {
            biased;
            _ = close.closed() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                let body = line.trim_end_matches('\r');
                if hub
                    .broadcast(Message::new(identity.clone(), id, body))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(client = %id, error = %e, "Read failed");
                break;
            }
        }
    }

    if hub.unregister(TransportKind::Line, id).await.is_err() {
        debug!(client = %id, "Hub already stopped");
    }
    close.close();
    info!(client = %id, name = identity.name(), "Disconnected");
    Ok(())
}

/// Prompts for a name and, for known identities, a password.
///
/// Unknown names are admitted as guests.
pub async fn handshake<R, W>(
    lines: &mut Lines<R>,
    writer: &mut W,
    identities: &dyn IdentityStore,
) -> Result<Arc<Identity>, HubError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    prompt(writer, NAME_PROMPT).await?;
    let name = read_line(lines).await?.trim().to_string();
    if name.is_empty() {
        prompt(writer, EMPTY_NAME).await?;
        return Err(HandshakeError::EmptyName.into());
    }

    match identities.lookup(&name) {
        Some(identity) => {
            prompt(writer, PASSWORD_PROMPT).await?;
            let secret = read_line(lines).await?;
            if !identities.verify(&identity, &secret) {
                prompt(writer, INCORRECT_PASSWORD).await?;
                return Err(HandshakeError::IncorrectPassword(name).into());
            }
            Ok(identity)
        }
        None => {
            prompt(writer, &format!("\nWelcome in {name}.\n")).await?;
            Ok(Arc::new(Identity::guest(name)))
        }
    }
}

async fn prompt<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<(), HubError> {
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_line<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> Result<String, HubError> {
    match lines.next_line().await? {
        Some(line) => Ok(line.trim_end_matches('\r').to_string()),
        None => Err(HandshakeError::Aborted.into()),
    }
}

async fn write_loop<W>(
    id: ClientId,
    mut writer: W,
    mut inbox: mpsc::Receiver<Arc<Message>>,
    close: CloseSignal,
) where
    W: AsyncWrite + Unpin,
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

        let mut line = message.to_line();
        line.push('\n');
        let written = tokio::select! {
            biased;
            _ = close.closed() => break,
            written = writer.write_all(line.as_bytes()) => written,
        };
        if let Err(e) = written {
            debug!(client = %id, error = %e, "Peer gone while writing");
            break;
        }
    }

    close.close();
    let _ = timeout(SHUTDOWN_TIMEOUT, writer.shutdown()).await;
    debug!(client = %id, "Send loop closed");
}
