//! Helpers shared by the socket-level tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::http::header::COOKIE;

use crate::client::ClientId;
use crate::client::line::NAME_PROMPT;
use crate::config::Settings;
use crate::hub::message::TIMESTAMP_FORMAT;
use crate::hub::{HubHandle, Membership};
use crate::identity::{MemoryIdentityStore, SessionStore};
use crate::server::Server;

pub const WAIT: Duration = Duration::from_secs(3);

/// Text read so far from a line-stream peer that has not been consumed yet.
#[derive(Debug, Default)]
pub struct Transcript {
    buf: String,
}

impl Transcript {
    /// Reads until `needle` shows up, then consumes everything up to and
    /// including it. Returns the consumed text.
    pub async fn expect<R: AsyncRead + Unpin>(&mut self, reader: &mut R, needle: &str) -> String {
        let buf = &mut self.buf;
        let filled = timeout(WAIT, async {
            while !buf.contains(needle) {
                let mut chunk = [0u8; 512];
                let n = reader.read(&mut chunk).await.expect("read failed");
                assert!(n > 0, "stream closed before {needle:?}; got {buf:?}");
                buf.push_str(&String::from_utf8_lossy(&chunk[..n]));
            }
        })
        .await;
        assert!(
            filled.is_ok(),
            "timed out waiting for {needle:?}; got {:?}",
            self.buf
        );

        let end = self.buf.find(needle).expect("needle present") + needle.len();
        self.buf.drain(..end).collect()
    }

    /// Reads one full `\n`-terminated line.
    pub async fn line<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> String {
        let line = self.expect(reader, "\n").await;
        line.trim_end_matches('\n').to_string()
    }

    /// Asserts nothing else arrives within `window`.
    pub async fn expect_silence<R: AsyncRead + Unpin>(&mut self, reader: &mut R, window: Duration) {
        let mut chunk = [0u8; 512];
        if let Ok(Ok(n)) = timeout(window, reader.read(&mut chunk)).await {
            assert_eq!(n, 0, "unexpected data: {:?}", String::from_utf8_lossy(&chunk[..n]));
        }
        assert!(self.buf.is_empty(), "unexpected data: {:?}", self.buf);
    }
}

/// Polls the hub until `predicate` holds for its membership.
pub async fn wait_for_membership<F>(hub: &HubHandle, predicate: F) -> Membership
where
    F: Fn(&Membership) -> bool,
{
    timeout(WAIT, async {
        loop {
            let membership = hub.membership().await.expect("hub stopped");
            if predicate(&membership) {
                return membership;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("membership condition never held")
}

pub async fn wait_until_gone(hub: &HubHandle, id: ClientId) {
    wait_for_membership(hub, |m| !m.contains(&id)).await;
}

/// Splits `timestamp<sep>rest`, asserting the timestamp is well formed.
pub fn split_timestamp<'a>(text: &'a str, sep: &str) -> &'a str {
    let (timestamp, rest) = text
        .split_once(sep)
        .unwrap_or_else(|| panic!("no {sep:?} in {text:?}"));
    assert!(
        NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_ok(),
        "malformed timestamp {timestamp:?}"
    );
    rest
}

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A full server on ephemeral ports, stopped through its shutdown future.
pub struct TestServer {
    pub ws_url: String,
    pub line_addr: SocketAddr,
    pub hub: HubHandle,
    pub sessions: Arc<SessionStore>,
    pub identities: Arc<MemoryIdentityStore>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start<F: FnOnce(&mut Settings)>(configure: F) -> Self {
        let mut settings = Settings::default();
        settings.server.ws_port = 0;
        settings.server.line_port = 0;
        configure(&mut settings);

        let identities = Arc::new(MemoryIdentityStore::new());
        identities.insert("carol", "secret");
        let sessions = Arc::new(SessionStore::new());

        let server = Server::bind(settings.clone(), identities.clone(), sessions.clone())
            .await
            .expect("bind failed");
        let ws_url = format!(
            "ws://{}{}",
            server.ws_addr().unwrap(),
            settings.server.ws_path
        );
        let line_addr = server.line_addr().unwrap();
        let hub = server.hub();

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run_until(async move {
            let _ = stopped.await;
        }));

        Self {
            ws_url,
            line_addr,
            hub,
            sessions,
            identities,
            stop: Some(stop),
            task: Some(task),
        }
    }

    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            timeout(WAIT, task)
                .await
                .expect("server did not stop")
                .expect("server task panicked");
        }
    }

    pub async fn ws_connect(&self, session: Option<&str>) -> Result<WsClient, tungstenite::Error> {
        ws_connect(&self.ws_url, session).await
    }

    /// Connects a line client and completes the guest login as `name`.
    pub async fn line_login(&self, name: &str) -> LineClient {
        let mut client = LineClient::connect(self.line_addr).await;
        client.expect(NAME_PROMPT).await;
        client.send(name).await;
        client.expect(&format!("Welcome in {name}.\n")).await;
        client
    }
}

pub async fn ws_connect(url: &str, session: Option<&str>) -> Result<WsClient, tungstenite::Error> {
    let mut request = url.into_client_request()?;
    if let Some(token) = session {
        let cookie = HeaderValue::from_str(&format!("session={token}")).expect("cookie header");
        request.headers_mut().insert(COOKIE, cookie);
    }
    let (ws, _) = connect_async(request).await?;
    Ok(ws)
}

/// Raw TCP peer speaking the line protocol.
pub struct LineClient {
    pub reader: OwnedReadHalf,
    pub writer: OwnedWriteHalf,
    pub transcript: Transcript,
}

impl LineClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (reader, writer) = stream.into_split();
        Self {
            reader,
            writer,
            transcript: Transcript::default(),
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write failed");
    }

    pub async fn expect(&mut self, needle: &str) -> String {
        self.transcript.expect(&mut self.reader, needle).await
    }

    pub async fn line(&mut self) -> String {
        self.transcript.line(&mut self.reader).await
    }

    pub async fn expect_silence(&mut self, window: Duration) {
        self.transcript.expect_silence(&mut self.reader, window).await
    }

    /// Waits for the server to close the connection.
    pub async fn expect_closed(&mut self) {
        let mut chunk = [0u8; 512];
        let read = timeout(WAIT, self.reader.read(&mut chunk))
            .await
            .expect("connection was not closed");
        if let Ok(n) = read {
            assert_eq!(n, 0, "unexpected data: {:?}", String::from_utf8_lossy(&chunk[..n]));
        }
    }
}
